//! Named, weighted reward terms.
//!
//! A [`RewardTable`] is the single source of truth for an environment's reward:
//! each step the environment writes one value per term with
//! [`RewardTable::update`], and both the scalar reward ([`RewardTable::total`])
//! and the on-screen bar chart ([`RewardTable::normalized`]) read those same
//! values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// RewardTerm
// ---------------------------------------------------------------------------

/// One reward component with its display range and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTerm {
    pub label: String,
    /// Lower end of the display range.
    pub min: f64,
    /// Upper end of the display range.
    pub max: f64,
    pub weight: f64,
    /// Most recent unweighted value.
    pub value: f64,
}

impl RewardTerm {
    #[must_use]
    pub fn new(label: impl Into<String>, min: f64, max: f64, weight: f64) -> Self {
        Self {
            label: label.into(),
            min,
            max,
            weight,
            value: 0.0,
        }
    }

    /// Weighted contribution to the total.
    #[must_use]
    pub fn weighted(&self) -> f64 {
        self.weight * self.value
    }

    /// Value mapped into `[0, 1]` over the display range.
    #[must_use]
    pub fn normalized(&self) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !self.value.is_finite() {
            return 0.0;
        }
        ((self.value - self.min) / span).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// RewardTable
// ---------------------------------------------------------------------------

/// Ordered list of reward terms reduced as `Σ weight · value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    terms: Vec<RewardTerm>,
}

impl RewardTable {
    /// Create an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Append a term. Returns `self` for chaining.
    #[must_use]
    pub fn with_term(mut self, label: impl Into<String>, min: f64, max: f64, weight: f64) -> Self {
        self.terms.push(RewardTerm::new(label, min, max, weight));
        self
    }

    /// Append a term in place.
    pub fn push(&mut self, term: RewardTerm) {
        self.terms.push(term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[RewardTerm] {
        &self.terms
    }

    /// Store this step's values, one per term in table order.
    pub fn update(&mut self, values: &[f64]) -> Result<(), ValidationError> {
        if values.len() != self.terms.len() {
            return Err(ValidationError::RewardTermMismatch {
                expected: self.terms.len(),
                got: values.len(),
            });
        }
        for (term, value) in self.terms.iter_mut().zip(values) {
            term.value = *value;
        }
        Ok(())
    }

    /// Zero every stored value.
    pub fn clear_values(&mut self) {
        for term in &mut self.terms {
            term.value = 0.0;
        }
    }

    /// The scalar reward.
    pub fn total(&self) -> f64 {
        self.terms.iter().map(RewardTerm::weighted).sum()
    }

    /// `(label, weighted_value)` pairs in table order.
    pub fn breakdown(&self) -> Vec<(&str, f64)> {
        self.terms
            .iter()
            .map(|t| (t.label.as_str(), t.weighted()))
            .collect()
    }

    /// Unweighted values keyed by label, narrowed for step info.
    #[allow(clippy::cast_possible_truncation)]
    pub fn value_map(&self) -> BTreeMap<String, f32> {
        self.terms
            .iter()
            .map(|t| (t.label.clone(), t.value as f32))
            .collect()
    }

    /// `(label, fraction)` pairs for a bar chart.
    pub fn normalized(&self) -> Vec<(&str, f64)> {
        self.terms
            .iter()
            .map(|t| (t.label.as_str(), t.normalized()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
