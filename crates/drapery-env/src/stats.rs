//! Episode statistics across rollouts.

use std::collections::BTreeMap;

use drapery_core::terminations::TerminationCause;

use crate::episode::Episode;

/// Cumulative statistics recorded at the end of each episode.
#[derive(Clone, Debug, Default)]
pub struct EpisodeStats {
    pub episodes_completed: u32,
    pub total_steps: u64,
    /// Steps per completed episode.
    pub step_history: Vec<u32>,
    /// Cumulative reward per completed episode.
    pub reward_history: Vec<f64>,
    /// How many episodes ended for each cause.
    pub causes: BTreeMap<TerminationCause, u32>,
}

impl EpisodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished episode. Episodes still running are ignored.
    pub fn record(&mut self, episode: &Episode, cause: Option<TerminationCause>) {
        if !episode.is_done() {
            return;
        }
        self.episodes_completed += 1;
        self.total_steps += u64::from(episode.step_count);
        self.step_history.push(episode.step_count);
        self.reward_history.push(episode.total_reward);
        if let Some(cause) = cause {
            *self.causes.entry(cause).or_default() += 1;
        }
    }

    /// Average episode length across completed episodes.
    pub fn mean_episode_length(&self) -> Option<f64> {
        if self.step_history.is_empty() {
            return None;
        }
        let sum: f64 = self.step_history.iter().map(|&s| f64::from(s)).sum();
        #[allow(clippy::cast_precision_loss)]
        Some(sum / self.step_history.len() as f64)
    }

    /// Average cumulative reward across completed episodes.
    pub fn mean_episode_reward(&self) -> Option<f64> {
        if self.reward_history.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.reward_history.iter().sum::<f64>() / self.reward_history.len() as f64)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
