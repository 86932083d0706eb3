//! Backend-agnostic debug draw list.
//!
//! Environments describe their diagnostic overlay as a list of
//! [`DrawCommand`]s. A viewer (or the CLI's JSON dump) consumes the list; the
//! environment never draws anything itself. World-space primitives use metres,
//! overlay primitives use normalized screen coordinates in `[0, 1]` with the
//! origin at the top-left corner.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);
    pub const GREY: Self = Self::rgb(0.5, 0.5, 0.5);

    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

// ---------------------------------------------------------------------------
// DrawCommand
// ---------------------------------------------------------------------------

/// A single bar of a bar chart, with its value normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub fraction: f64,
    pub color: Color,
}

/// One diagnostic primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Independent world-space segments.
    Lines {
        segments: Vec<[[f64; 3]; 2]>,
        color: Color,
    },
    /// Connected world-space polyline.
    LineStrip { points: Vec<[f64; 3]>, color: Color },
    /// Sphere, solid or wireframe.
    Sphere {
        center: [f64; 3],
        radius: f64,
        color: Color,
        solid: bool,
    },
    /// Closed world-space polygon outline.
    Polygon { points: Vec<[f64; 3]>, color: Color },
    /// Vertical bar chart in the overlay.
    Bars {
        origin: [f64; 2],
        size: [f64; 2],
        bars: Vec<Bar>,
    },
    /// Horizontal progress bar in the overlay.
    ProgressBar {
        origin: [f64; 2],
        size: [f64; 2],
        fraction: f64,
        color: Color,
    },
    /// Overlay text line.
    Text {
        position: [f64; 2],
        text: String,
        color: Color,
    },
    /// Joint positions relative to their limits, one bar per dof.
    DofBars {
        origin: [f64; 2],
        size: [f64; 2],
        fractions: Vec<f64>,
    },
}

impl DrawCommand {
    /// Short name of the primitive.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Lines { .. } => "lines",
            Self::LineStrip { .. } => "line_strip",
            Self::Sphere { .. } => "sphere",
            Self::Polygon { .. } => "polygon",
            Self::Bars { .. } => "bars",
            Self::ProgressBar { .. } => "progress_bar",
            Self::Text { .. } => "text",
            Self::DofBars { .. } => "dof_bars",
        }
    }
}

// ---------------------------------------------------------------------------
// CameraSetup
// ---------------------------------------------------------------------------

/// Initial viewer placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSetup {
    /// Camera translation applied to the scene.
    pub translation: [f64; 3],
    /// Orbit angle around the vertical axis, in radians.
    pub theta: f64,
    /// Index of the skeleton the camera follows, if any.
    pub track_skeleton: Option<usize>,
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0, -3.5],
            theta: 0.0,
            track_skeleton: None,
        }
    }
}
