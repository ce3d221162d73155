pub mod panel;

pub use panel::{MetricsPanel, PanelField};

use serde::Serialize;

/// Colour family a field is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Negative,
    Warning,
    Neutral,
}

impl Tone {
    pub fn hex(self) -> &'static str {
        match self {
            Self::Positive => "#00ff88",
            Self::Negative => "#ff6666",
            Self::Warning => "#ffcc00",
            Self::Neutral => "#CCCCCC",
        }
    }

    /// Sign-based tone for signed values such as wear.
    pub fn of_sign(value: f64) -> Self {
        if !value.is_finite() || value == 0.0 {
            Self::Neutral
        } else if value > 0.0 {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}
