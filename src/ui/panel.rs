use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::Tone;
use crate::engine::EngineSnapshot;
use crate::i18n::{Label, Language};
use crate::model::reading::Reading;
use crate::stability::{format_elapsed, Direction};

const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelField {
    pub label: &'static str,
    pub text: String,
    pub tone: Tone,
}

impl PanelField {
    fn new(label: &'static str, text: impl Into<String>, tone: Tone) -> Self {
        Self {
            label,
            text: text.into(),
            tone,
        }
    }
}

/// Named output fields, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsPanel {
    pub multiplier_countdown: PanelField,
    pub stability: PanelField,
    pub volatility: PanelField,
    pub total_volume: PanelField,
    pub volume_integral: PanelField,
    pub wear: PanelField,
    pub recent_stable: PanelField,
}

impl MetricsPanel {
    pub fn render(snapshot: &EngineSnapshot, lang: Language) -> Self {
        Self {
            multiplier_countdown: countdown_field(snapshot, lang),
            stability: stability_field(snapshot, lang),
            volatility: volatility_field(snapshot, lang),
            total_volume: total_volume_field(snapshot, lang),
            volume_integral: PanelField::new(
                lang.text(Label::VolumeIntegral),
                snapshot.volume_integral.to_string(),
                Tone::Warning,
            ),
            wear: wear_field(snapshot, lang),
            recent_stable: recent_stable_field(snapshot, lang),
        }
    }

    pub fn fields(&self) -> [&PanelField; 7] {
        [
            &self.multiplier_countdown,
            &self.stability,
            &self.volatility,
            &self.total_volume,
            &self.volume_integral,
            &self.wear,
            &self.recent_stable,
        ]
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        self.fields()
            .iter()
            .map(|f| format!("{}: {}", f.label, f.text))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize panel")?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn countdown_field(snapshot: &EngineSnapshot, lang: Language) -> PanelField {
    let label = lang.text(Label::Multiplier4x);
    match &snapshot.countdown {
        Some(c) => PanelField::new(label, c.text(), c.tone),
        None => PanelField::new(label, PLACEHOLDER, Tone::Neutral),
    }
}

fn stability_field(snapshot: &EngineSnapshot, lang: Language) -> PanelField {
    let label = lang.text(Label::Stability);
    let reading = &snapshot.stability;
    if reading.is_indeterminate() {
        return PanelField::new(label, "", Tone::Neutral);
    }
    if reading.is_stable {
        let elapsed = format_elapsed(snapshot.stable_for_ms.unwrap_or(0));
        PanelField::new(
            label,
            format!("{} {}", lang.text(Label::Stable), elapsed),
            Tone::Positive,
        )
    } else {
        PanelField::new(label, lang.text(Label::Volatile), Tone::Warning)
    }
}

fn volatility_field(snapshot: &EngineSnapshot, lang: Language) -> PanelField {
    let label = lang.text(Label::Volatility);
    let reading = &snapshot.stability;
    if reading.is_indeterminate() {
        return PanelField::new(label, "", Tone::Neutral);
    }
    let direction = reading.direction();
    let text = format!("{:.4}% {}", reading.range_pct, direction.arrow())
        .trim_end()
        .to_string();
    let tone = match direction {
        Direction::Up => Tone::Positive,
        Direction::Down => Tone::Negative,
        Direction::Flat if reading.is_stable => Tone::Positive,
        Direction::Flat => Tone::Warning,
    };
    PanelField::new(label, text, tone)
}

fn total_volume_field(snapshot: &EngineSnapshot, lang: Language) -> PanelField {
    let label = lang.text(Label::TotalVolume);
    let total = snapshot.total_volume;
    if total > 0.0 {
        PanelField::new(label, format!("{:.2}", total), Tone::Warning)
    } else {
        PanelField::new(label, PLACEHOLDER, Tone::Neutral)
    }
}

fn wear_field(snapshot: &EngineSnapshot, lang: Language) -> PanelField {
    let label = lang.text(Label::Wear);
    let wear = snapshot.wear;
    if !wear.is_finite() {
        return PanelField::new(label, PLACEHOLDER, Tone::Neutral);
    }
    let text = match snapshot.wear_rate {
        Some(rate) => format!("{:.2} / {:.2}", wear, rate),
        None => format!("{:.2}", wear),
    };
    PanelField::new(label, text, Tone::of_sign(wear))
}

fn recent_stable_field(snapshot: &EngineSnapshot, lang: Language) -> PanelField {
    let label = lang.text(Label::RecentStable);
    match &snapshot.recommended {
        Reading::Value(c) => PanelField::new(label, c.token.symbol.clone(), Tone::Positive),
        _ => PanelField::new(label, lang.text(Label::None), Tone::Neutral),
    }
}
