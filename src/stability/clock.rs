/// Tracks how long the current instrument has been continuously stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StableClock {
    started_at_ms: Option<u64>,
}

impl StableClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one stability decision; returns the stable duration, or `None` once unstable.
    pub fn observe(&mut self, is_stable: bool, now_ms: u64) -> Option<u64> {
        if !is_stable {
            self.started_at_ms = None;
            return None;
        }
        let start = *self.started_at_ms.get_or_insert(now_ms);
        Some(now_ms.saturating_sub(start))
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.started_at_ms.map(|start| now_ms.saturating_sub(start))
    }

    pub fn reset(&mut self) {
        self.started_at_ms = None;
    }
}

/// `H:MM:SS` from one hour on, `MM:SS` below.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let elapsed = elapsed_ms / 1_000;
    let hours = elapsed / 3_600;
    let minutes = (elapsed % 3_600) / 60;
    let seconds = elapsed % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
