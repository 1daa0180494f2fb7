use std::time::Duration;

/// Default length of a quiz attempt.
pub const DEFAULT_QUIZ_DURATION: Duration = Duration::from_secs(30 * 60);

/// Settings shared by every session created for a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    duration: Duration,
}

impl QuizConfig {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Full timer value for a fresh session.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Full timer value in milliseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUIZ_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_duration_is_thirty_minutes() {
        assert_eq!(QuizConfig::default().duration_ms(), 1_800_000);
    }
}
