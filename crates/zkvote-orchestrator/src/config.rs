//! Orchestrator tuning knobs.

use std::time::Duration;

/// Timeouts governing a vote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// A non-terminal attempt older than this no longer blocks its pair and
    /// is swept as `Timeout`.
    pub attempt_timeout_secs: i64,
    /// Deadline for each individual proof backend or ledger call.
    pub call_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: 300,
            call_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = OrchestratorConfig::default();
        assert_eq!(c.attempt_timeout_secs, 300);
        assert_eq!(c.call_timeout, Duration::from_secs(30));
    }
}
