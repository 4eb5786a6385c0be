//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! task_timeout = 120          # Seconds before a task is reported as still running
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Task runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Per-invocation timeout in seconds.
    pub task_timeout: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { task_timeout: 120 }
    }
}

impl BuildConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.task_timeout == 0 {
            diag.error(
                FieldPath::new("build.task_timeout"),
                "must be at least 1 second",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_timeout() {
        let config = test_parse_config("[build]\ntask_timeout = 5");
        assert_eq!(config.build.timeout(), Duration::from_secs(5));
        assert_eq!(test_parse_config("").build.task_timeout, 120);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = test_parse_config("[build]\ntask_timeout = 0");
        let mut diag = ConfigDiagnostics::new();
        config.build.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
