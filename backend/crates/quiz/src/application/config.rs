//! Application Configuration
//!
//! Configuration for the quiz application layer.

use std::time::Duration;

use crate::error::{QuizError, QuizResult};

/// Environment variable holding the automatic rotation period in seconds
pub const ROTATION_INTERVAL_ENV: &str = "QUIZ_ROTATION_INTERVAL_SECS";

/// Quiz application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizConfig {
    /// Period of the automatic rotation timer; `None` disables it
    pub rotation_interval: Option<Duration>,
}

impl QuizConfig {
    /// Build from a variable lookup such as `|k| std::env::var(k).ok()`.
    ///
    /// An unset, empty or `0` interval disables the timer.
    pub fn from_lookup<F>(lookup: F) -> QuizResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rotation_interval = match lookup(ROTATION_INTERVAL_ENV) {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    QuizError::Internal(format!(
                        "{ROTATION_INTERVAL_ENV} must be a whole number of seconds, got {raw:?}"
                    ))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self { rotation_interval })
    }

    /// Rotation timer enabled with the given period
    pub fn with_rotation_interval(interval: Duration) -> Self {
        Self {
            rotation_interval: Some(interval),
        }
    }
}
