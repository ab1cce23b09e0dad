//! Retry utilities for transient remote failures.
//!
//! Provides classification of retryable errors and exponential backoff.

use crate::error::ClassifyError;
use std::time::Duration;

/// Determine whether a classification error is worth retrying.
///
/// Retryable errors: timeouts, unreachable API (connect failures), rate
/// limits (429) and server errors (5xx) from the upload or generation calls.
/// Non-retryable: download failures, staging failures, unparseable replies,
/// auth failures and bad requests.
pub fn is_retryable(error: &ClassifyError) -> bool {
    match error {
        ClassifyError::Timeout { .. } | ClassifyError::Transport { .. } => true,
        ClassifyError::Upload { status_code, .. }
        | ClassifyError::Generation { status_code, .. } => {
            matches!(status_code, Some(code) if *code == 429 || (500..=599).contains(code))
        }
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}
