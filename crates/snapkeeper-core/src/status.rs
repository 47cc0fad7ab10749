//! Execution status normalization
//!
//! Collapses the provider-native automation status vocabulary into the
//! tri-state outcome the lifecycle branches on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized status of a snapshot automation execution
///
/// State machine: `Unknown -> InProgress -> {Success, Failed}`. The poller
/// only ever reads; whoever holds the event writes the result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// No request has been issued yet
    #[default]
    Unknown,
    /// The execution has been started and has not reached a terminal state
    InProgress,
    /// The execution finished successfully
    Success,
    /// The execution timed out, was cancelled, or failed
    Failed,
}

impl ExecutionStatus {
    /// Normalize a provider-native status string.
    ///
    /// Anything containing `TimedOut`, `Failed`, or `Cancelled` collapses to
    /// `Failed`; exactly `Success` maps to `Success`; every other input
    /// (including statuses for executions not yet visible) is `InProgress`.
    /// Total over all inputs.
    pub fn from_native(native: &str) -> Self {
        if native.contains("TimedOut") || native.contains("Failed") || native.contains("Cancelled")
        {
            Self::Failed
        } else if native == "Success" {
            Self::Success
        } else {
            Self::InProgress
        }
    }

    /// Get a display string for the status
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::InProgress => "in-progress",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Check if the status represents a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Check if the status represents success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if the status represents failure
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
