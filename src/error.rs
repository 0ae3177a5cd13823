//! Error types surfaced to scheduling collaborators.

use tokio::task::JoinError;

/// Errors returned by the optimizer and the run controller.
///
/// Cancellation is deliberately absent: a revoked run still yields its best
/// schedule and is reported through [`Termination::Cancelled`](crate::solver::Termination).
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// A requirement names a role the roster cannot staff.
    #[error("insufficient employees for role '{role}': required {required}, available {available}")]
    InsufficientEmployees {
        role: String,
        required: usize,
        available: usize,
    },
    /// Optimizer or scorer parameters are out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },
    /// Another optimization run is already active.
    #[error("an optimization run is already active, try again later")]
    Busy,
    /// The background worker panicked or was aborted.
    #[error("optimizer task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

impl SchedulingError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SchedulingError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SchedulingError> = std::result::Result<T, E>;
