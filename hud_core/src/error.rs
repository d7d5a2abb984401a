//! Error kinds shared by the renderer and the orientation estimator.

use thiserror::Error;

/// Errors raised by the HUD core.
///
/// Only [`HudError::Configuration`] is fatal, and only at construction time.
/// The other two are recoverable by the caller (retry after initialisation)
/// or are recovered locally by clamping and logging.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum HudError {
    /// Invalid or inconsistent construction parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The estimator has not received a sample nor been bound to a live source.
    #[error("orientation estimator not ready: {0}")]
    NotReady(&'static str),

    /// A single record with unusable numeric content.
    #[error("malformed {record}: {reason}")]
    MalformedInput {
        record: &'static str,
        reason: String,
    },
}

pub type HudResult<T> = Result<T, HudError>;

impl HudError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        HudError::Configuration(msg.into())
    }

    pub(crate) fn malformed(record: &'static str, reason: impl Into<String>) -> Self {
        HudError::MalformedInput {
            record,
            reason: reason.into(),
        }
    }
}
