//! Error types for the session engine.

use std::fmt;

/// Errors raised by tracks and sessions.
///
/// Only two fault kinds exist:
///
/// - **Ordering**: [`InvalidState`](Self::InvalidState): an operation was
///   invoked before its prerequisites were met (e.g. `start()` before
///   `configure()`, or reading the session description of an unconfigured
///   track). Always caller-correctable.
/// - **Transport**: [`Io`](Self::Io): socket bind/connect failures, TTL
///   rejected by the OS, a broken interleaved output.
///
/// [`SessionBuilder::build`](crate::SessionBuilder::build) never produces
/// either; faults surface once the caller drives the returned session.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Operation invoked out of order or with missing prerequisites.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    /// Whether this is an ordering fault rather than a transport fault.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

/// Failure to parse a quality descriptor from its string form.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind} quality {input:?}: {reason}")]
pub struct QualityParseError {
    pub kind: QualityKind,
    pub input: String,
    pub reason: String,
}

/// Which descriptor failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityKind {
    Video,
    Audio,
}

impl fmt::Display for QualityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Convenience alias for `Result<T, StreamError>`.
pub type Result<T> = std::result::Result<T, StreamError>;
