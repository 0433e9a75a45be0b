//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The configured byte budget cannot hold another block for this request.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total byte budget of the arena.
        capacity: usize,
    },
    /// The requested alignment is not a power of two or exceeds
    /// [`MAX_ALIGN`](crate::MAX_ALIGN).
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
    },
    /// The arena configuration failed validation.
    InvalidConfig {
        /// Human-readable description of the violated constraint.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::InvalidAlignment { align } => {
                write!(f, "invalid alignment {align}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}
