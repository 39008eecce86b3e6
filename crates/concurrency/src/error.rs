//! Error types for the context manager
//!
//! Attach/detach imbalance is not fatal. The lenient `detach` path only
//! formats these errors into a warning. The strict `try_detach` path
//! returns them to the caller.

use thiserror::Error;

/// Reasons a strict detach was refused
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DetachError {
    /// Token does not match the attach stack depth at detach time
    #[error("Detach token mismatch: token {expected} but stack depth is {actual}")]
    TokenMismatch {
        /// Depth recorded in the token at attach time
        expected: usize,
        /// Stack depth observed at detach time
        actual: usize,
    },

    /// Detach with nothing attached
    #[error("Detach with empty attach stack")]
    StackUnderflow,
}

impl DetachError {
    /// Short reason code for structured logs
    pub fn reason_code(&self) -> &'static str {
        match self {
            DetachError::TokenMismatch { .. } => "token_mismatch",
            DetachError::StackUnderflow => "stack_underflow",
        }
    }
}
