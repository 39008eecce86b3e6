//! Current-context management for Strata
//!
//! This crate implements the per-execution-unit side of context propagation:
//! - ContextManager: thread-scoped current context with an attach stack
//! - AttachToken: advisory receipt for balancing attach/detach
//! - ContextGuard: RAII handle that detaches on drop
//! - WithContext: future wrapper that carries a context across await points
//! - DetachError: reasons a strict detach is refused
//!
//! Context values themselves live in `strata-context-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod future;
pub mod guard;
pub mod manager;

pub use error::DetachError;
pub use future::{FutureExt, WithContext};
pub use guard::{ContextExt, ContextGuard};
pub use manager::{AttachToken, ContextManager};
