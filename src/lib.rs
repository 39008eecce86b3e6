//! Strata Context - implicit, immutable context propagation
//!
//! Carries cross-cutting data (trace identifiers, tenant, baggage) through a
//! call stack without threading it through every function signature.
//!
//! # Quick Start
//!
//! ```
//! use strata_context::{create_key, Context, ContextManager, Key};
//!
//! let trace_id: Key<String> = create_key("trace-id");
//! assert!(Context::root().value(&trace_id).is_none());
//!
//! let cx = Context::root().set_value(&trace_id, "abc".to_string());
//! let token = ContextManager::attach(cx);
//! assert_eq!(
//!     ContextManager::current().value(&trace_id).map(String::as_str),
//!     Some("abc")
//! );
//! ContextManager::detach(Some(token));
//! assert!(ContextManager::current().value(&trace_id).is_none());
//! ```
//!
//! # Architecture
//!
//! - [`Context`] values are immutable and shared; derivation returns new
//!   contexts (`strata-context-core`)
//! - [`ContextManager`] tracks the current context per thread, with an
//!   attach stack for scoped activation (`strata-context-concurrency`)
//! - [`FutureExt::with_context`] carries a context with an async task across
//!   worker threads

pub use strata_context_concurrency::{
    AttachToken, ContextExt, ContextGuard, ContextManager, DetachError, FutureExt, WithContext,
};
pub use strata_context_core::{create_key, Context, Entry, Key, KeyId, ManagerConfig};
