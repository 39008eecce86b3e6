//! Core types for Strata context propagation
//!
//! This crate defines the value side of context propagation:
//! - Key: identity-based, typed handle to a value slot
//! - Context: immutable key/value snapshot, derived rather than mutated
//! - Entry: type-erased key/value pair for bulk derivation
//! - ManagerConfig: settings for the per-thread context manager
//!
//! The per-thread "current context" machinery lives in
//! `strata-context-concurrency`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod key;

pub use config::ManagerConfig;
pub use context::{Context, Entry};
pub use key::{create_key, Key, KeyId};
