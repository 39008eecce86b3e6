//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any test's main.rs.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_context::ContextManager;
use tracing_subscriber::layer::{Context as LayerContext, Layer};
use tracing_subscriber::prelude::*;

// ============================================================================
// Log Capture
// ============================================================================

/// Counts WARN events seen while installed
pub struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` with a thread-local subscriber, returning its result and the
/// number of WARN events it emitted
pub fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, count.load(Ordering::SeqCst))
}

// ============================================================================
// Isolation
// ============================================================================

/// Reset the calling thread's context state
///
/// Test threads are reused by some harnesses, so every test starts here.
pub fn fresh_thread() {
    ContextManager::clear();
    assert_eq!(ContextManager::depth(), 0);
    assert!(ContextManager::current().is_root());
}
