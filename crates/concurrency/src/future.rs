//! Context propagation for async tasks
//!
//! A task on a multi-threaded runtime can resume on a different worker
//! thread after every `.await`, so thread-local state alone would leak
//! between tasks or be lost. [`WithContext`] gives the task its own current
//! context and attach stack, and swaps them with the worker's state for the
//! duration of each `poll`. Attaches made inside the task survive its await
//! points, and the worker gets its own state back when the poll returns or
//! unwinds.
//!
//! ```ignore
//! let cx = ContextManager::current().set_value(&REQUEST_ID, id);
//! tokio::spawn(handle_request(req).with_context(cx));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use pin_project::pin_project;
use strata_context_core::Context;

use crate::manager::{ContextManager, ThreadState};

/// Future that polls `inner` with its own current context and attach stack
#[pin_project]
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct WithContext<F> {
    #[pin]
    inner: F,
    context: Context,
    task_state: ThreadState,
}

impl<F> WithContext<F> {
    /// Context the task started with
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Unwrap the inner future
    pub fn into_inner(self) -> F {
        self.inner
    }
}

/// Holds the task's state in the thread-local until dropped
struct SwappedIn<'a> {
    task_state: &'a mut ThreadState,
    swapped: bool,
}

impl<'a> SwappedIn<'a> {
    fn new(task_state: &'a mut ThreadState) -> Self {
        let swapped = task_state.swap_with_thread();
        SwappedIn { task_state, swapped }
    }
}

impl Drop for SwappedIn<'_> {
    fn drop(&mut self) {
        if self.swapped {
            self.task_state.swap_with_thread();
        }
    }
}

impl<F: Future> Future for WithContext<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _swapped = SwappedIn::new(this.task_state);
        this.inner.poll(cx)
    }
}

/// Attach contexts to futures
pub trait FutureExt: Future + Sized {
    /// Poll this future with `context` current
    fn with_context(self, context: Context) -> WithContext<Self> {
        WithContext {
            inner: self,
            task_state: ThreadState::starting_with(context.clone()),
            context,
        }
    }

    /// Poll this future with the caller's current context
    ///
    /// The context is captured now, not when the future is first polled.
    fn with_current_context(self) -> WithContext<Self> {
        self.with_context(ContextManager::current())
    }
}

impl<F: Future> FutureExt for F {}
