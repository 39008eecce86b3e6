//! Per-thread current-context manager
//!
//! Tracks which [`Context`] is active on the calling thread, plus a stack of
//! previously active contexts used to restore state on detach.
//!
//! ## Lifecycle
//!
//! ```text
//! 1. current()            - read the active context (root if none)
//! 2. derive               - set_value / set_values on it
//! 3. attach(derived)      - push previous current, make derived current
//! 4. ... work ...
//! 5. detach(token)        - pop previous current back into place
//! ```
//!
//! `with_current`, `with_value` and `with_values` run steps 3-5 around a
//! closure and detach on every exit path, including panics.
//!
//! ## Invariants
//!
//! - Stack depth equals the number of unmatched attaches on this thread
//! - `current()` is total: it never returns "no context"
//! - Detach never fails: a token mismatch is logged and the pop proceeds,
//!   an empty stack falls back to the root context
//!
//! ## Isolation
//!
//! State lives in a `thread_local!`, so threads never observe each other's
//! current context. Async tasks that hop between worker threads carry their
//! context with [`FutureExt`](crate::FutureExt) instead.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use strata_context_core::{Context, Entry, Key, ManagerConfig};
use tracing::{debug, trace, warn};

use crate::error::DetachError;
use crate::guard::ContextGuard;

/// Process-wide manager settings
static CONFIG: Lazy<RwLock<ManagerConfig>> = Lazy::new(|| RwLock::new(ManagerConfig::default()));

thread_local! {
    /// This thread's current context and attach stack
    static STATE: RefCell<ThreadState> = RefCell::new(ThreadState::new());
}

/// Current context plus attach stack for one execution unit
///
/// Threads keep theirs in `STATE`. A [`WithContext`](crate::WithContext)
/// task owns its own and swaps it in for the duration of each poll.
#[derive(Debug)]
pub(crate) struct ThreadState {
    /// `None` until first access; read as the root context
    current: Option<Context>,
    /// Previously current contexts, most recent last
    stack: Vec<Context>,
}

impl ThreadState {
    const fn new() -> Self {
        ThreadState {
            current: None,
            stack: Vec::new(),
        }
    }

    /// State for a unit that starts with `context` current and nothing attached
    pub(crate) fn starting_with(context: Context) -> Self {
        ThreadState {
            current: Some(context),
            stack: Vec::new(),
        }
    }

    /// Exchange `self` with the calling thread's state
    ///
    /// Calling it twice restores both sides. Returns false during
    /// thread-local teardown, when nothing was exchanged.
    pub(crate) fn swap_with_thread(&mut self) -> bool {
        STATE
            .try_with(|state| std::mem::swap(&mut *state.borrow_mut(), self))
            .is_ok()
    }
}

/// Attach receipt: the stack depth right after the attach
///
/// Tokens are advisory. Anyone can build one with `AttachToken::from`, and
/// a mismatched token only produces a warning. Use [`ContextGuard`] when a
/// scope handle that cannot be forged is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachToken(usize);

impl AttachToken {
    /// Stack depth recorded at attach time
    pub fn depth(&self) -> usize {
        self.0
    }
}

impl From<usize> for AttachToken {
    fn from(depth: usize) -> Self {
        AttachToken(depth)
    }
}

impl fmt::Display for AttachToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attach#{}", self.0)
    }
}

/// Thread-scoped current-context operations
///
/// All functions act on the calling thread's state.
///
/// # Example
///
/// ```
/// use strata_context_concurrency::ContextManager;
/// use strata_context_core::Key;
///
/// let trace_id: Key<String> = Key::new("trace-id");
///
/// ContextManager::with_value(&trace_id, "abc".to_string(), |_cx, _id| {
///     assert_eq!(ContextManager::value(&trace_id).as_deref().map(String::as_str), Some("abc"));
/// });
/// assert!(ContextManager::value(&trace_id).is_none());
/// ```
pub struct ContextManager;

impl ContextManager {
    /// Install the process-wide manager config
    ///
    /// Takes effect for subsequent operations on every thread. Stack
    /// capacity applies to threads that have not attached yet.
    pub fn configure(config: ManagerConfig) {
        debug!(?config, "Context manager configured");
        *CONFIG.write() = config;
    }

    /// Active process-wide manager config
    pub fn config() -> ManagerConfig {
        CONFIG.read().clone()
    }

    /// The calling thread's current context
    ///
    /// Lazily initialized to the root context on first access. During
    /// thread-local teardown this returns the root context.
    pub fn current() -> Context {
        STATE
            .try_with(|state| {
                state
                    .borrow_mut()
                    .current
                    .get_or_insert_with(Context::root)
                    .clone()
            })
            .unwrap_or_else(|_| Context::root())
    }

    /// Number of unmatched attaches on the calling thread
    pub fn depth() -> usize {
        STATE
            .try_with(|state| state.borrow().stack.len())
            .unwrap_or(0)
    }

    /// Make `context` current, saving the previous one
    ///
    /// Returns a token equal to the new stack depth. Pass it to
    /// [`detach`](Self::detach) to get a warning if scopes are unbalanced.
    /// During thread-local teardown nothing is attached and the token is 0.
    pub fn attach(context: Context) -> AttachToken {
        let config = Self::config();

        let attached = STATE.try_with(|state| {
            let mut state = state.borrow_mut();
            let previous = state.current.take().unwrap_or_else(Context::root);
            if state.stack.capacity() == 0 {
                state.stack.reserve(config.initial_stack_capacity);
            }
            state.stack.push(previous);
            state.current = Some(context);
            state.stack.len()
        });

        // Thread-local already destroyed: nothing to attach to.
        let Ok(depth) = attached else {
            return AttachToken(0);
        };

        if config.crosses_depth_threshold(depth) {
            warn!(
                depth,
                threshold = ?config.depth_warning_threshold,
                "Context attach stack is unusually deep - likely attaches without detach"
            );
        }
        trace!(depth, "Attached context");

        AttachToken(depth)
    }

    /// Attach `context` and return a guard that detaches on drop
    pub fn attach_guard(context: Context) -> ContextGuard {
        ContextGuard::new(Self::attach(context))
    }

    /// Restore the context that was current before the latest attach
    ///
    /// Pops the attach stack, falling back to the root context when it is
    /// empty, and returns the restored context. A supplied `token` that does
    /// not match the stack depth is logged as a warning; the pop happens
    /// regardless.
    pub fn detach(token: Option<AttachToken>) -> Context {
        let popped = STATE.try_with(|state| {
            let mut state = state.borrow_mut();
            let depth = state.stack.len();
            let restored = state.stack.pop().unwrap_or_else(Context::root);
            let replaced = state.current.replace(restored.clone());
            (depth, restored, replaced)
        });

        // Thread-local already destroyed: nothing left to restore.
        let Ok((depth, restored, replaced)) = popped else {
            return Context::root();
        };
        // Dropped outside the borrow so value destructors may use the manager.
        drop(replaced);

        if let Some(token) = token {
            if token.0 != depth && Self::config().warn_on_mismatch {
                let err = DetachError::TokenMismatch {
                    expected: token.0,
                    actual: depth,
                };
                warn!(
                    expected = token.0,
                    actual = depth,
                    reason = err.reason_code(),
                    "{}; restoring top of stack",
                    err
                );
            }
        }
        if depth == 0 {
            debug!("Detach with empty attach stack; current context reset to root");
        }
        trace!(depth = depth.saturating_sub(1), "Detached context");

        restored
    }

    /// Strict detach: refuse unless `token` matches the stack depth
    ///
    /// On error the thread's state is left untouched. During thread-local
    /// teardown there is no stack left, which reports as underflow.
    pub fn try_detach(token: AttachToken) -> Result<Context, DetachError> {
        let popped = STATE.try_with(|state| {
            let mut state = state.borrow_mut();
            let depth = state.stack.len();
            if depth == 0 {
                return Err(DetachError::StackUnderflow);
            }
            if token.0 != depth {
                return Err(DetachError::TokenMismatch {
                    expected: token.0,
                    actual: depth,
                });
            }
            let restored = state.stack.pop().ok_or(DetachError::StackUnderflow)?;
            let replaced = state.current.replace(restored.clone());
            Ok((restored, replaced))
        });

        let (restored, replaced) = popped.unwrap_or(Err(DetachError::StackUnderflow))?;
        drop(replaced);
        trace!(depth = token.0 - 1, "Detached context");
        Ok(restored)
    }

    /// Run `body` with `context` current, restoring the previous context after
    ///
    /// The restore runs on every exit path of `body`, including unwinding
    /// from a panic. Errors returned by `body` pass through unchanged.
    pub fn with_current<R, F>(context: Context, body: F) -> R
    where
        F: FnOnce(&Context) -> R,
    {
        let _guard = Self::attach_guard(context.clone());
        body(&context)
    }

    /// Run `body` with `key` set to `value` on top of the current context
    ///
    /// `body` receives the derived context and the stored value.
    pub fn with_value<T, R, F>(key: &Key<T>, value: T, body: F) -> R
    where
        T: Send + Sync + 'static,
        F: FnOnce(&Context, &T) -> R,
    {
        let value = Arc::new(value);
        let derived = Self::current().set_value_arc(key, Arc::clone(&value));
        Self::with_current(derived, |cx| body(cx, &value))
    }

    /// Run `body` with `entries` merged on top of the current context
    pub fn with_values<I, R, F>(entries: I, body: F) -> R
    where
        I: IntoIterator<Item = Entry>,
        F: FnOnce(&Context) -> R,
    {
        let derived = Self::current().set_values(entries);
        Self::with_current(derived, body)
    }

    /// Value stored under `key` in the current context
    pub fn value<T>(key: &Key<T>) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        STATE
            .try_with(|state| {
                state
                    .borrow()
                    .current
                    .as_ref()
                    .and_then(|cx| cx.value_arc(key))
            })
            .ok()
            .flatten()
    }

    /// Reset this thread to the root context with an empty attach stack
    ///
    /// Intended for isolating independent units of work in tests. Any
    /// outstanding tokens or guards become stale.
    pub fn clear() {
        let drained = STATE.try_with(|state| {
            let mut state = state.borrow_mut();
            let stack = std::mem::take(&mut state.stack);
            let current = state.current.take();
            (stack, current)
        });

        if let Ok((stack, current)) = drained {
            trace!(discarded = stack.len(), "Cleared context state");
            drop(stack);
            drop(current);
        }
    }
}
