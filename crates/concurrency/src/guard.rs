//! RAII scope guard for attached contexts
//!
//! A [`ContextGuard`] detaches its context when dropped. Unlike a raw
//! [`AttachToken`], a guard cannot be forged, and it is neither `Send`
//! nor `Sync`: it must be dropped on the thread that attached it.
//!
//! Dropping guards out of order is tolerated the same way as a mismatched
//! token: a warning is logged and the top of the stack is popped.

use std::marker::PhantomData;

use strata_context_core::Context;

use crate::manager::{AttachToken, ContextManager};

/// Detaches the attached context on drop
#[must_use = "dropping the guard immediately detaches the context"]
#[derive(Debug)]
pub struct ContextGuard {
    token: AttachToken,
    // Thread-affine: the attach stack it pops is thread-local.
    _not_send: PhantomData<*const ()>,
}

impl ContextGuard {
    pub(crate) fn new(token: AttachToken) -> Self {
        ContextGuard {
            token,
            _not_send: PhantomData,
        }
    }

    /// Token recorded when the context was attached
    pub fn token(&self) -> AttachToken {
        self.token
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        ContextManager::detach(Some(self.token));
    }
}

/// Attach a context for the lifetime of a guard
pub trait ContextExt {
    /// Make this context current until the returned guard is dropped
    ///
    /// # Example
    ///
    /// ```
    /// use strata_context_concurrency::{ContextExt, ContextManager};
    /// use strata_context_core::{Context, Key};
    ///
    /// let user: Key<u64> = Key::new("user-id");
    /// {
    ///     let _guard = Context::root().set_value(&user, 7).attach();
    ///     assert_eq!(ContextManager::value(&user).as_deref(), Some(&7));
    /// }
    /// assert!(ContextManager::value(&user).is_none());
    /// ```
    fn attach(self) -> ContextGuard;
}

impl ContextExt for Context {
    fn attach(self) -> ContextGuard {
        ContextManager::attach_guard(self)
    }
}
