//! Identity-based context keys
//!
//! A [`Key`] addresses one value slot inside a [`Context`](crate::Context).
//! Keys are compared by identity, never by name: two keys created with the
//! same name are distinct, so unrelated subsystems that happen to pick the
//! same label can never read or clobber each other's values.
//!
//! ## Contract
//!
//! - Every call to [`Key::new`] allocates a fresh, process-unique [`KeyId`]
//! - Clones of a key share its identity
//! - The name is diagnostic only (shown in `Debug` output)
//! - Key identities are never reclaimed; create keys once and hold them

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::Entry;

/// Global key identity counter
static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId(u64);

impl KeyId {
    fn next() -> Self {
        KeyId(NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric identity
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key#{}", self.0)
    }
}

/// Typed, identity-based handle to a context value
///
/// `T` is the type of value stored under this key.
///
/// # Example
///
/// ```
/// use strata_context_core::{Context, Key};
///
/// let trace_id: Key<String> = Key::new("trace-id");
/// let other: Key<String> = Key::new("trace-id");
/// assert_ne!(trace_id, other);
///
/// let cx = Context::root().set_value(&trace_id, "abc".to_string());
/// assert_eq!(cx.value(&trace_id).map(String::as_str), Some("abc"));
/// assert!(cx.value(&other).is_none());
/// ```
pub struct Key<T> {
    id: KeyId,
    name: Arc<Cow<'static, str>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T>
where
    T: Send + Sync + 'static,
{
    /// Create a new key with a fresh identity
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Key {
            id: KeyId::next(),
            name: Arc::new(name.into()),
            _marker: PhantomData,
        }
    }

    /// Pair this key with a value for [`Context::set_values`](crate::Context::set_values)
    pub fn entry(&self, value: T) -> Entry {
        Entry::new(self.id, Arc::clone(&self.name), Arc::new(value))
    }
}

impl<T> Key<T> {
    /// Identity of this key
    pub fn id(&self) -> KeyId {
        self.id
    }

    /// Diagnostic name given at creation
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<Cow<'static, str>> {
        Arc::clone(&self.name)
    }
}

/// Create a new key (free-function form of [`Key::new`])
pub fn create_key<T>(name: impl Into<Cow<'static, str>>) -> Key<T>
where
    T: Send + Sync + 'static,
{
    Key::new(name)
}

// Manual impls: derives would add `T: Clone` / `T: PartialEq` bounds.

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Key {
            id: self.id,
            name: Arc::clone(&self.name),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.id.0)
            .field("name", &self.name())
            .finish()
    }
}
