//! Immutable context values
//!
//! A [`Context`] is an immutable snapshot of key/value associations. All
//! "mutation" goes through derivation: [`Context::set_value`] and
//! [`Context::set_values`] return a new context and leave the receiver
//! untouched, so a context can be read from any number of threads without
//! synchronization.
//!
//! ## Representation
//!
//! Entries live behind an `Arc`, so cloning a context is O(1). Derivation
//! copies the entry table once and applies the changes to the copy.
//!
//! ## Equality
//!
//! Values are type-erased and cannot be compared structurally. Two
//! `Context` handles are equal when they share the same entry table: a
//! context equals its clones, and [`Context::root`] always equals itself.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::key::{Key, KeyId};

type Value = Arc<dyn Any + Send + Sync>;

/// Shared empty context
static ROOT: Lazy<Context> = Lazy::new(|| Context {
    entries: Arc::new(FxHashMap::default()),
});

#[derive(Clone)]
struct Slot {
    name: Arc<Cow<'static, str>>,
    value: Value,
}

/// A type-erased key/value pair for bulk derivation
///
/// Built with [`Key::entry`]. A single `set_values` call may mix entries
/// of different value types.
pub struct Entry {
    id: KeyId,
    slot: Slot,
}

impl Entry {
    pub(crate) fn new(id: KeyId, name: Arc<Cow<'static, str>>, value: Value) -> Self {
        Entry {
            id,
            slot: Slot { name, value },
        }
    }

    /// Identity of the key this entry belongs to
    pub fn key_id(&self) -> KeyId {
        self.id
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id.as_u64())
            .field("name", &&**self.slot.name)
            .finish()
    }
}

/// Immutable key/value snapshot propagated through a call stack
#[derive(Clone)]
pub struct Context {
    entries: Arc<FxHashMap<KeyId, Slot>>,
}

impl Context {
    /// The empty root context
    ///
    /// Every call returns a handle to the same process-wide instance.
    pub fn root() -> Context {
        ROOT.clone()
    }

    /// Look up the value stored under `key`
    ///
    /// Returns `None` when the key has no entry. A stored value is never
    /// confused with absence, whatever it is.
    pub fn value<T>(&self, key: &Key<T>) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .get(&key.id())
            .and_then(|slot| slot.value.downcast_ref::<T>())
    }

    /// Look up the value stored under `key` as a shared handle
    pub fn value_arc<T>(&self, key: &Key<T>) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .get(&key.id())
            .and_then(|slot| Arc::clone(&slot.value).downcast::<T>().ok())
    }

    /// Whether `key` has an entry in this context
    pub fn contains<T>(&self, key: &Key<T>) -> bool {
        self.entries.contains_key(&key.id())
    }

    /// Derive a new context with `key` mapped to `value`
    ///
    /// Any existing mapping for `key` is overwritten in the new context.
    /// `self` is unchanged.
    pub fn set_value<T>(&self, key: &Key<T>, value: T) -> Context
    where
        T: Send + Sync + 'static,
    {
        self.set_value_arc(key, Arc::new(value))
    }

    /// Derive a new context with `key` mapped to an already-shared value
    ///
    /// The new context stores `value` itself rather than a copy, so callers
    /// can keep their handle and observe the exact stored instance.
    pub fn set_value_arc<T>(&self, key: &Key<T>, value: Arc<T>) -> Context
    where
        T: Send + Sync + 'static,
    {
        let mut entries = (*self.entries).clone();
        entries.insert(
            key.id(),
            Slot {
                name: key.shared_name(),
                value,
            },
        );
        Context {
            entries: Arc::new(entries),
        }
    }

    /// Derive a new context merged with `entries`
    ///
    /// Supplied entries take precedence over this context's. Entries that
    /// share a key are applied in iteration order, so the last one wins.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_context_core::{Context, Key};
    ///
    /// let tenant: Key<&'static str> = Key::new("tenant");
    /// let attempt: Key<u32> = Key::new("attempt");
    ///
    /// let cx = Context::root().set_values([
    ///     tenant.entry("acme"),
    ///     attempt.entry(1),
    ///     attempt.entry(2),
    /// ]);
    /// assert_eq!(cx.value(&tenant), Some(&"acme"));
    /// assert_eq!(cx.value(&attempt), Some(&2));
    /// ```
    pub fn set_values<I>(&self, entries: I) -> Context
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut merged = (*self.entries).clone();
        for entry in entries {
            merged.insert(entry.id, entry.slot);
        }
        Context {
            entries: Arc::new(merged),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this context has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether this handle is the shared root context
    pub fn is_root(&self) -> bool {
        Arc::ptr_eq(&self.entries, &ROOT.entries)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::root()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<(KeyId, &str)> = self
            .entries
            .iter()
            .map(|(id, slot)| (*id, &**slot.name))
            .collect();
        keys.sort_unstable_by_key(|(id, _)| *id);
        let names: Vec<&str> = keys.into_iter().map(|(_, name)| name).collect();

        f.debug_struct("Context")
            .field("len", &self.entries.len())
            .field("keys", &names)
            .finish()
    }
}
