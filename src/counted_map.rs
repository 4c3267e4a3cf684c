//! CountedMap: hashbrown storage plus a maintained, signed element count.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::{self, Entry};
use hashbrown::HashMap;
use std::collections::hash_map::RandomState;
use tracing::{debug, trace, warn};

/// Associative container whose `length` is kept alongside the storage.
///
/// `length` follows `put`/`remove` bookkeeping rather than being read off the
/// storage, so it can drift: removing an absent key still decrements it, and
/// writes made through [`CountedMap::items_obj`] are not counted at all.
#[derive(Clone)]
pub struct CountedMap<K, V, S = RandomState> {
    storage: HashMap<K, V, S>,
    length: isize,
}

/// The maintained counter disagrees with the number of stored entries.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LengthMismatch {
    pub recorded: isize,
    pub actual: usize,
}

impl fmt::Display for LengthMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "length counter out of sync: recorded {}, storage holds {}",
            self.recorded, self.actual
        )
    }
}

impl std::error::Error for LengthMismatch {}

impl<K, V> CountedMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S> Default for CountedMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self {
            storage: HashMap::with_hasher(S::default()),
            length: 0,
        }
    }
}

/// Borrowing iterator over the stored entries, in unspecified order.
pub struct Iter<'a, K, V> {
    it: hash_map::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, S> CountedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            storage: HashMap::with_hasher(hasher),
            length: 0,
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            storage: HashMap::with_capacity_and_hasher(capacity, hasher),
            length: 0,
        }
    }

    /// Build a map holding every pair yielded by `source`, added via `update`.
    pub fn from_source<I>(source: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        let mut m = Self::with_hasher(S::default());
        m.update(source);
        m
    }

    /// The maintained counter. Can be negative after removing absent keys.
    pub fn len(&self) -> isize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of entries actually held by the storage.
    pub fn storage_len(&self) -> usize {
        self.storage.len()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.storage.get(key)
    }

    /// Mutable lookup; never affects `length`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.storage.get_mut(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Set `key` to `value`, counting it only if the key was not present.
    pub fn put(&mut self, key: K, value: V) -> &mut V {
        match self.storage.entry(key) {
            Entry::Occupied(o) => {
                let slot = o.into_mut();
                *slot = value;
                slot
            }
            Entry::Vacant(v) => {
                self.length += 1;
                v.insert(value)
            }
        }
    }

    /// Remove `key`. The counter is decremented whether or not the key existed.
    pub fn remove<Q>(&mut self, key: &Q) -> &mut Self
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _ = self.take(key);
        self
    }

    /// Remove `key` and return whatever was stored under it.
    /// Same counting as [`CountedMap::remove`].
    pub fn pop<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(key)
    }

    fn take<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let value = self.storage.remove(key);
        self.length -= 1;
        if value.is_none() {
            trace!(length = self.length, "removed absent key; length under-counts");
        }
        value
    }

    /// Return the value under `key`, storing `default` first if it is absent.
    pub fn ensure(&mut self, key: K, default: V) -> &mut V {
        self.lazy_ensure(key, |_| default)
    }

    /// Like [`CountedMap::ensure`], but only builds the default (from the key)
    /// when the key is absent.
    pub fn lazy_ensure<F>(&mut self, key: K, default_fn: F) -> &mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self.storage.entry(key) {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => {
                let value = default_fn(v.key());
                self.length += 1;
                v.insert(value)
            }
        }
    }

    /// Copy every pair from `source` with `put`, overwriting existing keys.
    pub fn update<I>(&mut self, source: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in source {
            self.put(k, v);
        }
        self
    }

    /// Drop all entries and reset the counter to zero.
    pub fn empty(&mut self) -> &mut Self {
        debug!(dropped = self.storage.len(), "emptying map");
        self.storage.clear();
        self.length = 0;
        self
    }

    /// Snapshot of the keys; later changes to the map do not show up in it.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.storage.keys().cloned().collect()
    }

    /// Snapshot of the values. Element identity is whatever `V::clone` gives:
    /// an `Rc<T>` value keeps pointing at the same allocation.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.storage.values().cloned().collect()
    }

    pub fn items(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.storage
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Live access to the underlying storage.
    ///
    /// Inserts and removals made through this borrow bypass the counter, so
    /// `len()` stops matching the contents until [`CountedMap::resync`] is
    /// called. Nothing detects or repairs this automatically.
    pub fn items_obj(&mut self) -> &mut HashMap<K, V, S> {
        &mut self.storage
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.storage.iter(),
        }
    }

    pub fn check_len(&self) -> Result<(), LengthMismatch> {
        let actual = self.storage.len();
        if usize::try_from(self.length).ok() == Some(actual) {
            Ok(())
        } else {
            Err(LengthMismatch {
                recorded: self.length,
                actual,
            })
        }
    }

    /// Reset the counter to the real number of stored entries.
    pub fn resync(&mut self) -> &mut Self {
        if let Err(e) = self.check_len() {
            warn!(recorded = e.recorded, actual = e.actual, "resyncing length counter");
            self.length = e.actual as isize;
        }
        self
    }
}

impl<K, V, S> fmt::Debug for CountedMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountedMap")
            .field("length", &self.length)
            .field("storage", &self.storage)
            .finish()
    }
}

impl<K, V, S> Extend<(K, V)> for CountedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.update(iter);
    }
}

impl<K, V, S> FromIterator<(K, V)> for CountedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_source(iter)
    }
}

impl<'a, K, V, S> IntoIterator for &'a CountedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
