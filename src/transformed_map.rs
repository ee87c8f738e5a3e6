//! TransformedMap: a map addressed by domain keys but stored under
//! `transform(key)`.
//!
//! Two domain keys whose transforms are equal address the same entry.
//! Iteration yields storage keys, in insertion order.

use crate::contract::{GetOr, MapContract};
use crate::error::{MapId, MapRef, NotFoundError, Operation};
use crate::ordered_table::{IntoIter, Iter, OrderedTable};
use crate::transform::{MapOptions, Transform};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use std::collections::hash_map::RandomState;
use std::sync::Arc;

pub use crate::ordered_table::Iter as Entries;
pub use crate::ordered_table::IntoIter as IntoEntries;

const TYPE_NAME: &str = "TransformedMap";

pub struct TransformedMap<K, V, Tk = K, S = RandomState> {
    table: OrderedTable<Tk, V, S>,
    transform: Transform<K, Tk>,
    label: Arc<str>,
    id: MapId,
}

/// A map whose storage keys are strings produced by a caller-supplied hash
/// function.
pub type HashedMap<K, V, S = RandomState> = TransformedMap<K, V, String, S>;

impl<K, V> TransformedMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
{
    /// Empty map with the identity transform and the default label.
    pub fn new() -> Self {
        Self::with_options(MapOptions::new())
    }

    /// Empty map with the identity transform.
    pub fn labeled(label: impl Into<Arc<str>>) -> Self {
        Self::with_options(MapOptions::new().label(label))
    }

    /// Build an identity-keyed map; later duplicates overwrite earlier ones.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_entries_with(entries, MapOptions::new())
    }
}

impl<K, V> Default for TransformedMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, Tk> TransformedMap<K, V, Tk>
where
    Tk: Eq + Hash,
{
    pub fn with_transform<F>(f: F) -> Self
    where
        F: Fn(&K) -> Tk + 'static,
    {
        Self::with_options(MapOptions::with_transform(f))
    }

    pub fn with_options(options: MapOptions<K, Tk>) -> Self {
        Self::with_options_and_hasher(options, RandomState::new())
    }

    /// Build a map from `entries` using the transform and label in `options`.
    /// Entries whose transformed keys collide overwrite earlier ones but keep
    /// the first one's position.
    pub fn from_entries_with<I>(entries: I, options: MapOptions<K, Tk>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut m = Self::with_options(options);
        m.extend(entries);
        tracing::trace!(label = %m.label, len = m.len(), "built map from entries");
        m
    }
}

impl<K, V> HashedMap<K, V> {
    /// Empty map keyed by `hash(key)`.
    pub fn with_hash<F>(hash: F) -> Self
    where
        F: Fn(&K) -> String + 'static,
    {
        Self::with_transform(hash)
    }

    pub fn from_custom_entries<I, F>(entries: I, hash: F) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        F: Fn(&K) -> String + 'static,
    {
        Self::from_entries_with(entries, MapOptions::with_transform(hash))
    }
}

impl<K, V, Tk, S> TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_options_and_hasher(options: MapOptions<K, Tk>, hasher: S) -> Self {
        Self {
            table: OrderedTable::with_hasher(hasher),
            transform: options.transform,
            label: options.label,
            id: MapId::fresh(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn map_ref(&self) -> MapRef {
        self.map_ref_as(TYPE_NAME)
    }

    pub fn transform(&self) -> &Transform<K, Tk> {
        &self.transform
    }

    /// The storage key `key` maps to.
    pub fn storage_key(&self, key: &K) -> Tk {
        self.transform.apply(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub(crate) fn map_ref_as(&self, type_name: &'static str) -> MapRef {
        MapRef::new(self.id, Arc::clone(&self.label), type_name)
    }

    fn not_found(&self, key: &K, operation: Operation) -> NotFoundError<K>
    where
        K: Clone,
    {
        tracing::debug!(label = %self.label, %operation, "key not found");
        NotFoundError::new(key.clone(), self.map_ref(), operation)
    }

    /// Returns the value stored under `transform(key)`.
    ///
    /// # Errors
    /// [`NotFoundError`] carrying `key` if there is no such entry.
    pub fn get(&self, key: &K) -> Result<&V, NotFoundError<K>>
    where
        K: Clone,
    {
        match self.find(key) {
            Some(v) => Ok(v),
            None => Err(self.not_found(key, Operation::Get)),
        }
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        self.table.get(&self.transform.apply(key))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let tk = self.transform.apply(key);
        self.table.get_mut(&tk)
    }

    /// Look up by storage key, e.g. one obtained from [`keys`](Self::keys).
    pub fn find_stored<Q>(&self, stored: &Q) -> Option<(&Tk, &V)>
    where
        Tk: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_key_value(stored)
    }

    pub fn get_or<'a>(&'a self, key: &K, fallback: &'a V) -> &'a V {
        self.find(key).unwrap_or(fallback)
    }

    /// Like [`get_or`](Self::get_or) but the fallback may be any type and is
    /// only produced on a miss.
    pub fn get_or_else<R, F>(&self, key: &K, fallback: F) -> GetOr<&V, R>
    where
        F: FnOnce() -> R,
    {
        match self.find(key) {
            Some(v) => GetOr::Found(v),
            None => GetOr::Fallback(fallback()),
        }
    }

    pub fn has(&self, key: &K) -> bool {
        self.table.contains_key(&self.transform.apply(key))
    }

    /// Insert or overwrite, returning the previous value. An overwritten
    /// entry keeps its original position and storage key.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let tk = self.transform.apply(&key);
        self.table.upsert(tk, value)
    }

    /// Returns the entry for `key`, inserting `default()` first on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: &K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let tk = self.transform.apply(key);
        self.table.get_or_insert_with(tk, default)
    }

    /// Removes and returns the entry for `key`.
    ///
    /// # Errors
    /// [`NotFoundError`] carrying `key` if there is no such entry; the map is
    /// left unchanged.
    pub fn delete(&mut self, key: &K) -> Result<V, NotFoundError<K>>
    where
        K: Clone,
    {
        match self.remove(key) {
            Some(v) => Ok(v),
            None => Err(self.not_found(key, Operation::Delete)),
        }
    }

    /// Removes and returns the entry for `key`, if any.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let tk = self.transform.apply(key);
        self.table.remove(&tk).map(|(_, v)| v)
    }

    /// Removes the entry for `key` if present; returns whether it was.
    pub fn delete_if_exists(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        let dropped = self.table.clear();
        tracing::trace!(label = %self.label, dropped, "cleared map");
    }

    /// In-place counterpart of [`filter`](Self::filter).
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Tk, &mut V) -> bool,
    {
        let removed = self.table.retain(f);
        tracing::trace!(label = %self.label, removed, "retained entries");
    }

    /// Entries as `(storage key, value)` in insertion order.
    pub fn entries(&self) -> Entries<'_, Tk, V> {
        self.table.iter()
    }

    pub fn keys(&self) -> Keys<'_, Tk, V> {
        Keys {
            inner: self.table.iter(),
        }
    }

    pub fn values(&self) -> Values<'_, Tk, V> {
        Values {
            inner: self.table.iter(),
        }
    }

    pub fn into_entries(self) -> IntoEntries<Tk, V> {
        self.table.into_entries()
    }
}

impl<K, V, Tk, S> TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher + Clone,
{
    /// A new, empty map with this map's transform, label and hasher.
    fn derive_empty<V2>(&self) -> TransformedMap<K, V2, Tk, S> {
        TransformedMap {
            table: OrderedTable::with_hasher(self.table.hasher().clone()),
            transform: self.transform.clone(),
            label: Arc::clone(&self.label),
            id: MapId::fresh(),
        }
    }

    /// A new map holding the entries `predicate` accepts. The `usize` passed
    /// to `predicate` is the number of entries accepted so far.
    ///
    /// ```
    /// use transform_map::TransformedMap;
    ///
    /// let m = TransformedMap::from_entries([(1, "one"), (2, "two"), (3, "three")]);
    /// let long = m.filter(|v, _, _, _| v.len() > 3);
    /// assert_eq!(long.entries().collect::<Vec<_>>(), [(&3, &"three")]);
    /// assert_eq!(m.len(), 3);
    /// ```
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&V, &Tk, usize, &Self) -> bool,
        Tk: Clone,
        V: Clone,
    {
        let mut out: Self = self.derive_empty();
        for (k, v) in self.entries() {
            if predicate(v, k, out.len(), self) {
                out.table.upsert(k.clone(), v.clone());
            }
        }
        tracing::trace!(label = %self.label, from = self.len(), to = out.len(), "filtered map");
        out
    }

    /// A new map built from the `(domain key, value)` pairs `f` returns,
    /// inserted in call order. The `usize` is the source entry's position.
    /// Returned keys go through the transform; if two collide the later
    /// value wins.
    pub fn map<V2, F>(&self, mut f: F) -> TransformedMap<K, V2, Tk, S>
    where
        F: FnMut(&V, &Tk, usize, &Self) -> (K, V2),
    {
        let mut out: TransformedMap<K, V2, Tk, S> = self.derive_empty();
        for (i, (k, v)) in self.entries().enumerate() {
            let (key, value) = f(v, k, i, self);
            out.set(key, value);
        }
        tracing::trace!(label = %self.label, from = self.len(), to = out.len(), "mapped map");
        out
    }

    /// [`map`](Self::map) that keeps every value and computes a new domain
    /// key for it.
    pub fn map_keys<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Tk, &V, usize, &Self) -> K,
        V: Clone,
    {
        self.map(|v, k, i, m| (f(k, v, i, m), v.clone()))
    }

    /// [`map`](Self::map) that keeps every storage key and computes a new
    /// value for it. The transform is not re-run.
    pub fn map_values<V2, F>(&self, mut f: F) -> TransformedMap<K, V2, Tk, S>
    where
        F: FnMut(&V, &Tk, usize, &Self) -> V2,
        Tk: Clone,
    {
        let mut out: TransformedMap<K, V2, Tk, S> = self.derive_empty();
        for (i, (k, v)) in self.entries().enumerate() {
            let value = f(v, k, i, self);
            out.table.upsert(k.clone(), value);
        }
        tracing::trace!(label = %self.label, from = self.len(), to = out.len(), "mapped values");
        out
    }
}

impl<K, V, Tk, S> MapContract for TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    type Key = K;
    type StorageKey = Tk;
    type Value = V;
    type Entries<'a>
        = Entries<'a, Tk, V>
    where
        Self: 'a;

    fn id(&self) -> MapId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn map_ref(&self) -> MapRef {
        TransformedMap::map_ref(self)
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn find(&self, key: &K) -> Option<&V> {
        TransformedMap::find(self, key)
    }

    fn get(&mut self, key: &K) -> Result<&V, NotFoundError<K>>
    where
        K: Clone,
    {
        TransformedMap::get(self, key)
    }

    fn has(&self, key: &K) -> bool {
        TransformedMap::has(self, key)
    }

    fn set(&mut self, key: K, value: V) -> Option<V> {
        TransformedMap::set(self, key, value)
    }

    fn delete(&mut self, key: &K) -> Result<V, NotFoundError<K>>
    where
        K: Clone,
    {
        TransformedMap::delete(self, key)
    }

    fn delete_if_exists(&mut self, key: &K) -> bool {
        TransformedMap::delete_if_exists(self, key)
    }

    fn clear(&mut self) {
        TransformedMap::clear(self)
    }

    fn entries(&self) -> Entries<'_, Tk, V> {
        self.table.iter()
    }
}

impl<K, V, Tk, S> Extend<(K, V)> for TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TransformedMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<'a, K, V, Tk, S> IntoIterator for &'a TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a Tk, &'a V);
    type IntoIter = Iter<'a, Tk, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K, V, Tk, S> IntoIterator for TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    type Item = (Tk, V);
    type IntoIter = IntoIter<Tk, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_entries()
    }
}

/// Clones get a fresh [`MapId`] and share the transform and label.
impl<K, V, Tk, S> Clone for TransformedMap<K, V, Tk, S>
where
    Tk: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            transform: self.transform.clone(),
            label: Arc::clone(&self.label),
            id: MapId::fresh(),
        }
    }
}

/// Maps are equal when they hold equal entries in the same order; labels
/// and transforms are not compared.
impl<K, V, Tk, S> PartialEq for TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.entries().eq(other.entries())
    }
}

impl<K, V, Tk, S> fmt::Debug for TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TYPE_NAME}({:?}) ", &*self.label)?;
        f.debug_map().entries(self.entries()).finish()
    }
}

#[cfg(feature = "serde")]
impl<K, V, Tk, S> serde::Serialize for TransformedMap<K, V, Tk, S>
where
    Tk: Eq + Hash + serde::Serialize,
    V: serde::Serialize,
    S: BuildHasher,
{
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_map(self.entries())
    }
}

/// Storage keys in insertion order.
pub struct Keys<'a, Tk, V> {
    inner: Iter<'a, Tk, V>,
}

impl<'a, Tk, V> Iterator for Keys<'a, Tk, V> {
    type Item = &'a Tk;

    #[inline]
    fn next(&mut self) -> Option<&'a Tk> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<Tk, V> DoubleEndedIterator for Keys<'_, Tk, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<Tk, V> ExactSizeIterator for Keys<'_, Tk, V> {}
impl<Tk, V> FusedIterator for Keys<'_, Tk, V> {}

/// Values in insertion order.
pub struct Values<'a, Tk, V> {
    inner: Iter<'a, Tk, V>,
}

impl<'a, Tk, V> Iterator for Values<'a, Tk, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<Tk, V> DoubleEndedIterator for Values<'_, Tk, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<Tk, V> ExactSizeIterator for Values<'_, Tk, V> {}
impl<Tk, V> FusedIterator for Values<'_, Tk, V> {}
