//! DefaultValueMap: a `TransformedMap` whose `get` never misses.
//!
//! On a miss the default is produced from the policy, stored, and returned,
//! so each absent key is materialized at most once.

use crate::contract::{GetOr, MapContract};
use crate::error::{MapId, MapRef, NotFoundError, Operation};
use crate::transform::MapOptions;
use crate::transformed_map::{Entries, Keys, TransformedMap, Values};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::sync::Arc;

const TYPE_NAME: &str = "DefaultValueMap";

/// How a missing value is produced.
///
/// Only the constant policy needs `V: Clone`; it captures the clone fn when
/// built, so generator maps work with any value type.
pub enum DefaultPolicy<K, V> {
    /// Every miss gets `clone(&value)`. Build with [`DefaultPolicy::constant`].
    Constant { value: V, clone: fn(&V) -> V },
    /// Every miss gets `f(key)`.
    Generator(Box<dyn Fn(&K) -> V>),
}

impl<K, V> DefaultPolicy<K, V> {
    pub fn constant(value: V) -> Self
    where
        V: Clone,
    {
        DefaultPolicy::Constant {
            value,
            clone: V::clone,
        }
    }

    pub fn generator<F>(f: F) -> Self
    where
        F: Fn(&K) -> V + 'static,
    {
        DefaultPolicy::Generator(Box::new(f))
    }

    pub fn produce(&self, key: &K) -> V {
        match self {
            DefaultPolicy::Constant { value, clone } => clone(value),
            DefaultPolicy::Generator(f) => f(key),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for DefaultPolicy<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultPolicy::Constant { value, .. } => {
                f.debug_tuple("Constant").field(value).finish()
            }
            DefaultPolicy::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

pub struct DefaultValueMap<K, V, Tk = K, S = RandomState> {
    map: TransformedMap<K, V, Tk, S>,
    policy: DefaultPolicy<K, V>,
}

impl<K, V> DefaultValueMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
{
    pub fn new(policy: DefaultPolicy<K, V>) -> Self {
        Self::from_map(TransformedMap::new(), policy)
    }

    pub fn with_constant(value: V) -> Self
    where
        V: Clone,
    {
        Self::new(DefaultPolicy::constant(value))
    }

    pub fn with_generator<F>(f: F) -> Self
    where
        F: Fn(&K) -> V + 'static,
    {
        Self::new(DefaultPolicy::generator(f))
    }

    pub fn labeled(label: impl Into<Arc<str>>, policy: DefaultPolicy<K, V>) -> Self {
        Self::from_map(TransformedMap::labeled(label), policy)
    }

    pub fn from_entries<I>(entries: I, policy: DefaultPolicy<K, V>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_map(TransformedMap::from_entries(entries), policy)
    }
}

impl<K, V, Tk> DefaultValueMap<K, V, Tk>
where
    Tk: Eq + Hash,
{
    pub fn with_options(options: MapOptions<K, Tk>, policy: DefaultPolicy<K, V>) -> Self {
        Self::from_map(TransformedMap::with_options(options), policy)
    }
}

impl<K, V, Tk, S> DefaultValueMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    /// Take ownership of `map` and answer its misses with `policy`.
    pub fn from_map(map: TransformedMap<K, V, Tk, S>, policy: DefaultPolicy<K, V>) -> Self {
        Self { map, policy }
    }

    pub fn policy(&self) -> &DefaultPolicy<K, V> {
        &self.policy
    }

    pub fn as_map(&self) -> &TransformedMap<K, V, Tk, S> {
        &self.map
    }

    pub fn into_inner(self) -> TransformedMap<K, V, Tk, S> {
        self.map
    }

    pub fn label(&self) -> &str {
        self.map.label()
    }

    pub fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    pub fn id(&self) -> MapId {
        self.map.id()
    }

    pub fn map_ref(&self) -> MapRef {
        self.map.map_ref_as(TYPE_NAME)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the value for `key`, materializing the default first if the
    /// key is absent. A generator runs at most once per absent key.
    ///
    /// ```
    /// use transform_map::DefaultValueMap;
    ///
    /// let mut counts = DefaultValueMap::with_constant(0u32);
    /// assert_eq!(*counts.get(&"x"), 0);
    /// assert!(counts.has(&"x"));
    /// counts.set("x", 5);
    /// assert_eq!(*counts.get(&"x"), 5);
    /// ```
    pub fn get(&mut self, key: &K) -> &V {
        self.get_mut(key)
    }

    pub fn get_mut(&mut self, key: &K) -> &mut V {
        let id = self.map.id();
        let policy = &self.policy;
        self.map.get_or_insert_with(key, || {
            tracing::trace!(map = ?id, "materialized default");
            policy.produce(key)
        })
    }

    /// Read without materializing.
    pub fn find(&self, key: &K) -> Option<&V> {
        self.map.find(key)
    }

    pub fn get_or<'a>(&'a self, key: &K, fallback: &'a V) -> &'a V {
        self.map.get_or(key, fallback)
    }

    pub fn get_or_else<R, F>(&self, key: &K, fallback: F) -> GetOr<&V, R>
    where
        F: FnOnce() -> R,
    {
        self.map.get_or_else(key, fallback)
    }

    pub fn has(&self, key: &K) -> bool {
        self.map.has(key)
    }

    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.map.set(key, value)
    }

    /// Removes and returns the entry for `key`.
    ///
    /// # Errors
    /// [`NotFoundError`] if the key is absent; no default is materialized.
    pub fn delete(&mut self, key: &K) -> Result<V, NotFoundError<K>>
    where
        K: Clone,
    {
        match self.map.remove(key) {
            Some(v) => Ok(v),
            None => {
                tracing::debug!(label = %self.label(), operation = %Operation::Delete, "key not found");
                Err(NotFoundError::new(key.clone(), self.map_ref(), Operation::Delete))
            }
        }
    }

    pub fn delete_if_exists(&mut self, key: &K) -> bool {
        self.map.delete_if_exists(key)
    }

    pub fn clear(&mut self) {
        self.map.clear()
    }

    pub fn entries(&self) -> Entries<'_, Tk, V> {
        self.map.entries()
    }

    pub fn keys(&self) -> Keys<'_, Tk, V> {
        self.map.keys()
    }

    pub fn values(&self) -> Values<'_, Tk, V> {
        self.map.values()
    }
}

impl<K, V, Tk, S> MapContract for DefaultValueMap<K, V, Tk, S>
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
        self.map.id()
    }

    fn label(&self) -> &str {
        self.map.label()
    }

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn map_ref(&self) -> MapRef {
        DefaultValueMap::map_ref(self)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn find(&self, key: &K) -> Option<&V> {
        self.map.find(key)
    }

    /// Never fails: a miss materializes the default.
    fn get(&mut self, key: &K) -> Result<&V, NotFoundError<K>>
    where
        K: Clone,
    {
        Ok(DefaultValueMap::get(self, key))
    }

    fn set(&mut self, key: K, value: V) -> Option<V> {
        self.map.set(key, value)
    }

    fn delete(&mut self, key: &K) -> Result<V, NotFoundError<K>>
    where
        K: Clone,
    {
        DefaultValueMap::delete(self, key)
    }

    fn delete_if_exists(&mut self, key: &K) -> bool {
        self.map.delete_if_exists(key)
    }

    fn clear(&mut self) {
        self.map.clear()
    }

    fn entries(&self) -> Entries<'_, Tk, V> {
        self.map.entries()
    }
}

impl<'a, K, V, Tk, S> IntoIterator for &'a DefaultValueMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a Tk, &'a V);
    type IntoIter = Entries<'a, Tk, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.entries()
    }
}

impl<K, V, Tk, S> Extend<(K, V)> for DefaultValueMap<K, V, Tk, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.map.extend(iter)
    }
}

impl<K, V, Tk, S> fmt::Debug for DefaultValueMap<K, V, Tk, S>
where
    Tk: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(TYPE_NAME)
            .field("policy", &self.policy)
            .field("map", &self.map)
            .finish()
    }
}

#[cfg(feature = "serde")]
impl<K, V, Tk, S> serde::Serialize for DefaultValueMap<K, V, Tk, S>
where
    Tk: Eq + Hash + serde::Serialize,
    V: serde::Serialize,
    S: BuildHasher,
{
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serde::Serialize::serialize(&self.map, serializer)
    }
}
