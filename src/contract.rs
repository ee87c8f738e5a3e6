//! MapContract: the interface every map flavor implements.
//!
//! Code that consumes "a map" should be generic over `M: MapContract` so
//! `TransformedMap`, `DefaultValueMap` and future flavors stay
//! interchangeable.

use crate::error::{MapId, MapRef, NotFoundError};

/// Result of [`MapContract::get_or_else`]: either the stored value or the
/// caller's fallback, which may be of a different type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GetOr<F, R> {
    Found(F),
    Fallback(R),
}

impl<F, R> GetOr<F, R> {
    pub fn is_found(&self) -> bool {
        matches!(self, GetOr::Found(_))
    }

    pub fn found(self) -> Option<F> {
        match self {
            GetOr::Found(f) => Some(f),
            GetOr::Fallback(_) => None,
        }
    }

    pub fn fallback(self) -> Option<R> {
        match self {
            GetOr::Found(_) => None,
            GetOr::Fallback(r) => Some(r),
        }
    }

    /// Collapse both sides into one type.
    pub fn either<T>(self, found: impl FnOnce(F) -> T, fallback: impl FnOnce(R) -> T) -> T {
        match self {
            GetOr::Found(f) => found(f),
            GetOr::Fallback(r) => fallback(r),
        }
    }
}

/// Shared surface of every map flavor.
///
/// Iteration goes through [`entries`](MapContract::entries), which yields
/// `(storage key, value)` in insertion order. Both flavors also implement
/// `IntoIterator` for `&Self` with the same items; generic code that wants
/// `for (k, v) in &m` states that as a bound:
///
/// ```
/// use transform_map::{MapContract, TransformedMap};
///
/// fn total<M>(m: &M) -> i32
/// where
///     M: MapContract<Value = i32>,
///     for<'a> &'a M: IntoIterator<Item = (&'a M::StorageKey, &'a i32)>,
/// {
///     let mut sum = 0;
///     for (_, v) in m {
///         sum += *v;
///     }
///     sum
/// }
///
/// let m = TransformedMap::from_entries([("a", 1), ("b", 2)]);
/// assert_eq!(total(&m), 3);
/// ```
pub trait MapContract {
    /// Key type callers address entries with.
    type Key;
    /// Key type entries are stored (and iterated) under.
    type StorageKey;
    type Value;
    /// Iterator returned by [`entries`](MapContract::entries).
    type Entries<'a>: Iterator<Item = (&'a Self::StorageKey, &'a Self::Value)>
    where
        Self: 'a;

    fn id(&self) -> MapId;
    fn label(&self) -> &str;
    fn type_name(&self) -> &'static str;
    fn map_ref(&self) -> MapRef;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-failing lookup; never creates an entry.
    fn find(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Strict lookup. Takes `&mut self` because a flavor may materialize
    /// the entry on a miss instead of failing (see `DefaultValueMap`); use
    /// [`find`](MapContract::find) for a shared-borrow read.
    fn get(&mut self, key: &Self::Key) -> Result<&Self::Value, NotFoundError<Self::Key>>
    where
        Self::Key: Clone;

    fn get_or<'a>(&'a self, key: &Self::Key, fallback: &'a Self::Value) -> &'a Self::Value {
        self.find(key).unwrap_or(fallback)
    }

    fn get_or_else<R, F>(&self, key: &Self::Key, fallback: F) -> GetOr<&Self::Value, R>
    where
        F: FnOnce() -> R,
    {
        match self.find(key) {
            Some(v) => GetOr::Found(v),
            None => GetOr::Fallback(fallback()),
        }
    }

    fn has(&self, key: &Self::Key) -> bool {
        self.find(key).is_some()
    }

    /// Insert or silently overwrite; returns the replaced value.
    fn set(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    /// Strict removal.
    fn delete(&mut self, key: &Self::Key) -> Result<Self::Value, NotFoundError<Self::Key>>
    where
        Self::Key: Clone;

    fn delete_if_exists(&mut self, key: &Self::Key) -> bool;

    fn clear(&mut self);

    fn entries(&self) -> Self::Entries<'_>;

    fn keys(&self) -> impl Iterator<Item = &Self::StorageKey> {
        self.entries().map(|(k, _)| k)
    }

    fn values(&self) -> impl Iterator<Item = &Self::Value> {
        self.entries().map(|(_, v)| v)
    }
}
