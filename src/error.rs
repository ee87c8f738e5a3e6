//! The error returned by strict accessors, and the diagnostic link back to
//! the map that produced it.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-unique identity of a map instance. Clones and derived maps get
/// a fresh id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MapId(u64);

impl MapId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MapId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Non-owning reference to a map, kept for diagnostics.
///
/// It records the map's identity, label and flavor; it never keeps the map
/// alive and cannot reach its entries.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MapRef {
    id: MapId,
    label: Arc<str>,
    type_name: &'static str,
}

impl MapRef {
    pub(crate) fn new(id: MapId, label: Arc<str>, type_name: &'static str) -> Self {
        Self {
            id,
            label,
            type_name,
        }
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.type_name, self.label)
    }
}

/// Which strict operation missed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    Get,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Get => "get",
            Operation::Delete => "delete",
        })
    }
}

/// A strict `get` or `delete` found no entry for `key`.
///
/// Carries the domain key as passed by the caller and a [`MapRef`] to the
/// originating map.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{operation}: key {key:?} not found in {map}")]
pub struct NotFoundError<K> {
    key: K,
    map: MapRef,
    operation: Operation,
}

impl<K> NotFoundError<K> {
    pub(crate) fn new(key: K, map: MapRef, operation: Operation) -> Self {
        Self {
            key,
            map,
            operation,
        }
    }

    /// The domain key that was looked up.
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    /// The map the lookup ran against.
    pub fn map(&self) -> &MapRef {
        &self.map
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Whether this error was produced by `map`.
    pub fn originates_from<M>(&self, map: &M) -> bool
    where
        M: crate::MapContract + ?Sized,
    {
        self.map.id == map.id()
    }
}
