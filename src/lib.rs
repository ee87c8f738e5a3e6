//! transform-map: single-threaded maps addressed by domain keys but stored
//! under a caller-supplied transform of those keys.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: let callers key a map by a derived property of a value (a
//!   calendar day of a timestamp, a normalized string, ...) without
//!   wrapping every key in a newtype with hand-written `Eq`/`Hash`.
//! - Layers:
//!   - OrderedTable<Tk, V, S>: structural storage; a hashbrown index over
//!     slotmap slots threaded into an insertion-order list; includes a
//!     debug-only reentrancy guard.
//!   - TransformedMap<K, V, Tk, S>: public map; applies the transform on
//!     every key-based operation and owns one OrderedTable.
//!   - DefaultValueMap<K, V, Tk, S>: owns one TransformedMap and a
//!     DefaultPolicy; a miss on `get` stores and returns the default.
//!   - MapContract: the trait both flavors implement; flavor-agnostic code
//!     depends on it.
//!
//! Constraints
//! - Single-threaded: the transform is held in an `Rc`, so maps are
//!   `!Send`/`!Sync`.
//! - Domain keys with equal transforms are the same entry. Distinct
//!   storage keys are never merged.
//! - Iteration yields storage keys (`Tk`), never domain keys, in insertion
//!   order. Overwriting keeps an entry's position.
//! - Only `get` and `delete` fail, both with `NotFoundError`; every other
//!   operation is total. Presence is decided by the index, never by the
//!   stored value.
//!
//! Derivations
//! - `filter`, `map`, `map_keys` and `map_values` build a fresh map with
//!   the source's transform, label and hasher; the source is only read.
//!
//! Errors
//! - `NotFoundError` carries the domain key and a `MapRef`: id, label and
//!   flavor name of the originating map. It does not borrow or own the
//!   map, so it can outlive it and cross `?` boundaries freely.
//!
//! Notes and non-goals
//! - No persistence, no internal locking.
//! - Through `MapContract`, `get` takes `&mut self` so DefaultValueMap can
//!   materialize; `find` is the shared-borrow read.

pub mod contract;
pub mod default_map;
pub mod error;
mod ordered_table;
mod reentrancy;
pub mod transform;
pub mod transformed_map;

// Public surface
pub use contract::{GetOr, MapContract};
pub use default_map::{DefaultPolicy, DefaultValueMap};
pub use error::{MapId, MapRef, NotFoundError, Operation};
pub use transform::{MapOptions, Transform, DEFAULT_LABEL};
pub use transformed_map::{HashedMap, TransformedMap};
