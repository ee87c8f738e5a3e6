//! Debug-only reentrancy guard for the storage layer.
//!
//! `OrderedTable` calls into user code (`Tk: Eq + Hash`) while probing its
//! index, and the index and the order list can be transiently out of sync in
//! the middle of an upsert or unlink. In debug builds, re-entering the same
//! table from such a callback panics and names both operations. In release
//! builds the guard compiles away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Guard entry points with
/// `let _g = self.reentrancy.enter("op");`.
#[derive(Debug)]
pub(crate) struct StorageGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded storage; keep the tracker !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl StorageGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Enter a guarded section for `op`. In debug builds, panics if another
    /// section of the same table is still open.
    #[inline]
    #[allow(unused_variables)]
    pub(crate) fn enter(&self, op: &'static str) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant `{op}` on map storage while `{outer}` is in progress");
            }
            self.active.set(Some(op));
            Section { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Section { _z: PhantomData }
        }
    }

    /// Name of the operation currently holding the guard, if any.
    #[cfg(all(test, debug_assertions))]
    pub(crate) fn active(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for StorageGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII section returned by [`StorageGuard::enter`].
pub(crate) struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a StorageGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
