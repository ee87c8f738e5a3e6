//! OrderedTable: insertion-ordered storage keyed by the storage key `Tk`.
//!
//! A hashbrown `HashTable` indexes generational slotmap keys; each slot is
//! threaded into a doubly-linked list so iteration follows insertion order
//! and removal stays O(1). Overwriting an existing key keeps its position.

use crate::reentrancy::StorageGuard;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Clone, Debug)]
struct Slot<Tk, V> {
    key: Tk,
    value: V,
    hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

pub(crate) struct OrderedTable<Tk, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Slot<Tk, V>>,
    order: Order,
    reentrancy: StorageGuard,
}

/// Ends of the insertion-order list threaded through the slots.
#[derive(Clone, Copy, Debug, Default)]
struct Order {
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl Order {
    fn push_back<Tk, V>(&mut self, slots: &mut SlotMap<DefaultKey, Slot<Tk, V>>, k: DefaultKey) {
        match self.tail.and_then(|t| slots.get_mut(t)) {
            Some(last) => last.next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
    }

    fn unlink<Tk, V>(
        &mut self,
        slots: &mut SlotMap<DefaultKey, Slot<Tk, V>>,
        prev: Option<DefaultKey>,
        next: Option<DefaultKey>,
    ) {
        match prev.and_then(|p| slots.get_mut(p)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| slots.get_mut(n)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
    }
}

impl<Tk, V> OrderedTable<Tk, V>
where
    Tk: Eq + Hash,
{
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<Tk, V, S> OrderedTable<Tk, V, S>
where
    Tk: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
            order: Order::default(),
            reentrancy: StorageGuard::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn find<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        Tk: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub(crate) fn contains_key<Q>(&self, q: &Q) -> bool
    where
        Tk: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub(crate) fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        Tk: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.slots.get(k).map(|s| &s.value)
    }

    pub(crate) fn get_key_value<Q>(&self, q: &Q) -> Option<(&Tk, &V)>
    where
        Tk: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.slots.get(k).map(|s| (&s.key, &s.value))
    }

    pub(crate) fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        Tk: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.slots.get_mut(k).map(|s| &mut s.value)
    }

    /// Insert or overwrite. An overwritten entry keeps its position in
    /// iteration order and the previous value is returned.
    pub(crate) fn upsert(&mut self, key: Tk, value: V) -> Option<V> {
        let _g = self.reentrancy.enter("upsert");
        let hash = self.make_hash(&key);
        match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|s| s.key == key).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            Entry::Occupied(o) => {
                let k = *o.get();
                self.slots
                    .get_mut(k)
                    .map(|s| core::mem::replace(&mut s.value, value))
            }
            Entry::Vacant(v) => {
                let k = self.slots.insert(Slot {
                    key,
                    value,
                    hash,
                    prev: self.order.tail,
                    next: None,
                });
                let _ = v.insert(k);
                self.order.push_back(&mut self.slots, k);
                None
            }
        }
    }

    /// Return the value for `key`, inserting `default()` at the tail first if
    /// it is absent. `default` only runs on a miss.
    pub(crate) fn get_or_insert_with<F>(&mut self, key: Tk, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("get_or_insert_with");
        let hash = self.make_hash(&key);
        let k = match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|s| s.key == key).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(v) => {
                let value = default();
                let k = self.slots.insert(Slot {
                    key,
                    value,
                    hash,
                    prev: self.order.tail,
                    next: None,
                });
                let _ = v.insert(k);
                self.order.push_back(&mut self.slots, k);
                k
            }
        };
        &mut self.slots[k].value
    }

    pub(crate) fn remove<Q>(&mut self, q: &Q) -> Option<(Tk, V)>
    where
        Tk: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove");
        let hash = self.make_hash(q);
        let (k, _) = self
            .index
            .find_entry(hash, |&kk| {
                self.slots
                    .get(kk)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .ok()?
            .remove();
        let slot = self.slots.remove(k)?;
        self.order.unlink(&mut self.slots, slot.prev, slot.next);
        Some((slot.key, slot.value))
    }

    /// Keep only entries for which `f` returns true, preserving order.
    pub(crate) fn retain<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&Tk, &mut V) -> bool,
    {
        let mut removed = 0;
        let mut cur = self.order.head;
        while let Some(k) = cur {
            let Some(slot) = self.slots.get_mut(k) else {
                debug_assert!(false, "order list points at a freed slot");
                break;
            };
            cur = slot.next;
            if !f(&slot.key, &mut slot.value) {
                self.remove_slot(k);
                removed += 1;
            }
        }
        removed
    }

    fn remove_slot(&mut self, k: DefaultKey) -> Option<(Tk, V)> {
        let _g = self.reentrancy.enter("remove_slot");
        let slot = self.slots.remove(k)?;
        match self.index.find_entry(slot.hash, |&kk| kk == k) {
            Ok(o) => {
                o.remove();
            }
            Err(_) => debug_assert!(false, "slot missing from index"),
        }
        self.order.unlink(&mut self.slots, slot.prev, slot.next);
        Some((slot.key, slot.value))
    }

    /// Drop every entry; returns how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let _g = self.reentrancy.enter("clear");
        let n = self.slots.len();
        self.index.clear();
        self.slots.clear();
        self.order = Order::default();
        n
    }

    pub(crate) fn iter(&self) -> Iter<'_, Tk, V> {
        Iter {
            slots: &self.slots,
            front: self.order.head,
            back: self.order.tail,
            remaining: self.slots.len(),
        }
    }

    pub(crate) fn into_entries(self) -> IntoIter<Tk, V> {
        IntoIter {
            remaining: self.slots.len(),
            front: self.order.head,
            back: self.order.tail,
            slots: self.slots,
        }
    }
}

impl<Tk: Clone, V: Clone, S: Clone> Clone for OrderedTable<Tk, V, S> {
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            index: self.index.clone(),
            slots: self.slots.clone(),
            order: self.order,
            reentrancy: StorageGuard::new(),
        }
    }
}

/// Borrowing iterator over entries in insertion order.
pub struct Iter<'a, Tk, V> {
    slots: &'a SlotMap<DefaultKey, Slot<Tk, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<Tk, V> Clone for Iter<'_, Tk, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, Tk, V> Iterator for Iter<'a, Tk, V> {
    type Item = (&'a Tk, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.get(self.front?)?;
        self.front = slot.next;
        self.remaining -= 1;
        Some((&slot.key, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<Tk, V> DoubleEndedIterator for Iter<'_, Tk, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.get(self.back?)?;
        self.back = slot.prev;
        self.remaining -= 1;
        Some((&slot.key, &slot.value))
    }
}

impl<Tk, V> ExactSizeIterator for Iter<'_, Tk, V> {}
impl<Tk, V> FusedIterator for Iter<'_, Tk, V> {}

/// Owning iterator over entries in insertion order.
pub struct IntoIter<Tk, V> {
    slots: SlotMap<DefaultKey, Slot<Tk, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<Tk, V> Iterator for IntoIter<Tk, V> {
    type Item = (Tk, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.remove(self.front?)?;
        self.front = slot.next;
        self.remaining -= 1;
        Some((slot.key, slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<Tk, V> DoubleEndedIterator for IntoIter<Tk, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.slots.remove(self.back?)?;
        self.back = slot.prev;
        self.remaining -= 1;
        Some((slot.key, slot.value))
    }
}

impl<Tk, V> ExactSizeIterator for IntoIter<Tk, V> {}
impl<Tk, V> FusedIterator for IntoIter<Tk, V> {}
