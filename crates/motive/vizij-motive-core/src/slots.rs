//! Index-addressed slot arena shared by every processor.
//!
//! Slots live in one dense `Vec`. Released slots leave a hole that the next
//! allocation reuses (lowest index first). `defragment` moves entries from the
//! tail into holes and writes the new index into each moved entry's
//! [`SlotBinding`], so handles follow their data without being touched.

use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use crate::ids::{SlotBinding, SlotIndex};

#[derive(Debug)]
struct SlotEntry<T> {
    data: T,
    owner: Weak<SlotBinding>,
}

/// Dense per-processor storage with owner back-references.
#[derive(Debug)]
pub struct SlotStore<T> {
    entries: Vec<Option<SlotEntry<T>>>,
    free: BTreeSet<u32>,
}

impl<T> Default for SlotStore<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> SlotStore<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: BTreeSet::new(),
        }
    }

    /// Store `data` in an unused slot owned by `owner` and point `owner` at it.
    pub fn allocate(&mut self, data: T, owner: &Rc<SlotBinding>) -> SlotIndex {
        let entry = SlotEntry {
            data,
            owner: Rc::downgrade(owner),
        };
        let index = match self.free.pop_first() {
            Some(idx) => {
                self.entries[idx as usize] = Some(entry);
                SlotIndex(idx)
            }
            None => {
                self.entries.push(Some(entry));
                SlotIndex((self.entries.len() - 1) as u32)
            }
        };
        owner.set_index(index);
        index
    }

    /// Free `index` and hand back its data. Other indices are untouched.
    pub fn release(&mut self, index: SlotIndex) -> Option<T> {
        let entry = self.entries.get_mut(index.as_usize())?.take()?;
        if index.as_usize() + 1 == self.entries.len() {
            self.entries.pop();
            self.trim_tail();
        } else {
            self.free.insert(index.0);
        }
        Some(entry.data)
    }

    /// Repoint slot `index` at `owner` without touching its data.
    /// Returns false when `index` is not allocated.
    pub fn transfer(&mut self, index: SlotIndex, owner: &Rc<SlotBinding>) -> bool {
        match self.entries.get_mut(index.as_usize()) {
            Some(Some(entry)) => {
                entry.owner = Rc::downgrade(owner);
                owner.set_index(index);
                true
            }
            _ => false,
        }
    }

    /// True iff `index` is allocated and `binding` is its registered owner.
    pub fn is_owner(&self, index: SlotIndex, binding: &Rc<SlotBinding>) -> bool {
        match self.entries.get(index.as_usize()) {
            Some(Some(entry)) => std::ptr::eq(entry.owner.as_ptr(), Rc::as_ptr(binding)),
            _ => false,
        }
    }

    /// Borrow slot data.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not allocated.
    pub fn get(&self, index: SlotIndex) -> &T {
        match self.entries.get(index.as_usize()) {
            Some(Some(entry)) => &entry.data,
            _ => panic!("{index} is not allocated"),
        }
    }

    /// Mutably borrow slot data.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not allocated.
    pub fn get_mut(&mut self, index: SlotIndex) -> &mut T {
        match self.entries.get_mut(index.as_usize()) {
            Some(Some(entry)) => &mut entry.data,
            _ => panic!("{index} is not allocated"),
        }
    }

    /// Number of allocated slots.
    #[inline]
    pub fn live(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Highest index in use plus one (holes included).
    #[inline]
    pub fn span(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn has_holes(&self) -> bool {
        !self.free.is_empty()
    }

    /// Allocated slots in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (SlotIndex(i as u32), &e.data)))
    }

    /// Allocated slots in ascending index order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut T)> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(i, e)| e.as_mut().map(|e| (SlotIndex(i as u32), &mut e.data)))
    }

    /// Fill every hole with an entry from the tail, repointing moved owners.
    ///
    /// Entries whose owner is gone (a handle leaked without release) are
    /// dropped instead of moved. Returns the number of relocated entries.
    pub fn defragment(&mut self) -> usize {
        let mut moved = 0;
        while let Some(hole) = self.free.pop_first() {
            if hole as usize >= self.entries.len() {
                continue;
            }
            let Some(entry) = self.entries.pop().flatten() else {
                unreachable!("tail entries are trimmed on release");
            };
            let target = SlotIndex(hole);
            match entry.owner.upgrade() {
                Some(owner) => {
                    owner.set_index(target);
                    self.entries[hole as usize] = Some(entry);
                    moved += 1;
                }
                None => {
                    log::warn!("dropping orphaned slot data while compacting into {target}");
                    self.free.insert(hole);
                }
            }
            self.trim_tail();
        }
        moved
    }

    /// Drop trailing holes so the last entry is always allocated.
    fn trim_tail(&mut self) {
        while let Some(None) = self.entries.last() {
            self.entries.pop();
            self.free.remove(&(self.entries.len() as u32));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind() -> Rc<SlotBinding> {
        Rc::new(SlotBinding::new())
    }

    #[test]
    fn allocate_reuses_lowest_hole() {
        let mut store = SlotStore::with_capacity(4);
        let (a, b, c) = (bind(), bind(), bind());
        store.allocate(10, &a);
        store.allocate(20, &b);
        store.allocate(30, &c);
        assert_eq!(store.release(b.index()), Some(20));
        assert_eq!(store.release(a.index()), Some(10));
        assert!(store.has_holes());

        let d = bind();
        assert_eq!(store.allocate(40, &d), SlotIndex(0));
        assert_eq!(*store.get(SlotIndex(0)), 40);
        assert_eq!(store.live(), 2);
    }

    #[test]
    fn releasing_tail_trims_trailing_holes() {
        let mut store = SlotStore::default();
        let (a, b, c) = (bind(), bind(), bind());
        store.allocate(1, &a);
        store.allocate(2, &b);
        store.allocate(3, &c);
        store.release(b.index());
        store.release(c.index());
        assert_eq!(store.span(), 1);
        assert!(!store.has_holes());
    }

    #[test]
    fn defragment_repoints_moved_owner() {
        let mut store = SlotStore::default();
        let (a, b, c) = (bind(), bind(), bind());
        store.allocate('a', &a);
        store.allocate('b', &b);
        store.allocate('c', &c);
        store.release(a.index());

        assert_eq!(store.defragment(), 1);
        assert_eq!(c.index(), SlotIndex(0));
        assert!(store.is_owner(c.index(), &c));
        assert_eq!(*store.get(c.index()), 'c');
        assert_eq!(*store.get(b.index()), 'b');
        assert_eq!(store.span(), 2);
    }

    #[test]
    fn defragment_drops_orphans() {
        let mut store = SlotStore::default();
        let a = bind();
        store.allocate(1, &a);
        {
            let leaked = bind();
            store.allocate(2, &leaked);
        }
        store.release(a.index());
        assert_eq!(store.defragment(), 0);
        assert_eq!(store.live(), 0);
        assert_eq!(store.span(), 0);
    }

    #[test]
    fn transfer_moves_ownership_only() {
        let mut store = SlotStore::default();
        let (a, b) = (bind(), bind());
        let idx = store.allocate(5, &a);
        assert!(store.transfer(idx, &b));
        assert!(!store.is_owner(idx, &a));
        assert!(store.is_owner(idx, &b));
        assert_eq!(b.index(), idx);
        assert_eq!(*store.get(idx), 5);
        assert!(!store.transfer(SlotIndex(9), &a));
    }
}
