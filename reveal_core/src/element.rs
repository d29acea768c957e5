// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element identity and per-element side-table.
//!
//! The DOM owns reveal candidates; the controller only attaches transient
//! state to them. [`ElementStore`] is that side-table: slots addressed by
//! [`ElementId`] handles, recycled through a free list, with generation
//! counters so that a handle kept by a late callback cannot touch the slot's
//! next occupant.

use alloc::vec::Vec;
use core::fmt;

use crate::cascade::Cascade;
use crate::machine::VisibilityState;

/// A handle to a registered reveal candidate.
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after the element is unregistered and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ElementId {
    /// Returns the raw slot index. Hosts use it to index their own element
    /// tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({}@gen{})", self.idx, self.generation)
    }
}

/// Everything the controller tracks for one registered element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementRecord {
    /// Hysteresis and debounce state.
    pub visibility: VisibilityState,
    /// Cascade stagger state.
    pub cascade: Cascade,
    /// Whether the active marker is currently set on the element.
    pub active: bool,
    /// Whether the host's viewport watcher currently observes the element.
    pub observed: bool,
}

impl ElementRecord {
    fn new(cascade: bool) -> Self {
        Self {
            visibility: VisibilityState::new(),
            cascade: Cascade::new(cascade),
            active: false,
            observed: false,
        }
    }
}

/// Slot storage for [`ElementRecord`]s.
#[derive(Debug, Default)]
pub struct ElementStore {
    records: Vec<Option<ElementRecord>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl ElementStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a slot for a new element and returns its handle.
    pub fn insert(&mut self, cascade: bool) -> ElementId {
        let record = ElementRecord::new(cascade);
        let idx = if let Some(idx) = self.free_list.pop() {
            self.records[idx as usize] = Some(record);
            idx
        } else {
            let idx = u32::try_from(self.records.len()).unwrap_or(u32::MAX);
            debug_assert!(idx != u32::MAX, "element store exhausted");
            self.records.push(Some(record));
            self.generation.push(0);
            idx
        };
        ElementId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees the slot behind `id`, returning its final record.
    ///
    /// Returns `None` for stale handles.
    pub fn remove(&mut self, id: ElementId) -> Option<ElementRecord> {
        if !self.is_alive(id) {
            return None;
        }
        let record = self.records[id.idx as usize].take();
        // Bump generation so old handles immediately fail validation.
        self.generation[id.idx as usize] = self.generation[id.idx as usize].wrapping_add(1);
        self.free_list.push(id.idx);
        record
    }

    /// Returns whether the given handle refers to a live element.
    #[must_use]
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.generation.get(id.idx as usize) == Some(&id.generation)
            && self.records[id.idx as usize].is_some()
    }

    /// Returns the record for a live handle.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&ElementRecord> {
        if self.is_alive(id) {
            self.records[id.idx as usize].as_ref()
        } else {
            None
        }
    }

    /// Returns the mutable record for a live handle.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementRecord> {
        if self.is_alive(id) {
            self.records[id.idx as usize].as_mut()
        } else {
            None
        }
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len() - self.free_list.len()
    }

    /// Returns `true` if no element is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the handles of all live elements in slot order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.records
            .iter()
            .zip(&self.generation)
            .enumerate()
            .filter(|(_, (record, _))| record.is_some())
            .map(|(idx, (_, &generation))| ElementId {
                idx: u32::try_from(idx).unwrap_or(u32::MAX),
                generation,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut store = ElementStore::new();
        let a = store.insert(false);
        let b = store.insert(true);
        assert_ne!(a, b, "distinct handles");
        assert_eq!(store.len(), 2, "two live elements");
        assert!(store.get(b).is_some_and(|r| r.cascade.is_container()), "cascade flag kept");
        assert!(store.get(a).is_some_and(|r| !r.active), "starts inactive");
    }

    #[test]
    fn stale_handles_are_rejected_after_reuse() {
        let mut store = ElementStore::new();
        let a = store.insert(false);
        assert!(store.remove(a).is_some(), "first removal succeeds");
        assert!(store.remove(a).is_none(), "double removal is rejected");

        let b = store.insert(false);
        assert_eq!(a.index(), b.index(), "slot is recycled");
        assert_ne!(a.generation(), b.generation(), "generation bumped");
        assert!(!store.is_alive(a), "old handle is stale");
        assert!(store.get_mut(a).is_none(), "stale handle cannot mutate");
        assert!(store.is_alive(b), "new handle is live");
    }

    #[test]
    fn ids_skip_free_slots() {
        let mut store = ElementStore::new();
        let a = store.insert(false);
        let b = store.insert(false);
        let c = store.insert(false);
        store.remove(b);
        let ids: Vec<_> = store.ids().collect();
        assert_eq!(ids, [a, c], "only live handles");
        assert!(!store.is_empty(), "not empty");
    }

    #[test]
    fn debug_format() {
        let mut store = ElementStore::new();
        let a = store.insert(false);
        assert_eq!(alloc::format!("{a:?}"), "ElementId(0@gen0)", "debug output");
    }
}
