//! Sibling ordering
//!
//! Statuses within a project and tasks within a status carry an
//! `order_index`. The stores load the current sibling ids in display order
//! into an [`OrderedCollection`], apply the requested change, and write every
//! position back inside one transaction, so indices stay exactly `0..n-1`.

use std::collections::HashSet;
use std::hash::Hash;

/// Ordered list of sibling ids under one parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedCollection<T> {
    items: Vec<T>,
}

impl<T: Copy + Eq + Hash> OrderedCollection<T> {
    /// Wrap ids that are already in display order
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: dedup_last_wins(&items),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Apply a client-supplied order
    ///
    /// Requested ids come first, in request order (for a repeated id the last
    /// occurrence wins). Current siblings the request left out keep their
    /// relative order after them. Requested ids that were not yet siblings
    /// join the collection; callers validate them beforehand.
    pub fn reorder(&mut self, requested: &[T]) {
        if requested.is_empty() {
            return;
        }

        let mut ordered = dedup_last_wins(requested);
        let listed: HashSet<T> = ordered.iter().copied().collect();
        ordered.extend(self.items.iter().copied().filter(|id| !listed.contains(id)));
        self.items = ordered;
    }

    /// Remove an id, returning whether it was present
    pub fn remove(&mut self, item: &T) -> bool {
        let before = self.items.len();
        self.items.retain(|id| id != item);
        before != self.items.len()
    }

    /// Place `item` at `index`, clamping past-the-end indices to an append
    ///
    /// Returns the index the item ended up at.
    pub fn insert_at(&mut self, item: T, index: usize) -> usize {
        self.remove(&item);
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        index
    }

    pub fn push(&mut self, item: T) -> usize {
        self.insert_at(item, usize::MAX)
    }

    /// `(id, order_index)` pairs to persist
    pub fn positions(&self) -> impl Iterator<Item = (T, i64)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index as i64))
    }
}

/// Drop repeated ids, keeping each at the position of its last occurrence
pub fn dedup_last_wins<T: Copy + Eq + Hash>(ids: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut kept: Vec<T> = ids.iter().rev().copied().filter(|id| seen.insert(*id)).collect();
    kept.reverse();
    kept
}
