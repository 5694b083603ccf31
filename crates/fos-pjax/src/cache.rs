//! Directional History Cache
//!
//! Keeps snapshots of previously rendered containers so back and forward
//! can be replayed without the network. Two bounded stacks mirror the
//! browser's session history on either side of the current entry.

use crate::state::StateId;
use std::collections::{HashMap, VecDeque};

/// History traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

impl Direction {
    /// Direction of a move from `current` to `target`
    pub fn between(current: StateId, target: StateId) -> Self {
        if target > current { Direction::Forward } else { Direction::Back }
    }
}

/// Snapshot cache keyed by state id
pub struct HistoryCache<S> {
    entries: HashMap<StateId, S>,
    back: VecDeque<StateId>,
    forward: VecDeque<StateId>,
    max_length: usize,
}

impl<S> HistoryCache<S> {
    /// Create a cache whose stacks hold at most `max_length` ids each
    pub fn new(max_length: usize) -> Self {
        Self {
            entries: HashMap::new(),
            back: VecDeque::new(),
            forward: VecDeque::new(),
            max_length,
        }
    }

    /// Store the snapshot of the page being left by a new navigation
    pub fn push(&mut self, id: StateId, snapshot: S) {
        self.unlink(id);
        self.entries.insert(id, snapshot);
        self.back.push_back(id);

        // A new branch makes the old forward history unreachable
        while let Some(stale) = self.forward.pop_front() {
            self.entries.remove(&stale);
        }

        self.trim();
    }

    /// Store the snapshot of the page being left by a history traversal.
    ///
    /// The left entry becomes reachable from the opposite direction. One id
    /// is popped from the stack being travelled; its entry is returned.
    pub fn pop(&mut self, direction: Direction, id: StateId, snapshot: S) -> Option<(StateId, S)> {
        self.unlink(id);
        self.entries.insert(id, snapshot);

        let (push_stack, pop_stack) = match direction {
            Direction::Forward => (&mut self.back, &mut self.forward),
            Direction::Back => (&mut self.forward, &mut self.back),
        };
        push_stack.push_back(id);
        let popped = pop_stack.pop_back();

        self.trim();

        popped.and_then(|popped| self.entries.remove(&popped).map(|s| (popped, s)))
    }

    /// Cached snapshot for `id`
    pub fn get(&self, id: StateId) -> Option<&S> {
        self.entries.get(&id)
    }

    /// Remove and return the snapshot for `id`
    pub fn take(&mut self, id: StateId) -> Option<S> {
        self.unlink(id);
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Ids reachable with the back button, oldest first
    pub fn back_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.back.iter().copied()
    }

    /// Ids reachable with the forward button, nearest last
    pub fn forward_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.forward.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every snapshot
    pub fn clear(&mut self) {
        self.entries.clear();
        self.back.clear();
        self.forward.clear();
    }

    /// Get cache stats
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            back_len: self.back.len(),
            forward_len: self.forward.len(),
            max_length: self.max_length,
        }
    }

    fn unlink(&mut self, id: StateId) {
        self.back.retain(|&i| i != id);
        self.forward.retain(|&i| i != id);
    }

    fn trim(&mut self) {
        for stack in [&mut self.back, &mut self.forward] {
            while stack.len() > self.max_length {
                if let Some(oldest) = stack.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub back_len: usize,
    pub forward_len: usize,
    pub max_length: usize,
}
