//! Undo/redo history
//!
//! Each editor tab keeps its own pair of bounded snapshot stacks. A snapshot
//! is recorded before every committing operation (save, add, delete, rename,
//! reload); undo exchanges the live state with the top of the undo stack and
//! pushes what was live onto the redo stack, so repeated undo/redo walks the
//! committed states in both directions.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::hash::Hash;

struct Stacks<S> {
    undo: VecDeque<S>,
    redo: VecDeque<S>,
}

impl<S> Default for Stacks<S> {
    fn default() -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
        }
    }
}

/// Per-scope undo/redo stacks, bounded to `limit` entries each.
pub struct History<K, S> {
    limit: usize,
    scopes: HashMap<K, Stacks<S>>,
}

impl<K: Eq + Hash + Copy, S> History<K, S> {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            scopes: HashMap::new(),
        }
    }

    /// Change the bound; existing stacks lose their oldest entries.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        for stacks in self.scopes.values_mut() {
            while stacks.undo.len() > self.limit {
                stacks.undo.pop_front();
            }
            while stacks.redo.len() > self.limit {
                stacks.redo.pop_front();
            }
        }
    }

    /// Record the state that is about to be replaced. Clears the redo stack:
    /// a new edit forks the timeline.
    pub fn record(&mut self, scope: K, snapshot: S) {
        let stacks = self.scopes.entry(scope).or_default();
        stacks.undo.push_back(snapshot);
        if stacks.undo.len() > self.limit {
            stacks.undo.pop_front();
        }
        stacks.redo.clear();
    }

    /// Exchange `current` with the most recent recorded state.
    pub fn undo(&mut self, scope: K, current: S) -> Option<S> {
        let stacks = self.scopes.entry(scope).or_default();
        let snapshot = stacks.undo.pop_back()?;
        stacks.redo.push_back(current);
        if stacks.redo.len() > self.limit {
            stacks.redo.pop_front();
        }
        Some(snapshot)
    }

    /// Exchange `current` with the most recently undone state.
    pub fn redo(&mut self, scope: K, current: S) -> Option<S> {
        let stacks = self.scopes.entry(scope).or_default();
        let snapshot = stacks.redo.pop_back()?;
        stacks.undo.push_back(current);
        if stacks.undo.len() > self.limit {
            stacks.undo.pop_front();
        }
        Some(snapshot)
    }

    pub fn can_undo(&self, scope: K) -> bool {
        self.scopes
            .get(&scope)
            .is_some_and(|s| !s.undo.is_empty())
    }

    pub fn can_redo(&self, scope: K) -> bool {
        self.scopes
            .get(&scope)
            .is_some_and(|s| !s.redo.is_empty())
    }

    /// Drop both stacks for a scope, e.g. after the backing file was reloaded
    /// from an external change.
    pub fn clear(&mut self, scope: K) {
        self.scopes.remove(&scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut history: History<&str, i32> = History::new(10);
        history.record("tab", 1);
        history.record("tab", 2);

        // live state is 3; undo twice, redo once
        assert_eq!(history.undo("tab", 3), Some(2));
        assert_eq!(history.undo("tab", 2), Some(1));
        assert!(!history.can_undo("tab"));
        assert_eq!(history.redo("tab", 1), Some(2));
        assert_eq!(history.redo("tab", 2), Some(3));
        assert!(!history.can_redo("tab"));
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history: History<&str, i32> = History::new(10);
        history.record("tab", 1);
        assert_eq!(history.undo("tab", 2), Some(1));
        assert!(history.can_redo("tab"));

        history.record("tab", 1);
        assert!(!history.can_redo("tab"));
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut history: History<&str, i32> = History::new(10);
        history.record("a", 1);
        assert!(history.can_undo("a"));
        assert!(!history.can_undo("b"));
        history.clear("a");
        assert!(!history.can_undo("a"));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history: History<&str, i32> = History::new(3);
        for n in 0..10 {
            history.record("tab", n);
        }
        assert_eq!(history.undo("tab", 10), Some(9));
        assert_eq!(history.undo("tab", 9), Some(8));
        assert_eq!(history.undo("tab", 8), Some(7));
        assert!(!history.can_undo("tab"));
    }

    #[test]
    fn test_set_limit_truncates() {
        let mut history: History<&str, i32> = History::new(10);
        for n in 0..5 {
            history.record("tab", n);
        }
        history.set_limit(2);
        assert_eq!(history.undo("tab", 5), Some(4));
        assert_eq!(history.undo("tab", 4), Some(3));
        assert!(!history.can_undo("tab"));
    }
}
