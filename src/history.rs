//! Undo/redo history
//!
//! Every change is recorded as a command holding the state before and after
//! it. Pushing a new state truncates any redo tail, like the annotation
//! list does when a new shape is drawn after an undo.

use std::fmt;

use chrono::{DateTime, Local};

/// What kind of edit produced a history command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionType {
    Add,
    Modify,
    Delete,
    ClearAll,
    Lock,
    Resize,
    Crop,
    Load,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Add => "add",
            ActionType::Modify => "modify",
            ActionType::Delete => "delete",
            ActionType::ClearAll => "clear all",
            ActionType::Lock => "lock",
            ActionType::Resize => "resize",
            ActionType::Crop => "crop",
            ActionType::Load => "load",
        };
        f.write_str(name)
    }
}

/// A recorded state transition
#[derive(Debug, Clone)]
pub struct HistoryCommand<S> {
    pub action: ActionType,
    pub timestamp: DateTime<Local>,
    pub previous: S,
    pub next: S,
}

/// Command-pattern undo/redo stack over a cloneable state
///
/// `cursor` counts the commands currently applied, so the last applied
/// command is `commands[cursor - 1]`.
#[derive(Debug, Clone)]
pub struct HistoryEngine<S> {
    current: S,
    commands: Vec<HistoryCommand<S>>,
    cursor: usize,
    limit: Option<usize>,
}

impl<S: Clone> HistoryEngine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            commands: Vec::new(),
            cursor: 0,
            limit: None,
        }
    }

    /// History that keeps at most `limit` commands, dropping the oldest
    pub fn with_limit(initial: S, limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new(initial)
        }
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    /// Record a transition from the current state to `next`
    pub fn push_state(&mut self, next: S, action: ActionType) {
        // Truncate any redo history
        self.commands.truncate(self.cursor);
        let previous = std::mem::replace(&mut self.current, next.clone());
        log::debug!("History push: {} (depth {})", action, self.cursor + 1);
        self.commands.push(HistoryCommand {
            action,
            timestamp: Local::now(),
            previous,
            next,
        });
        self.cursor = self.commands.len();

        if let Some(limit) = self.limit
            && self.commands.len() > limit
        {
            let excess = self.commands.len() - limit;
            self.commands.drain(..excess);
            self.cursor = self.commands.len();
        }
    }

    /// Restore the state before the last applied command
    pub fn undo(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.current = self.commands[self.cursor].previous.clone();
        true
    }

    /// Re-apply the next undone command
    pub fn redo(&mut self) -> bool {
        if self.cursor >= self.commands.len() {
            return false;
        }
        self.current = self.commands[self.cursor].next.clone();
        self.cursor += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Drop all history and start over from `initial`
    pub fn clear(&mut self, initial: S) {
        self.current = initial;
        self.commands.clear();
        self.cursor = 0;
    }

    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    pub fn redo_depth(&self) -> usize {
        self.commands.len() - self.cursor
    }

    pub fn commands(&self) -> &[HistoryCommand<S>] {
        &self.commands
    }

    /// Action of the command that the next `undo` would revert
    pub fn last_action(&self) -> Option<&ActionType> {
        self.cursor
            .checked_sub(1)
            .map(|i| &self.commands[i].action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_history() {
        let mut history = HistoryEngine::new(0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(*history.current(), 0);
    }

    #[test]
    fn test_undo_redo_single() {
        let mut history = HistoryEngine::new(vec![1]);
        history.push_state(vec![1, 2], ActionType::Add);
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert!(history.undo());
        assert_eq!(history.current(), &vec![1]);
        assert!(history.can_redo());

        assert!(history.redo());
        assert_eq!(history.current(), &vec![1, 2]);
        assert!(!history.redo());
    }

    #[test]
    fn test_push_truncates_redo() {
        let mut history = HistoryEngine::new(0);
        history.push_state(1, ActionType::Add);
        history.push_state(2, ActionType::Add);
        history.undo();
        history.push_state(3, ActionType::Modify);
        assert!(!history.can_redo());
        assert_eq!(history.commands().len(), 2);
        assert!(history.undo());
        assert_eq!(*history.current(), 1);
        assert_eq!(history.last_action(), Some(&ActionType::Add));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = HistoryEngine::with_limit(0, 3);
        for i in 1..=5 {
            history.push_state(i, ActionType::Add);
        }
        assert_eq!(history.undo_depth(), 3);
        while history.undo() {}
        assert_eq!(*history.current(), 2);
    }

    #[test]
    fn test_clear_resets() {
        let mut history = HistoryEngine::new(0);
        history.push_state(1, ActionType::Add);
        history.clear(10);
        assert!(!history.can_undo());
        assert_eq!(*history.current(), 10);
    }

    proptest! {
        #[test]
        fn prop_undo_then_redo_restores_state(
            states in proptest::collection::vec(any::<i32>(), 1..20),
            back in 0usize..20,
        ) {
            let mut history = HistoryEngine::new(i32::MIN);
            for s in &states {
                history.push_state(*s, ActionType::Modify);
            }
            for _ in 0..back.min(states.len() - 1) {
                history.undo();
            }
            let before = *history.current();
            prop_assert!(history.undo());
            prop_assert!(history.redo());
            prop_assert_eq!(*history.current(), before);
        }
    }
}
