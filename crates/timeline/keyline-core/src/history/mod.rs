//! Linear undo/redo history over [`Command`]s.
//!
//! Executing a new command drops the redo chain. The undo stack is bounded; once full, the
//! oldest entries are discarded first.

pub mod command;
pub mod commands;

use std::collections::VecDeque;

pub use command::{Command, CompositeCommand};
pub use commands::{
    AddLayerCommand, AddShapeCommand, ConvertToSymbolCommand, KeyframeCommand, KeyframeOp,
    LayerProperty, LayerPropertyCommand, MoveLayerCommand, RemoveLayerCommand,
    RemoveShapesCommand, SetTweenCommand, TransformChange, TransformShapesCommand,
};

use crate::config::Config;
use crate::document::Document;

#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_history: usize,
    /// Set while a command runs; nested execute/undo/redo calls are rejected.
    busy: bool,
}

/// Holds the busy flag for the duration of one command call and clears it on drop, so a
/// command that panics does not leave the history locked.
struct BusyGuard<'a>(&'a mut bool);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl History {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_history,
            busy: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_history)
    }

    /// Run a command and record it. Returns `false` if the history is busy or the command
    /// changed nothing; in both cases the stacks are left as they were.
    pub fn execute<C: Command + 'static>(&mut self, command: C, doc: &mut Document) -> bool {
        self.execute_boxed(Box::new(command), doc)
    }

    /// A command that panics is dropped; the history stays usable if the panic is caught.
    pub fn execute_boxed(&mut self, mut command: Box<dyn Command>, doc: &mut Document) -> bool {
        if self.busy {
            log::warn!("rejected nested execute of '{}'", command.description());
            return false;
        }
        let changed = {
            let _busy = BusyGuard::enter(&mut self.busy);
            command.execute(doc)
        };

        if !changed {
            log::debug!("'{}' changed nothing, not recorded", command.description());
            return false;
        }
        log::debug!("executed '{}'", command.description());
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        self.trim();
        true
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_history {
            if let Some(dropped) = self.undo_stack.pop_front() {
                log::trace!("history full, dropping '{}'", dropped.description());
            }
        }
    }

    pub fn undo(&mut self, doc: &mut Document) -> bool {
        if self.busy {
            return false;
        }
        let Some(mut command) = self.undo_stack.pop_back() else {
            return false;
        };
        {
            let _busy = BusyGuard::enter(&mut self.busy);
            command.undo(doc);
        }
        log::debug!("undid '{}'", command.description());
        self.redo_stack.push(command);
        true
    }

    pub fn redo(&mut self, doc: &mut Document) -> bool {
        if self.busy {
            return false;
        }
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };
        {
            let _busy = BusyGuard::enter(&mut self.busy);
            command.execute(doc);
        }
        log::debug!("redid '{}'", command.description());
        self.undo_stack.push_back(command);
        self.trim();
        true
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.busy && !self.undo_stack.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.busy && !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    /// Number of undoable entries.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Lower (or raise) the bound; excess oldest entries are dropped immediately.
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history;
        self.trim();
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    struct Explode;

    impl Command for Explode {
        fn execute(&mut self, _doc: &mut Document) -> bool {
            panic!("command failed mid-edit");
        }

        fn undo(&mut self, _doc: &mut Document) {}

        fn description(&self) -> String {
            "Explode".to_string()
        }
    }

    fn rect() -> Shape {
        Shape::rectangle(0.0, 0.0, 4.0, 4.0)
    }

    #[test]
    fn empty_history_does_nothing() {
        let mut doc = Document::new();
        let mut history = History::default();
        assert!(!history.undo(&mut doc));
        assert!(!history.redo(&mut doc));
        assert!(!history.can_undo());
        assert_eq!(history.max_history(), 100);
    }

    #[test]
    fn new_command_discards_redo_chain() {
        let mut doc = Document::new();
        let layer = doc.layers()[0].id;
        let mut history = History::default();
        history.execute(AddShapeCommand::new(layer, 1, rect()), &mut doc);
        history.execute(AddShapeCommand::new(layer, 1, rect()), &mut doc);
        assert!(history.undo(&mut doc));
        assert!(history.can_redo());
        assert_eq!(history.redo_description().as_deref(), Some("Add Shape"));

        history.execute(KeyframeCommand::insert(layer, 5), &mut doc);
        assert!(!history.can_redo());
        assert!(!history.redo(&mut doc));
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo_description().as_deref(), Some("Insert Keyframe"));
    }

    #[test]
    fn no_op_is_not_recorded() {
        let mut doc = Document::new();
        let layer = doc.layers()[0].id;
        let mut history = History::default();
        assert!(!history.execute(RemoveLayerCommand::new(layer), &mut doc));
        assert!(history.is_empty());
    }

    #[test]
    fn bound_drops_oldest() {
        let mut doc = Document::new();
        let layer = doc.layers()[0].id;
        let mut history = History::new(3);
        for _ in 0..5 {
            history.execute(AddShapeCommand::new(layer, 1, rect()), &mut doc);
        }
        assert_eq!(history.len(), 3);
        while history.undo(&mut doc) {}
        assert_eq!(doc.layers()[0].get_shapes_at_frame(1).len(), 2);

        history.set_max_history(1);
        assert_eq!(history.len(), 0);
        assert_eq!(history.redo_len(), 3);
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut doc = Document::new();
        let mut history = History::default();
        let add = AddLayerCommand::new(None);
        history.execute(add, &mut doc);
        let top = doc.layers()[0].id;
        history.execute(AddShapeCommand::new(top, 3, rect()), &mut doc);
        history.execute(KeyframeCommand::insert(top, 9), &mut doc);
        let after = doc.to_json().unwrap();

        while history.undo(&mut doc) {}
        assert_eq!(doc.layers().len(), 1);
        while history.redo(&mut doc) {}
        assert_eq!(doc.to_json().unwrap(), after);
    }

    #[test]
    fn busy_history_rejects_every_call() {
        let mut doc = Document::new();
        let layer = doc.layers()[0].id;
        let mut history = History::default();
        history.execute(AddShapeCommand::new(layer, 1, rect()), &mut doc);
        history.undo(&mut doc);

        history.busy = true;
        assert!(!history.execute(AddShapeCommand::new(layer, 1, rect()), &mut doc));
        assert!(!history.undo(&mut doc));
        assert!(!history.redo(&mut doc));
        assert!(!history.can_redo());
        assert_eq!(history.redo_len(), 1);
    }

    #[test]
    fn panicking_command_releases_busy_flag() {
        let mut doc = Document::new();
        let layer = doc.layers()[0].id;
        let mut history = History::default();

        let outcome = catch_unwind(AssertUnwindSafe(|| history.execute(Explode, &mut doc)));
        assert!(outcome.is_err());
        assert!(!history.is_busy());
        assert!(history.is_empty());

        assert!(history.execute(AddShapeCommand::new(layer, 1, rect()), &mut doc));
        assert!(history.undo(&mut doc));
        assert!(history.redo(&mut doc));
    }
}
