//! The reversible-mutation capability and command grouping.

use crate::document::Document;

/// A reversible document mutation.
///
/// `execute` must capture whatever it needs to reverse itself when it first runs, not when the
/// command is built: the state to capture does not exist yet at construction time. Running
/// `execute` again after `undo` (a redo) must reproduce the same document state every time, so
/// implementations re-derive entities by id rather than holding on to references.
pub trait Command {
    /// Apply the mutation. Returns `false` if nothing changed; such a command is not recorded.
    fn execute(&mut self, doc: &mut Document) -> bool;

    /// Reverse the last `execute`.
    fn undo(&mut self, doc: &mut Document);

    /// Human-readable label for menus ("Undo Add Layer").
    fn description(&self) -> String;
}

impl std::fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Command").field(&self.description()).finish()
    }
}

/// Runs children in order and undoes them in reverse.
///
/// Children that change nothing are skipped on undo. The composite counts as a change if any
/// child changed something.
#[derive(Debug)]
pub struct CompositeCommand {
    description: String,
    children: Vec<Box<dyn Command>>,
    applied: Vec<bool>,
}

impl CompositeCommand {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            children: Vec::new(),
            applied: Vec::new(),
        }
    }

    /// Builder-style append.
    pub fn with<C: Command + 'static>(mut self, command: C) -> Self {
        self.push(command);
        self
    }

    pub fn push<C: Command + 'static>(&mut self, command: C) {
        self.children.push(Box::new(command));
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Command for CompositeCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        self.applied = self
            .children
            .iter_mut()
            .map(|child| child.execute(doc))
            .collect();
        self.applied.iter().any(|applied| *applied)
    }

    fn undo(&mut self, doc: &mut Document) {
        for (child, applied) in self.children.iter_mut().zip(&self.applied).rev() {
            if *applied {
                child.undo(doc);
            }
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Probe {
        tag: &'static str,
        changes: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Command for Probe {
        fn execute(&mut self, _doc: &mut Document) -> bool {
            self.log.borrow_mut().push(format!("do {}", self.tag));
            self.changes
        }

        fn undo(&mut self, _doc: &mut Document) {
            self.log.borrow_mut().push(format!("undo {}", self.tag));
        }

        fn description(&self) -> String {
            self.tag.to_string()
        }
    }

    #[test]
    fn composite_unwinds_in_reverse() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe = |tag: &'static str, changes: bool| Probe {
            tag,
            changes,
            log: Rc::clone(&log),
        };
        let mut composite = CompositeCommand::new("Group")
            .with(probe("a", true))
            .with(probe("b", false))
            .with(probe("c", true));
        let mut doc = Document::new();

        assert!(composite.execute(&mut doc));
        composite.undo(&mut doc);
        assert_eq!(
            *log.borrow(),
            vec!["do a", "do b", "do c", "undo c", "undo a"]
        );
        assert_eq!(composite.description(), "Group");
    }

    #[test]
    fn empty_composite_changes_nothing() {
        let mut doc = Document::new();
        let mut composite = CompositeCommand::new("Nothing");
        assert!(composite.is_empty());
        assert!(!composite.execute(&mut doc));
    }
}
