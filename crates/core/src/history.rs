//! Bounded linear undo/redo history for the receipt document.
//!
//! The history always holds at least one snapshot (the document as created)
//! and at most [`HISTORY_CAP`]. Committing while the cursor sits behind the
//! tail discards the redo branch first; committing at the cap evicts the
//! oldest snapshot. Snapshots are owned clones, never aliased with the live
//! document.

use crate::document::ReceiptData;

/// Maximum number of snapshots retained.
pub const HISTORY_CAP: usize = 50;

/// Linear snapshot history with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<ReceiptData>,
    cursor: usize,
}

impl History {
    /// History seeded with the initial document state.
    pub fn new(initial: ReceiptData) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// Record a new snapshot after the cursor, dropping any redo branch and
    /// evicting the oldest snapshot once the cap is reached. Committing a
    /// snapshot identical to the current one is a no-op.
    pub fn commit(&mut self, snapshot: ReceiptData) {
        if self.snapshots.get(self.cursor) == Some(&snapshot) {
            return;
        }
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > HISTORY_CAP {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step the cursor back and return the snapshot to install, or `None` at
    /// the oldest state.
    pub fn undo(&mut self) -> Option<&ReceiptData> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Step the cursor forward and return the snapshot to install, or `None`
    /// at the newest state.
    pub fn redo(&mut self) -> Option<&ReceiptData> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always `false`; the history keeps at least the seed snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Position of the active snapshot.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CompanyProfile;

    fn doc(marker: &str) -> ReceiptData {
        let mut data = ReceiptData::new(CompanyProfile::default());
        data.customer_name = marker.to_string();
        data
    }

    #[test]
    fn undo_then_redo_restores_snapshots() {
        let mut history = History::new(doc("a"));
        history.commit(doc("b"));
        history.commit(doc("c"));

        assert_eq!(history.undo().unwrap().customer_name, "b");
        assert_eq!(history.undo().unwrap().customer_name, "a");
        assert!(history.undo().is_none());
        assert_eq!(history.redo().unwrap().customer_name, "b");
        assert_eq!(history.redo().unwrap().customer_name, "c");
        assert!(history.redo().is_none());
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut history = History::new(doc("a"));
        history.commit(doc("b"));
        history.commit(doc("c"));
        history.undo();
        history.commit(doc("d"));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo().unwrap().customer_name, "b");
        assert_eq!(history.redo().unwrap().customer_name, "d");
    }

    #[test]
    fn cap_evicts_oldest_and_keeps_cursor_valid() {
        let mut history = History::new(doc("seed"));
        for i in 0..HISTORY_CAP + 10 {
            history.commit(doc(&format!("step-{i}")));
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history.cursor(), HISTORY_CAP - 1);

        // the seed and the earliest steps are gone
        let mut oldest = None;
        while let Some(snapshot) = history.undo() {
            oldest = Some(snapshot.customer_name.clone());
        }
        assert_eq!(oldest.as_deref(), Some("step-10"));
    }

    #[test]
    fn identical_snapshot_commit_is_a_noop() {
        let mut history = History::new(doc("a"));
        history.commit(doc("a"));
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn snapshots_are_independent_of_later_edits() {
        let mut live = doc("first");
        let mut history = History::new(live.clone());
        live.items[0].amount = "42".to_string();
        history.commit(live.clone());
        live.items[0].amount = "9999".to_string();

        let restored = history.undo().unwrap();
        assert_eq!(restored.items[0].amount, "");
        let redone = history.redo().unwrap();
        assert_eq!(redone.items[0].amount, "42");
    }
}
