//! The editor state machine.
//!
//! [`Editor`] owns both documents, the mode-tagged focus and the receipt
//! history, and is the only writer to any of them. The front-end feeds it
//! keypad tokens and selection intents and renders whatever it holds
//! afterwards. Every receipt mutation that changes the document lands in the
//! history; calculator edits never do.

use tracing::debug;

use crate::document::{CalculatorNote, CompanyProfile, ReceiptData};
use crate::edit;
use crate::focus::{CalcField, CalcFocus, Focus, ReceiptField, ReceiptFocus, ViewMode};
use crate::history::History;
use crate::keypad::Key;

/// What a keypad token did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Token was rejected or nothing was focused.
    Ignored,
    /// Focus moved (or clamped in place).
    Moved,
    /// A document changed.
    Edited,
}

/// Which document a clear wiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleared {
    /// The receipt was reset (committed to history).
    Receipt,
    /// The calculator note was reset.
    Calculator,
}

/// Dual-mode document editor with focus routing and bounded undo.
pub struct Editor {
    mode: ViewMode,
    focus: Option<Focus>,
    receipt: ReceiptData,
    note: CalculatorNote,
    history: History,
}

impl Editor {
    /// Editor in receipt mode with a fresh receipt, blank note and the
    /// initial snapshot already in history. Focus sits on the first
    /// currency cell.
    pub fn new(company: CompanyProfile) -> Self {
        let receipt = ReceiptData::new(company);
        let history = History::new(receipt.clone());
        Self {
            mode: ViewMode::Receipt,
            focus: Some(Focus::Receipt(ReceiptFocus::entry())),
            receipt,
            note: CalculatorNote::new(),
            history,
        }
    }

    /// Current view mode.
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Current focus, `None` while suspended.
    pub fn focus(&self) -> Option<Focus> {
        self.focus
    }

    /// The receipt document.
    pub fn receipt(&self) -> &ReceiptData {
        &self.receipt
    }

    /// The calculator note.
    pub fn note(&self) -> &CalculatorNote {
        &self.note
    }

    /// Whether undo is available right now (receipt mode only).
    pub fn can_undo(&self) -> bool {
        self.mode == ViewMode::Receipt && self.history.can_undo()
    }

    /// Whether redo is available right now (receipt mode only).
    pub fn can_redo(&self) -> bool {
        self.mode == ViewMode::Receipt && self.history.can_redo()
    }

    /// Route one keypad token to the focused field.
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        let Some(focus) = self.focus else {
            return KeyOutcome::Ignored;
        };
        match focus {
            Focus::Receipt(focus) => self.receipt_key(focus, key),
            Focus::Calculator(focus) => self.calc_key(focus, key),
        }
    }

    fn receipt_key(&mut self, focus: ReceiptFocus, key: Key) -> KeyOutcome {
        match key {
            Key::Next => {
                self.focus = Some(Focus::Receipt(focus.next()));
                KeyOutcome::Moved
            }
            Key::Enter => {
                self.focus = Some(Focus::Receipt(focus.enter()));
                KeyOutcome::Moved
            }
            Key::Prev => {
                self.focus = Some(Focus::Receipt(focus.prev()));
                KeyOutcome::Moved
            }
            other => {
                let item = &mut self.receipt.items[focus.row];
                let changed = match focus.field {
                    ReceiptField::Currency => edit::edit_currency(&mut item.currency, other),
                    ReceiptField::Amount => edit::edit_numeric(&mut item.amount, other),
                    ReceiptField::Rate => edit::edit_numeric(&mut item.rate, other),
                };
                if changed {
                    self.history.commit(self.receipt.clone());
                    KeyOutcome::Edited
                } else {
                    KeyOutcome::Ignored
                }
            }
        }
    }

    fn calc_key(&mut self, focus: CalcFocus, key: Key) -> KeyOutcome {
        match key {
            Key::Next => {
                self.focus = Some(Focus::Calculator(focus.next()));
                KeyOutcome::Moved
            }
            Key::Enter => {
                self.focus = Some(Focus::Calculator(focus.enter()));
                KeyOutcome::Moved
            }
            Key::Prev => {
                self.focus = Some(Focus::Calculator(focus.prev()));
                KeyOutcome::Moved
            }
            other => {
                let changed = match focus {
                    CalcFocus::Title => edit::edit_title(&mut self.note.title, other),
                    CalcFocus::Cell {
                        row,
                        field: CalcField::Label,
                    } => edit::edit_label(&mut self.note.items[row].label, other),
                    CalcFocus::Cell {
                        row,
                        field: CalcField::Formula,
                    } => edit::edit_formula(&mut self.note.items[row].formula, other),
                };
                if changed {
                    KeyOutcome::Edited
                } else {
                    KeyOutcome::Ignored
                }
            }
        }
    }

    /// Focus a receipt cell directly (renderer click). Only sensible while
    /// in receipt mode; the row is clamped into range.
    pub fn select_receipt_field(&mut self, row: usize, field: ReceiptField) {
        debug_assert_eq!(self.mode, ViewMode::Receipt);
        let row = row.min(self.receipt.items.len() - 1);
        self.focus = Some(Focus::Receipt(ReceiptFocus { row, field }));
    }

    /// Focus a calculator cell or the title directly (renderer click).
    pub fn select_calc_field(&mut self, focus: CalcFocus) {
        debug_assert_eq!(self.mode, ViewMode::Calculator);
        let clamped = match focus {
            CalcFocus::Cell { row, field } => CalcFocus::Cell {
                row: row.min(self.note.items.len() - 1),
                field,
            },
            title => title,
        };
        self.focus = Some(Focus::Calculator(clamped));
    }

    /// Flip between receipt and calculator. Both documents survive; focus
    /// jumps to the new mode's canonical entry point.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.focus = Some(Focus::entry(self.mode));
        debug!(mode = self.mode.label(), "switched view mode");
    }

    /// Clear whichever document is on screen. Receipt clears are committed;
    /// calculator clears are not historied at all.
    pub fn clear(&mut self) -> Cleared {
        match self.mode {
            ViewMode::Receipt => {
                self.receipt = self.receipt.cleared();
                self.history.commit(self.receipt.clone());
                self.focus = Some(Focus::Receipt(ReceiptFocus::entry()));
                debug!("receipt cleared");
                Cleared::Receipt
            }
            ViewMode::Calculator => {
                self.note = CalculatorNote::new();
                self.focus = Some(Focus::Calculator(CalcFocus::entry()));
                debug!("calculator cleared");
                Cleared::Calculator
            }
        }
    }

    /// Flip the receipt between sell and buy, committing the change.
    /// Ignored outside receipt mode.
    pub fn toggle_kind(&mut self) -> bool {
        if self.mode != ViewMode::Receipt {
            return false;
        }
        self.receipt.kind = self.receipt.kind.toggled();
        self.history.commit(self.receipt.clone());
        true
    }

    /// Replace the customer name/address block as one committed mutation.
    pub fn set_customer_details(&mut self, name: String, address: String) {
        self.receipt.customer_name = name;
        self.receipt.customer_address = address;
        self.history.commit(self.receipt.clone());
    }

    /// Step the receipt back one snapshot. No-op outside receipt mode or at
    /// the oldest state.
    pub fn undo(&mut self) -> bool {
        if self.mode != ViewMode::Receipt {
            return false;
        }
        match self.history.undo() {
            Some(snapshot) => {
                self.receipt = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Step the receipt forward one snapshot. No-op outside receipt mode or
    /// at the newest state.
    pub fn redo(&mut self) -> bool {
        if self.mode != ViewMode::Receipt {
            return false;
        }
        match self.history.redo() {
            Some(snapshot) => {
                self.receipt = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Suspend focus for the duration of an export capture.
    pub fn take_focus(&mut self) -> Option<Focus> {
        self.focus.take()
    }

    /// Restore focus suspended by [`Editor::take_focus`].
    pub fn restore_focus(&mut self, focus: Option<Focus>) {
        self.focus = focus;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TransactionType;
    use crate::keypad::Operator;

    fn editor() -> Editor {
        Editor::new(CompanyProfile::default())
    }

    fn type_keys(editor: &mut Editor, keys: &[Key]) {
        for key in keys {
            editor.handle_key(*key);
        }
    }

    #[test]
    fn typing_into_amount_commits_each_change() {
        let mut editor = editor();
        editor.handle_key(Key::Next); // currency -> amount
        type_keys(&mut editor, &[Key::Digit(1), Key::Digit(5), Key::Digit(0)]);
        assert_eq!(editor.receipt().items[0].amount, "150");

        assert!(editor.undo());
        assert_eq!(editor.receipt().items[0].amount, "15");
        assert!(editor.undo());
        assert_eq!(editor.receipt().items[0].amount, "1");
        assert!(editor.redo());
        assert_eq!(editor.receipt().items[0].amount, "15");
    }

    #[test]
    fn rejected_tokens_do_not_touch_history() {
        let mut editor = editor();
        editor.handle_key(Key::Next);
        assert_eq!(editor.handle_key(Key::Digit(5)), KeyOutcome::Edited);
        assert_eq!(editor.handle_key(Key::Op(Operator::Add)), KeyOutcome::Ignored);
        assert_eq!(editor.handle_key(Key::Char('x')), KeyOutcome::Ignored);
        assert_eq!(editor.receipt().items[0].amount, "5");

        assert!(editor.undo());
        assert_eq!(editor.receipt().items[0].amount, "");
        assert!(!editor.can_undo());
    }

    #[test]
    fn navigation_never_commits() {
        let mut editor = editor();
        for _ in 0..10 {
            editor.handle_key(Key::Next);
            editor.handle_key(Key::Prev);
            editor.handle_key(Key::Enter);
        }
        assert!(!editor.can_undo());
    }

    #[test]
    fn currency_typing_uppercases() {
        let mut editor = editor();
        type_keys(&mut editor, &[Key::Char('u'), Key::Char('s'), Key::Char('d')]);
        assert_eq!(editor.receipt().items[0].currency, "USD");
    }

    #[test]
    fn clear_receipt_is_one_undoable_commit() {
        let mut editor = editor();
        editor.handle_key(Key::Next);
        type_keys(&mut editor, &[Key::Digit(4), Key::Digit(2)]);
        editor.toggle_kind();
        assert_eq!(editor.receipt().kind, TransactionType::Buy);

        assert_eq!(editor.clear(), Cleared::Receipt);
        assert_eq!(editor.receipt().items[0].amount, "");
        assert_eq!(editor.receipt().kind, TransactionType::Buy);
        assert_eq!(
            editor.focus(),
            Some(Focus::Receipt(ReceiptFocus::entry()))
        );

        assert!(editor.undo());
        assert_eq!(editor.receipt().items[0].amount, "42");
    }

    #[test]
    fn clear_calculator_skips_history_and_focuses_title() {
        let mut editor = editor();
        editor.handle_key(Key::Digit(9)); // receipt edit, one commit
        editor.toggle_mode();
        type_keys(&mut editor, &[Key::Char('a')]); // title edit
        assert_eq!(editor.note().title, "A");

        assert_eq!(editor.clear(), Cleared::Calculator);
        assert_eq!(editor.note().title, "");
        assert_eq!(editor.focus(), Some(Focus::Calculator(CalcFocus::Title)));

        editor.toggle_mode();
        assert!(editor.undo());
        assert!(!editor.can_undo(), "calculator ops must not add snapshots");
    }

    #[test]
    fn calculator_edits_are_never_historied() {
        let mut editor = editor();
        editor.toggle_mode();
        type_keys(
            &mut editor,
            &[
                Key::Char('f'),
                Key::Next,
                Key::Char('x'),
                Key::Next,
                Key::Digit(2),
                Key::Op(Operator::Multiply),
                Key::Digit(3),
            ],
        );
        assert_eq!(editor.note().title, "F");
        assert_eq!(editor.note().items[0].label, "X");
        assert_eq!(editor.note().items[0].formula, "2*3");

        editor.toggle_mode();
        assert!(!editor.can_undo());
    }

    #[test]
    fn undo_redo_are_noops_in_calculator_mode() {
        let mut editor = editor();
        editor.handle_key(Key::Digit(1));
        editor.toggle_mode();
        assert!(!editor.undo());
        assert!(!editor.redo());
        assert!(!editor.can_undo());
        editor.toggle_mode();
        assert!(editor.can_undo());
    }

    #[test]
    fn double_toggle_lands_on_entry_focus_not_previous_position() {
        let mut editor = editor();
        type_keys(&mut editor, &[Key::Next, Key::Next, Key::Next]); // row 1 currency
        editor.toggle_mode();
        assert_eq!(editor.focus(), Some(Focus::Calculator(CalcFocus::Title)));
        editor.toggle_mode();
        assert_eq!(
            editor.focus(),
            Some(Focus::Receipt(ReceiptFocus::entry()))
        );
    }

    #[test]
    fn select_field_is_unconditional() {
        let mut editor = editor();
        editor.select_receipt_field(4, ReceiptField::Rate);
        assert_eq!(
            editor.focus(),
            Some(Focus::Receipt(ReceiptFocus {
                row: 4,
                field: ReceiptField::Rate
            }))
        );
        editor.toggle_mode();
        editor.select_calc_field(CalcFocus::Cell {
            row: 7,
            field: CalcField::Formula,
        });
        assert_eq!(
            editor.focus(),
            Some(Focus::Calculator(CalcFocus::Cell {
                row: 7,
                field: CalcField::Formula
            }))
        );
    }

    #[test]
    fn customer_details_are_one_commit() {
        let mut editor = editor();
        editor.set_customer_details("BUDI".to_string(), "SANUR".to_string());
        assert_eq!(editor.receipt().customer_name, "BUDI");
        assert!(editor.undo());
        assert_eq!(editor.receipt().customer_name, "");
        assert!(!editor.can_undo());
    }

    #[test]
    fn kind_toggle_is_gated_to_receipt_mode() {
        let mut editor = editor();
        editor.toggle_mode();
        assert!(!editor.toggle_kind());
        assert_eq!(editor.receipt().kind, TransactionType::Sell);
        editor.toggle_mode();
        assert!(editor.toggle_kind());
        assert_eq!(editor.receipt().kind, TransactionType::Buy);
        assert!(editor.undo());
        assert_eq!(editor.receipt().kind, TransactionType::Sell);
    }

    #[test]
    fn suspended_focus_swallows_keys_and_restores() {
        let mut editor = editor();
        let stashed = editor.take_focus();
        assert_eq!(editor.focus(), None);
        assert_eq!(editor.handle_key(Key::Digit(5)), KeyOutcome::Ignored);
        assert_eq!(editor.receipt().items[0].currency, "");

        editor.restore_focus(stashed);
        assert_eq!(
            editor.focus(),
            Some(Focus::Receipt(ReceiptFocus::entry()))
        );
    }

    #[test]
    fn focus_always_matches_mode() {
        let mut editor = editor();
        let script = [
            Key::Digit(7),
            Key::Next,
            Key::Next,
            Key::Digit(2),
            Key::Prev,
            Key::Enter,
            Key::Op(Operator::Add),
            Key::Backspace,
            Key::DoubleZero,
            Key::Decimal,
            Key::Char('q'),
            Key::Prev,
            Key::Prev,
        ];
        for round in 0..4 {
            for key in script {
                editor.handle_key(key);
                let focus = editor.focus().expect("focus never lost");
                assert_eq!(focus.mode(), editor.mode(), "round {round}");
                match focus {
                    Focus::Receipt(f) => assert!(f.row < editor.receipt().items.len()),
                    Focus::Calculator(CalcFocus::Cell { row, .. }) => {
                        assert!(row < editor.note().items.len())
                    }
                    Focus::Calculator(CalcFocus::Title) => {}
                }
            }
            editor.toggle_mode();
        }
    }
}
