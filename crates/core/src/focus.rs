//! Field addressing: which editable cell currently receives keypad input.
//!
//! The two view modes have distinct focus spaces, so they get distinct types
//! joined by [`Focus`]. Receipt focus walks a cyclic ring of
//! `7 rows x 3 fields = 21` positions; calculator focus walks `title` plus
//! `10 rows x 2 fields` and clamps at the bottom instead of wrapping.
//! All transitions are total; an impossible move simply returns the current
//! position.

use serde::{Deserialize, Serialize};

use crate::document::{CALC_ROWS, RECEIPT_ROWS};

/// Which document is on screen and receiving keypad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViewMode {
    /// The receipt form.
    Receipt,
    /// The calculator note.
    Calculator,
}

impl ViewMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Receipt => ViewMode::Calculator,
            ViewMode::Calculator => ViewMode::Receipt,
        }
    }

    /// Display label for the mode switch.
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Receipt => "RECEIPT",
            ViewMode::Calculator => "CALCULATOR",
        }
    }
}

/// Editable field within a receipt row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptField {
    /// Currency code cell.
    Currency,
    /// Foreign amount cell.
    Amount,
    /// Exchange rate cell.
    Rate,
}

/// Focused cell on the receipt: a row index and a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptFocus {
    /// Row index, `0..RECEIPT_ROWS`.
    pub row: usize,
    /// Field within the row.
    pub field: ReceiptField,
}

impl ReceiptFocus {
    /// Canonical entry point: first row, currency.
    pub fn entry() -> Self {
        Self {
            row: 0,
            field: ReceiptField::Currency,
        }
    }

    /// Forward along the ring: currency, amount, rate, then the next row's
    /// currency, wrapping from the last row back to the first.
    pub fn next(self) -> Self {
        match self.field {
            ReceiptField::Currency => Self {
                row: self.row,
                field: ReceiptField::Amount,
            },
            ReceiptField::Amount => Self {
                row: self.row,
                field: ReceiptField::Rate,
            },
            ReceiptField::Rate => Self {
                row: (self.row + 1) % RECEIPT_ROWS,
                field: ReceiptField::Currency,
            },
        }
    }

    /// Backward along the ring, wrapping from the first row's currency to the
    /// last row's rate.
    pub fn prev(self) -> Self {
        match self.field {
            ReceiptField::Rate => Self {
                row: self.row,
                field: ReceiptField::Amount,
            },
            ReceiptField::Amount => Self {
                row: self.row,
                field: ReceiptField::Currency,
            },
            ReceiptField::Currency => Self {
                row: (self.row + RECEIPT_ROWS - 1) % RECEIPT_ROWS,
                field: ReceiptField::Rate,
            },
        }
    }

    /// Enter behaves exactly like [`ReceiptFocus::next`].
    pub fn enter(self) -> Self {
        self.next()
    }
}

/// Editable field within a calculator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcField {
    /// Row label cell.
    Label,
    /// Formula cell.
    Formula,
}

/// Focused cell on the calculator note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcFocus {
    /// The note title, reachable only from row zero's label.
    Title,
    /// A row cell.
    Cell {
        /// Row index, `0..CALC_ROWS`.
        row: usize,
        /// Field within the row.
        field: CalcField,
    },
}

impl CalcFocus {
    /// Canonical entry point: the title.
    pub fn entry() -> Self {
        CalcFocus::Title
    }

    /// Forward: title to the first label, label to its formula, formula to the
    /// next row's label. Clamps at the last row instead of wrapping.
    pub fn next(self) -> Self {
        match self {
            CalcFocus::Title => CalcFocus::Cell {
                row: 0,
                field: CalcField::Label,
            },
            CalcFocus::Cell {
                row,
                field: CalcField::Label,
            } => CalcFocus::Cell {
                row,
                field: CalcField::Formula,
            },
            CalcFocus::Cell {
                row,
                field: CalcField::Formula,
            } if row + 1 < CALC_ROWS => CalcFocus::Cell {
                row: row + 1,
                field: CalcField::Label,
            },
            other => other,
        }
    }

    /// Backward: formula to its label, label to the previous row's formula,
    /// and row zero's label back to the title. The title itself stays put.
    pub fn prev(self) -> Self {
        match self {
            CalcFocus::Cell {
                row,
                field: CalcField::Formula,
            } => CalcFocus::Cell {
                row,
                field: CalcField::Label,
            },
            CalcFocus::Cell {
                row,
                field: CalcField::Label,
            } if row > 0 => CalcFocus::Cell {
                row: row - 1,
                field: CalcField::Formula,
            },
            CalcFocus::Cell {
                row: 0,
                field: CalcField::Label,
            } => CalcFocus::Title,
            other => other,
        }
    }

    /// Enter jumps a column: title to the first formula, otherwise down one
    /// row in the same field, clamped at the last row.
    pub fn enter(self) -> Self {
        match self {
            CalcFocus::Title => CalcFocus::Cell {
                row: 0,
                field: CalcField::Formula,
            },
            CalcFocus::Cell { row, field } if row + 1 < CALC_ROWS => {
                CalcFocus::Cell { row: row + 1, field }
            }
            other => other,
        }
    }
}

/// Mode-tagged focus. Invalid mode/field pairings are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// A receipt cell.
    Receipt(ReceiptFocus),
    /// A calculator cell or the title.
    Calculator(CalcFocus),
}

impl Focus {
    /// The mode this focus belongs to.
    pub fn mode(self) -> ViewMode {
        match self {
            Focus::Receipt(_) => ViewMode::Receipt,
            Focus::Calculator(_) => ViewMode::Calculator,
        }
    }

    /// Canonical entry focus for a mode.
    pub fn entry(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Receipt => Focus::Receipt(ReceiptFocus::entry()),
            ViewMode::Calculator => Focus::Calculator(CalcFocus::entry()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_ring_closes_after_twenty_one_steps() {
        let start = ReceiptFocus::entry();
        let mut focus = start;
        for step in 1..=RECEIPT_ROWS * 3 {
            focus = focus.next();
            if step < RECEIPT_ROWS * 3 {
                assert_ne!(focus, start, "ring closed early at step {step}");
            }
        }
        assert_eq!(focus, start);
    }

    #[test]
    fn receipt_prev_inverts_next_everywhere() {
        let mut focus = ReceiptFocus::entry();
        for _ in 0..RECEIPT_ROWS * 3 {
            assert_eq!(focus.next().prev(), focus);
            assert_eq!(focus.prev().next(), focus);
            focus = focus.next();
        }
    }

    #[test]
    fn receipt_wraps_both_directions() {
        let last_rate = ReceiptFocus {
            row: RECEIPT_ROWS - 1,
            field: ReceiptField::Rate,
        };
        assert_eq!(last_rate.next(), ReceiptFocus::entry());
        assert_eq!(ReceiptFocus::entry().prev(), last_rate);
    }

    #[test]
    fn calc_next_clamps_at_last_formula() {
        let bottom = CalcFocus::Cell {
            row: CALC_ROWS - 1,
            field: CalcField::Formula,
        };
        assert_eq!(bottom.next(), bottom);
        assert_eq!(bottom.next().next(), bottom);
    }

    #[test]
    fn calc_enter_clamps_at_last_row() {
        for field in [CalcField::Label, CalcField::Formula] {
            let bottom = CalcFocus::Cell {
                row: CALC_ROWS - 1,
                field,
            };
            assert_eq!(bottom.enter(), bottom);
        }
    }

    #[test]
    fn calc_title_is_a_boundary() {
        assert_eq!(CalcFocus::Title.prev(), CalcFocus::Title);
        assert_eq!(
            CalcFocus::Title.next(),
            CalcFocus::Cell {
                row: 0,
                field: CalcField::Label
            }
        );
        assert_eq!(
            CalcFocus::Title.enter(),
            CalcFocus::Cell {
                row: 0,
                field: CalcField::Formula
            }
        );
        let first_label = CalcFocus::Cell {
            row: 0,
            field: CalcField::Label,
        };
        assert_eq!(first_label.prev(), CalcFocus::Title);
    }

    #[test]
    fn calc_walk_covers_every_cell_once() {
        let mut focus = CalcFocus::Title;
        let mut seen = vec![focus];
        loop {
            let next = focus.next();
            if next == focus {
                break;
            }
            focus = next;
            seen.push(focus);
        }
        // title + label/formula per row
        assert_eq!(seen.len(), 1 + CALC_ROWS * 2);
    }

    #[test]
    fn mode_toggle_is_an_involution() {
        assert_eq!(ViewMode::Receipt.toggled().toggled(), ViewMode::Receipt);
        assert_eq!(Focus::entry(ViewMode::Calculator).mode(), ViewMode::Calculator);
    }
}
