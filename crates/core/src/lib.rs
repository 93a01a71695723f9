#![warn(clippy::all, missing_docs)]

//! Core domain logic for the kurspad money-changer desk.
//!
//! This crate hosts the receipt and calculator documents, keypad
//! editing rules, focus addressing, undo history, rendering to text
//! cards, export, and exchange-rate lookup used by the terminal UI
//! and any future frontends.

pub mod card;
pub mod config;
pub mod document;
pub mod edit;
pub mod editor;
pub mod export;
pub mod focus;
pub mod format;
pub mod formula;
pub mod history;
pub mod keypad;
pub mod rates;

pub use config::AppConfig;
pub use document::{
    CalcItem, CalculatorNote, CompanyProfile, LineItem, ReceiptData, TransactionType,
};
pub use editor::{Cleared, Editor, KeyOutcome};
pub use export::{Artifact, Background, ExportError, ExportOptions};
pub use focus::{CalcField, CalcFocus, Focus, ReceiptField, ReceiptFocus, ViewMode};
pub use history::History;
pub use keypad::{Key, Operator, KEYPAD_GRID};
pub use rates::{RateBook, RateClient, RateEvent, RateQuote, RateSheet, RateSource};
