//! Receipt and calculator-note documents.
//!
//! Both documents live purely in memory. A receipt always carries exactly
//! [`RECEIPT_ROWS`] line items and a note exactly [`CALC_ROWS`] rows; rows are
//! cleared in place, never added or removed.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Number of line items on a receipt.
pub const RECEIPT_ROWS: usize = 7;

/// Number of rows on a calculator note.
pub const CALC_ROWS: usize = 10;

/// Whether the receipt documents a sell or a buy transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Customer sells foreign currency to the counter.
    Sell,
    /// Customer buys foreign currency from the counter.
    Buy,
}

impl TransactionType {
    /// Display label as printed on the receipt.
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Sell => "SELL",
            TransactionType::Buy => "BUY",
        }
    }

    /// The other transaction type.
    pub fn toggled(self) -> Self {
        match self {
            TransactionType::Sell => TransactionType::Buy,
            TransactionType::Buy => TransactionType::Sell,
        }
    }
}

/// Fixed company header printed on every receipt.
///
/// Seeded from configuration at startup and never edited through the keypad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Company name, first header line.
    pub name: String,
    /// Second header line, typically the licence wording.
    pub tagline: String,
    /// Street address block.
    pub address: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "KURSPAD EXCHANGE".to_string(),
            tagline: "Authorized Money Changer".to_string(),
            address: "Jl. Melawai Raya No. 1, Jakarta".to_string(),
        }
    }
}

/// One currency row on the receipt.
///
/// `amount` and `rate` hold the raw keypad input: empty, or a string matching
/// `-?\d*(\.\d{0,2})?`. They are parsed only for display totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Stable row identifier.
    pub id: String,
    /// Currency code, at most three uppercase characters.
    pub currency: String,
    /// Foreign amount as entered.
    pub amount: String,
    /// Exchange rate as entered.
    pub rate: String,
}

impl LineItem {
    /// A blank row for the given position.
    pub fn blank(index: usize) -> Self {
        Self {
            id: format!("item-{index}"),
            currency: String::new(),
            amount: String::new(),
            rate: String::new(),
        }
    }

    /// Parsed amount, if the field holds a number.
    pub fn amount_value(&self) -> Option<f64> {
        self.amount.parse().ok()
    }

    /// Parsed rate, if the field holds a number.
    pub fn rate_value(&self) -> Option<f64> {
        self.rate.parse().ok()
    }

    /// Row total (`amount * rate`) when both fields parse.
    pub fn total(&self) -> Option<f64> {
        Some(self.amount_value()? * self.rate_value()?)
    }
}

/// One row on the calculator note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcItem {
    /// Stable row identifier.
    pub id: String,
    /// Free-form uppercase label; arithmetic operators are rejected on entry.
    pub label: String,
    /// Raw arithmetic expression, kept verbatim until evaluation.
    pub formula: String,
}

impl CalcItem {
    /// A blank row for the given position.
    pub fn blank(index: usize) -> Self {
        Self {
            id: format!("calc-{index}"),
            label: String::new(),
            formula: String::new(),
        }
    }
}

/// The receipt document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptData {
    /// Company header block.
    pub company: CompanyProfile,
    /// Customer name line, freely editable.
    pub customer_name: String,
    /// Customer address line, freely editable.
    pub customer_address: String,
    /// Device-local date, stamped `dd/mm/yy` at creation and reset only.
    pub date: String,
    /// Exactly [`RECEIPT_ROWS`] line items.
    pub items: Vec<LineItem>,
    /// Sell or buy.
    pub kind: TransactionType,
}

impl ReceiptData {
    /// Fresh sell receipt with blank rows and today's date.
    pub fn new(company: CompanyProfile) -> Self {
        Self {
            company,
            customer_name: String::new(),
            customer_address: String::new(),
            date: device_date(),
            items: blank_line_items(),
            kind: TransactionType::Sell,
        }
    }

    /// Cleared copy: blank rows, blank customer block, fresh date stamp.
    /// Company header and transaction type survive.
    pub fn cleared(&self) -> Self {
        Self {
            company: self.company.clone(),
            customer_name: String::new(),
            customer_address: String::new(),
            date: device_date(),
            items: blank_line_items(),
            kind: self.kind,
        }
    }

    /// Sum of all row totals; rows that do not parse contribute zero.
    pub fn grand_total(&self) -> f64 {
        self.items
            .iter()
            .filter_map(LineItem::total)
            .sum()
    }
}

/// The calculator-note document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorNote {
    /// Note title, uppercase.
    pub title: String,
    /// Exactly [`CALC_ROWS`] rows.
    pub items: Vec<CalcItem>,
}

impl CalculatorNote {
    /// Fresh note with blank title and rows.
    pub fn new() -> Self {
        Self {
            title: String::new(),
            items: blank_calc_items(),
        }
    }
}

impl Default for CalculatorNote {
    fn default() -> Self {
        Self::new()
    }
}

/// Today's date on the device clock, `dd/mm/yy`.
pub fn device_date() -> String {
    Local::now().format("%d/%m/%y").to_string()
}

fn blank_line_items() -> Vec<LineItem> {
    (0..RECEIPT_ROWS).map(LineItem::blank).collect()
}

fn blank_calc_items() -> Vec<CalcItem> {
    (0..CALC_ROWS).map(CalcItem::blank).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_receipt_has_fixed_row_count() {
        let receipt = ReceiptData::new(CompanyProfile::default());
        assert_eq!(receipt.items.len(), RECEIPT_ROWS);
        assert!(receipt.items.iter().all(|item| item.currency.is_empty()
            && item.amount.is_empty()
            && item.rate.is_empty()));
        assert_eq!(receipt.kind, TransactionType::Sell);
    }

    #[test]
    fn cleared_preserves_company_and_kind() {
        let mut receipt = ReceiptData::new(CompanyProfile::default());
        receipt.kind = TransactionType::Buy;
        receipt.customer_name = "BUDI".to_string();
        receipt.items[0].currency = "USD".to_string();
        receipt.items[0].amount = "100".to_string();

        let cleared = receipt.cleared();
        assert_eq!(cleared.company, receipt.company);
        assert_eq!(cleared.kind, TransactionType::Buy);
        assert!(cleared.customer_name.is_empty());
        assert!(cleared.items[0].currency.is_empty());
        assert_eq!(cleared.items.len(), RECEIPT_ROWS);
    }

    #[test]
    fn row_total_requires_both_fields() {
        let mut item = LineItem::blank(0);
        assert_eq!(item.total(), None);
        item.amount = "100".to_string();
        assert_eq!(item.total(), None);
        item.rate = "15500".to_string();
        assert_eq!(item.total(), Some(1_550_000.0));
    }

    #[test]
    fn grand_total_skips_unparseable_rows() {
        let mut receipt = ReceiptData::new(CompanyProfile::default());
        receipt.items[0].amount = "100".to_string();
        receipt.items[0].rate = "2".to_string();
        receipt.items[1].amount = "50".to_string();
        // rate empty, row contributes nothing
        receipt.items[2].amount = "1.5".to_string();
        receipt.items[2].rate = "4".to_string();
        assert_eq!(receipt.grand_total(), 206.0);
    }

    #[test]
    fn transaction_type_round_trips_as_uppercase() {
        let json = serde_json::to_string(&TransactionType::Sell).unwrap();
        assert_eq!(json, "\"SELL\"");
        let back: TransactionType = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(back, TransactionType::Buy);
    }
}
