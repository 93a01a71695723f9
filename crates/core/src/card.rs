//! Fixed-width text cards: the capture consumed by the export pipeline.
//!
//! Cards render either document into lines of exactly `width` characters so
//! the exporter can paint a uniform background behind them.

use crate::document::{CalculatorNote, ReceiptData};
use crate::format::{format_amount, format_integer, format_operand, format_total};
use crate::formula::{self, Segment};

/// Card width at scale 1.
pub const CARD_WIDTH: usize = 48;

const MIN_WIDTH: usize = 40;
const LABEL_COL: usize = 8;
const RESULT_COL: usize = 12;

/// Render the receipt as uniform-width text lines.
pub fn receipt_card(data: &ReceiptData, width: usize) -> Vec<String> {
    let width = width.max(MIN_WIDTH);
    let (curr, amount, rate, total) = receipt_columns(width);
    let mut lines = Vec::new();

    let kind_box = format!("[ {} ]", data.kind.label());
    let name_width = width.saturating_sub(kind_box.chars().count() + 1);
    lines.push(format!(
        "{} {kind_box}",
        fit_left(&data.company.name, name_width)
    ));
    lines.push(fit_left(&data.company.tagline, width));
    lines.push(fit_left(
        &format!("Head Office : {}", data.company.address),
        width,
    ));
    lines.push(fit_left("", width));

    let date_tag = format!("Date: {}", data.date);
    let name_line = format!("NAME    : {}", data.customer_name);
    lines.push(format!(
        "{} {date_tag}",
        fit_left(
            &name_line,
            width.saturating_sub(date_tag.chars().count() + 1)
        )
    ));
    lines.push(fit_left(
        &format!("ADDRESS : {}", data.customer_address),
        width,
    ));
    lines.push(fit_left("", width));

    let rule = format!(
        "+{}+{}+{}+{}+",
        "-".repeat(curr),
        "-".repeat(amount),
        "-".repeat(rate),
        "-".repeat(total)
    );
    lines.push(rule.clone());
    lines.push(format!(
        "|{}|{}|{}|{}|",
        fit_center("CURR", curr),
        fit_center("AMOUNT", amount),
        fit_center("RATE", rate),
        fit_center("TOTAL Rp.", total)
    ));
    lines.push(rule.clone());

    for item in &data.items {
        let row_total = item
            .total()
            .filter(|value| *value > 0.0)
            .map(format_total)
            .unwrap_or_default();
        lines.push(format!(
            "|{}|{} |{} |{} |",
            fit_center(&item.currency, curr),
            fit_right(&format_amount(&item.amount), amount - 1),
            fit_right(&format_amount(&item.rate), rate - 1),
            fit_right(&row_total, total - 1)
        ));
    }
    lines.push(rule);

    let left_span = curr + amount + rate + 2;
    lines.push(format!(
        "|{} |{} |",
        fit_right("GRAND TOTAL", left_span - 1),
        fit_right(&format_total(data.grand_total()), total - 1)
    ));
    lines.push(format!(
        "+{}+{}+",
        "-".repeat(left_span),
        "-".repeat(total)
    ));

    lines
}

/// Render the calculator note as uniform-width text lines.
pub fn calculator_card(note: &CalculatorNote, width: usize) -> Vec<String> {
    let width = width.max(MIN_WIDTH);
    let left = width - RESULT_COL - 1;
    let rule = format!("{}+{}", "-".repeat(left), "-".repeat(RESULT_COL));
    let mut lines = Vec::new();

    lines.push(format!(
        "{}|{}",
        fit_left(&note.title, left),
        fit_center("TOTAL", RESULT_COL)
    ));
    lines.push(rule.clone());

    let results: Vec<f64> = note
        .items
        .iter()
        .map(|item| formula::row_value(&item.formula))
        .collect();
    for (item, result) in note.items.iter().zip(&results) {
        let mut body = fit_left(&item.label, LABEL_COL);
        body.push(' ');
        body.push_str(&formula_text(&item.formula));
        lines.push(format!(
            "{}|{} ",
            fit_left(&body, left),
            fit_right(&result_text(*result, &item.formula), RESULT_COL - 1)
        ));
    }

    lines.push(rule);
    let grand: f64 = results.iter().sum();
    lines.push(format!(
        "{}|{} ",
        fit_right("GRAND TOTAL ", left),
        fit_right(&format_integer(grand), RESULT_COL - 1)
    ));

    lines
}

/// Display form of a raw formula: grouped operands, spaced operators, `---`
/// placeholder when empty.
pub fn formula_text(raw: &str) -> String {
    if raw.is_empty() {
        return "---".to_string();
    }
    let mut out = String::new();
    for segment in formula::segments(raw) {
        match segment {
            Segment::Operator(op) => {
                out.push(' ');
                out.push(op);
                out.push(' ');
            }
            Segment::Operand(text) => out.push_str(&format_operand(&text)),
        }
    }
    out
}

fn result_text(result: f64, raw_formula: &str) -> String {
    if raw_formula.is_empty() {
        return String::new();
    }
    if result < 0.0 {
        format!("- {}", format_integer(result.abs()))
    } else {
        format_integer(result)
    }
}

fn receipt_columns(width: usize) -> (usize, usize, usize, usize) {
    let curr = 5;
    let pool = width - curr - 5;
    let amount = pool * 3 / 10;
    let rate = pool * 3 / 10;
    (curr, amount, rate, pool - amount - rate)
}

fn fit_left(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

fn fit_right(text: &str, width: usize) -> String {
    let taken: String = text.chars().take(width).collect();
    let pad = width - taken.chars().count();
    format!("{}{taken}", " ".repeat(pad))
}

fn fit_center(text: &str, width: usize) -> String {
    let taken: String = text.chars().take(width).collect();
    let pad = width - taken.chars().count();
    let lead = pad / 2;
    format!("{}{taken}{}", " ".repeat(lead), " ".repeat(pad - lead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CompanyProfile, TransactionType};

    fn receipt() -> ReceiptData {
        let mut data = ReceiptData::new(CompanyProfile::default());
        data.customer_name = "BUDI".to_string();
        data.items[0].currency = "USD".to_string();
        data.items[0].amount = "100".to_string();
        data.items[0].rate = "15500".to_string();
        data
    }

    #[test]
    fn receipt_lines_share_one_width() {
        let lines = receipt_card(&receipt(), CARD_WIDTH);
        assert!(!lines.is_empty());
        for line in &lines {
            assert_eq!(line.chars().count(), CARD_WIDTH, "line {line:?}");
        }
    }

    #[test]
    fn receipt_card_carries_totals_and_kind() {
        let data = receipt();
        let text = receipt_card(&data, CARD_WIDTH).join("\n");
        assert!(text.contains("[ SELL ]"));
        assert!(text.contains("1.550.000,00"));
        assert!(text.contains("GRAND TOTAL"));
        assert!(text.contains("BUDI"));

        let mut buying = data;
        buying.kind = TransactionType::Buy;
        let text = receipt_card(&buying, CARD_WIDTH).join("\n");
        assert!(text.contains("[ BUY ]"));
    }

    #[test]
    fn empty_rows_show_no_row_total() {
        let data = ReceiptData::new(CompanyProfile::default());
        let text = receipt_card(&data, CARD_WIDTH).join("\n");
        // only the grand total row carries a formatted zero
        assert_eq!(text.matches("0,00").count(), 1);
    }

    #[test]
    fn calculator_lines_share_one_width() {
        let mut note = CalculatorNote::new();
        note.title = "TRIP".to_string();
        note.items[0].label = "FUEL".to_string();
        note.items[0].formula = "2*300000".to_string();
        note.items[1].formula = "5-8".to_string();
        let lines = calculator_card(&note, CARD_WIDTH);
        for line in &lines {
            assert_eq!(line.chars().count(), CARD_WIDTH, "line {line:?}");
        }
        let text = lines.join("\n");
        assert!(text.contains("TRIP"));
        assert!(text.contains("2 * 300.000"));
        assert!(text.contains("600.000"));
        assert!(text.contains("- 3"));
        assert!(text.contains("GRAND TOTAL"));
    }

    #[test]
    fn empty_formula_shows_placeholder_and_blank_result() {
        let note = CalculatorNote::new();
        let lines = calculator_card(&note, CARD_WIDTH);
        let row = &lines[2];
        assert!(row.contains("---"));
        assert!(row.ends_with(' '));
        // grand total of an empty note is zero
        assert!(lines.last().unwrap().contains('0'));
    }

    #[test]
    fn wider_cards_stay_uniform() {
        let lines = receipt_card(&receipt(), CARD_WIDTH * 2);
        for line in &lines {
            assert_eq!(line.chars().count(), CARD_WIDTH * 2);
        }
    }
}
