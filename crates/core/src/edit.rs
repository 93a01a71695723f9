//! Pure field mutators.
//!
//! Each function applies one keypad token to one field value and reports
//! whether the value actually changed. Rejected tokens leave the value
//! untouched and return `false`; the caller uses that to decide whether a
//! history commit is due.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::keypad::Key;

/// Maximum length of a currency code.
pub const CURRENCY_MAX: usize = 3;

/// Maximum number of fraction digits in an amount or rate.
pub const FRACTION_MAX: usize = 2;

static NUMERIC_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d*(\.\d{0,2})?$").expect("invalid numeric grammar"));

/// Whether a value satisfies the numeric-string invariant
/// (empty, or `-?\d*(\.\d{0,2})?`).
pub fn is_numeric_string(value: &str) -> bool {
    NUMERIC_STRING.is_match(value)
}

/// Currency code editor: backspace truncates, anything with text appends
/// uppercased while the code stays under [`CURRENCY_MAX`] characters.
pub fn edit_currency(value: &mut String, key: Key) -> bool {
    match key {
        Key::Backspace => value.pop().is_some(),
        other => {
            let Some(text) = other.text() else {
                return false;
            };
            let mut changed = false;
            for ch in text.chars() {
                for up in ch.to_uppercase() {
                    if value.chars().count() >= CURRENCY_MAX {
                        return changed;
                    }
                    value.push(up);
                    changed = true;
                }
            }
            changed
        }
    }
}

/// Amount/rate editor over numeric-strings.
///
/// Backspace truncates. `00` appends two zeros, shrinking to however many
/// fraction digits still fit once a decimal point is present. `.` is accepted
/// only once; on an empty value it produces `0.`. Digits append unless the
/// fraction already holds [`FRACTION_MAX`] digits. Every other token is
/// rejected.
pub fn edit_numeric(value: &mut String, key: Key) -> bool {
    match key {
        Key::Backspace => value.pop().is_some(),
        Key::DoubleZero => match fraction_len(value) {
            None => {
                value.push_str("00");
                true
            }
            Some(0) => {
                value.push_str("00");
                true
            }
            Some(1) => {
                value.push('0');
                true
            }
            Some(_) => false,
        },
        Key::Decimal => {
            if value.contains('.') {
                false
            } else if value.is_empty() {
                value.push_str("0.");
                true
            } else {
                value.push('.');
                true
            }
        }
        Key::Digit(d) => {
            let room = match fraction_len(value) {
                None => true,
                Some(len) => len < FRACTION_MAX,
            };
            if room {
                value.push(char::from(b'0' + d.min(9)));
                true
            } else {
                false
            }
        }
        _ => false,
    }
}

/// Note title editor: backspace truncates, any text token appends uppercased.
pub fn edit_title(value: &mut String, key: Key) -> bool {
    match key {
        Key::Backspace => value.pop().is_some(),
        other => match other.text() {
            Some(text) => {
                value.extend(text.chars().flat_map(char::to_uppercase));
                true
            }
            None => false,
        },
    }
}

/// Row label editor: like the title, but arithmetic operators are dropped.
pub fn edit_label(value: &mut String, key: Key) -> bool {
    if matches!(key, Key::Op(_)) {
        return false;
    }
    edit_title(value, key)
}

/// Formula editor: backspace truncates, every text token appends verbatim.
/// Validity is the evaluator's problem.
pub fn edit_formula(value: &mut String, key: Key) -> bool {
    match key {
        Key::Backspace => value.pop().is_some(),
        other => match other.text() {
            Some(text) => {
                value.push_str(&text);
                true
            }
            None => false,
        },
    }
}

/// Number of digits after the decimal point, or `None` without one.
fn fraction_len(value: &str) -> Option<usize> {
    value.find('.').map(|dot| value.len() - dot - 1)
}
