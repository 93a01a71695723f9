//! Calculator formula evaluation.
//!
//! Formulas are stored verbatim; evaluation first strips everything outside
//! `0-9 . + - * /`, then parses with ordinary precedence (`*` and `/` bind
//! tighter than `+` and `-`, left associative) and an optional sign before a
//! literal. `++` and `--` sequences, unbalanced operators, multi-dot literals
//! and non-finite results (division by zero) are all malformed; a malformed
//! row displays as zero.

/// Strip every character a formula may not contain.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-' | '*' | '/'))
        .collect()
}

/// Evaluate a raw formula. `None` when empty or malformed.
pub fn evaluate(raw: &str) -> Option<f64> {
    let sanitized = sanitize(raw);
    if sanitized.is_empty() {
        return None;
    }
    if sanitized.contains("++") || sanitized.contains("--") {
        return None;
    }
    let mut parser = Parser {
        input: sanitized.as_bytes(),
        pos: 0,
    };
    let value = parser.expr()?;
    if parser.pos != parser.input.len() || !value.is_finite() {
        return None;
    }
    Some(value)
}

/// Evaluated row value with the zero fallback applied.
pub fn row_value(raw: &str) -> f64 {
    evaluate(raw).unwrap_or(0.0)
}

/// One display segment of a raw formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A run of non-operator characters.
    Operand(String),
    /// A single operator character.
    Operator(char),
}

/// Split a raw formula for display, keeping operators as their own segments.
/// A leading minus therefore splits off like any other operator, matching how
/// formulas are highlighted on screen.
pub fn segments(raw: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut operand = String::new();
    for ch in raw.chars() {
        if matches!(ch, '+' | '-' | '*' | '/') {
            if !operand.is_empty() {
                out.push(Segment::Operand(std::mem::take(&mut operand)));
            }
            out.push(Segment::Operator(ch));
        } else {
            operand.push(ch);
        }
    }
    if !operand.is_empty() {
        out.push(Segment::Operand(operand));
    }
    out
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                b'+' => {
                    self.pos += 1;
                    value += self.term()?;
                }
                b'-' => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                b'*' => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                b'/' => {
                    self.pos += 1;
                    value /= self.factor()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<f64> {
        let mut negative = false;
        while let Some(sign) = self.peek() {
            match sign {
                b'+' => self.pos += 1,
                b'-' => {
                    negative = !negative;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let value = self.literal()?;
        Some(if negative { -value } else { value })
    }

    fn literal(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut digits = 0usize;
        let mut dots = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                b'0'..=b'9' => digits += 1,
                b'.' => dots += 1,
                _ => break,
            }
            self.pos += 1;
        }
        if digits == 0 || dots > 1 {
            return None;
        }
        // float grammar accepts "5." and ".5" directly
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(evaluate("2+3*4"), Some(14.0));
        assert_eq!(evaluate("2*3+4"), Some(10.0));
        assert_eq!(evaluate("10-4/2"), Some(8.0));
    }

    #[test]
    fn division_keeps_fractions() {
        assert_eq!(evaluate("10/4"), Some(2.5));
        assert_eq!(evaluate("1.5+1.5"), Some(3.0));
    }

    #[test]
    fn unary_sign_applies_to_literals() {
        assert_eq!(evaluate("-5+2"), Some(-3.0));
        assert_eq!(evaluate("5*-2"), Some(-10.0));
        assert_eq!(evaluate("+-5"), Some(-5.0));
    }

    #[test]
    fn doubled_signs_are_malformed() {
        assert_eq!(evaluate("5--2"), None);
        assert_eq!(evaluate("5++2"), None);
        assert_eq!(evaluate("5**2"), None);
        assert_eq!(evaluate("5*/2"), None);
    }

    #[test]
    fn bare_and_leading_dots() {
        assert_eq!(evaluate("5."), Some(5.0));
        assert_eq!(evaluate(".5*4"), Some(2.0));
        assert_eq!(evaluate("."), None);
        assert_eq!(evaluate("1.2.3"), None);
    }

    #[test]
    fn trailing_operator_is_malformed() {
        assert_eq!(evaluate("5+"), None);
        assert_eq!(evaluate("*5"), None);
    }

    #[test]
    fn sanitize_drops_foreign_characters() {
        assert_eq!(sanitize("2a3"), "23");
        assert_eq!(evaluate("2a3"), Some(23.0));
        assert_eq!(evaluate("abc"), None);
        assert_eq!(evaluate(""), None);
    }

    #[test]
    fn division_by_zero_falls_back_to_zero() {
        assert_eq!(evaluate("5/0"), None);
        assert_eq!(row_value("5/0"), 0.0);
        assert_eq!(row_value("100*3"), 300.0);
        assert_eq!(row_value("garbage"), 0.0);
    }

    #[test]
    fn segments_keep_operators_separate() {
        assert_eq!(
            segments("12+3*4"),
            vec![
                Segment::Operand("12".to_string()),
                Segment::Operator('+'),
                Segment::Operand("3".to_string()),
                Segment::Operator('*'),
                Segment::Operand("4".to_string()),
            ]
        );
        assert_eq!(
            segments("-5"),
            vec![
                Segment::Operator('-'),
                Segment::Operand("5".to_string())
            ]
        );
        assert!(segments("").is_empty());
    }
}
