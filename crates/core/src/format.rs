//! Display formatting for amounts, rates and totals.
//!
//! Numbers print Indonesian style: `.` groups thousands, `,` separates the
//! fraction. Field values keep exactly the fraction digits the user typed
//! (a trailing decimal point shows as a trailing comma); totals always carry
//! two fraction digits; calculator results round to whole numbers.

/// Format a raw amount/rate field for display.
///
/// Empty stays empty and anything unparseable is shown verbatim. Leading
/// zeros collapse (`00` displays as `0`) and typed fraction digits are
/// preserved as typed.
pub fn format_amount(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if raw.parse::<f64>().is_err() {
        return raw.to_string();
    }
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let ends_with_point = unsigned.ends_with('.');
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (unsigned, ""),
    };
    let mut out = String::from(sign);
    out.push_str(&group_digits(normalize_int(int_part)));
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    } else if ends_with_point {
        out.push(',');
    }
    out
}

/// Format a computed total with exactly two fraction digits.
pub fn format_total(value: f64) -> String {
    if !value.is_finite() {
        return "0,00".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u128;
    format!(
        "{sign}{},{:02}",
        group_digits(&(cents / 100).to_string()),
        cents % 100
    )
}

/// Format a calculator result: rounded to a whole number, grouped.
pub fn format_integer(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs().round() as u128;
    format!("{sign}{}", group_digits(&magnitude.to_string()))
}

/// Display form of one formula segment: numbers get the grouped whole-number
/// treatment, anything else shows verbatim.
pub fn format_operand(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(value) => format_integer(value),
        Err(_) => raw.to_string(),
    }
}

fn normalize_int(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_group_thousands_with_points() {
        assert_eq!(format_amount("1000"), "1.000");
        assert_eq!(format_amount("1234567"), "1.234.567");
        assert_eq!(format_amount("100"), "100");
    }

    #[test]
    fn amounts_keep_typed_fraction_digits() {
        assert_eq!(format_amount("1234.5"), "1.234,5");
        assert_eq!(format_amount("1.50"), "1,50");
        assert_eq!(format_amount("0.05"), "0,05");
    }

    #[test]
    fn trailing_point_shows_as_trailing_comma() {
        assert_eq!(format_amount("12."), "12,");
        assert_eq!(format_amount("0."), "0,");
    }

    #[test]
    fn leading_zeros_collapse() {
        assert_eq!(format_amount("00"), "0");
        assert_eq!(format_amount("007"), "7");
        assert_eq!(format_amount("00.5"), "0,5");
    }

    #[test]
    fn empty_and_unparseable_pass_through() {
        assert_eq!(format_amount(""), "");
        assert_eq!(format_amount("-"), "-");
    }

    #[test]
    fn totals_always_carry_two_decimals() {
        assert_eq!(format_total(0.0), "0,00");
        assert_eq!(format_total(1_550_000.0), "1.550.000,00");
        assert_eq!(format_total(1234.5), "1.234,50");
        assert_eq!(format_total(-99.995), "-100,00");
    }

    #[test]
    fn integers_round_half_away_from_zero() {
        assert_eq!(format_integer(0.0), "0");
        assert_eq!(format_integer(2.5), "3");
        assert_eq!(format_integer(1_234_567.4), "1.234.567");
        assert_eq!(format_integer(-1500.0), "-1.500");
    }

    #[test]
    fn operands_format_only_when_numeric() {
        assert_eq!(format_operand("1500000"), "1.500.000");
        assert_eq!(format_operand("2.5"), "3");
        assert_eq!(format_operand("x2"), "x2");
    }
}
