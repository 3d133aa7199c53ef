//! Field splitting and lenient number parsing for crowd-count CSV rows.

/// Splits one CSV line into trimmed fields.
///
/// Every `"` toggles the quoted state and is dropped from the output, so a
/// quoted field may contain commas. Doubled quotes (`""`) inside a quoted
/// field are not treated as an escaped quote: they toggle twice and vanish.
#[must_use]
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Parses the longest numeric prefix of `s`, ignoring leading whitespace
/// and any trailing garbage (`"12.5kg"` parses as `12.5`).
///
/// Returns `None` when no digits precede the first non-numeric character.
#[must_use]
pub fn parse_leading_f64(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Parses a count-like field, coercing anything unparsable or non-finite
/// to `0`.
#[must_use]
pub fn parse_count(s: &str) -> f64 {
    parse_leading_f64(s)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parses a coordinate field. Returns `None` unless the value is finite.
#[must_use]
pub fn parse_coordinate(s: &str) -> Option<f64> {
    parse_leading_f64(s).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields_and_trims() {
        assert_eq!(split_csv_line("a, b ,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn keeps_commas_inside_quotes() {
        assert_eq!(
            split_csv_line(r#"2025-01-01,"Station, North",5"#),
            vec!["2025-01-01", "Station, North", "5"]
        );
    }

    #[test]
    fn doubled_quotes_are_not_unescaped() {
        assert_eq!(split_csv_line(r#""say ""hi""",x"#), vec!["say hi", "x"]);
    }

    #[test]
    fn trailing_comma_yields_empty_field() {
        assert_eq!(split_csv_line("a,b,"), vec!["a", "b", ""]);
    }

    #[test]
    fn parses_numeric_prefix() {
        assert_eq!(parse_leading_f64("12.5kg"), Some(12.5));
        assert_eq!(parse_leading_f64("  -3e2x"), Some(-300.0));
        assert_eq!(parse_leading_f64("7e"), Some(7.0));
        assert_eq!(parse_leading_f64(".25"), Some(0.25));
        assert_eq!(parse_leading_f64("5."), Some(5.0));
    }

    #[test]
    fn rejects_input_without_digits() {
        assert_eq!(parse_leading_f64(""), None);
        assert_eq!(parse_leading_f64("abc"), None);
        assert_eq!(parse_leading_f64("-."), None);
        assert_eq!(parse_leading_f64("NaN"), None);
    }

    #[test]
    fn infinity_is_recognized_but_not_admitted() {
        assert_eq!(parse_leading_f64("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(parse_coordinate("Infinity").is_none());
        assert!(parse_count("Infinity").abs() < f64::EPSILON);
    }

    #[test]
    fn unparsable_count_is_zero() {
        assert!(parse_count("n/a").abs() < f64::EPSILON);
        assert!((parse_count("412.37") - 412.37).abs() < f64::EPSILON);
    }
}
