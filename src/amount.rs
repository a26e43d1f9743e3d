use std::sync::OnceLock;

use regex::Regex;

/// Matches the decimal separator: the last `.` or `,` followed by one to two
/// or five to nine trailing characters. Three or four trailing digits are
/// assumed to be a thousands group, not a fraction.
fn decimal_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.,]([^.,]{5,9}|[^.,]{1,2})$").expect("pattern compiles"))
}

fn extract_numbers(v: &str) -> String {
    v.chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Parse loosely formatted amount text into a signed value. Currency
/// symbols, whitespace, thousands separators and parenthesized negatives are
/// all tolerated; `None` means no number could be recovered.
pub fn loosely_parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let negated;
    let raw = if raw.starts_with('(') && raw.ends_with(')') && raw.len() >= 2 {
        negated = format!("-{}", &raw[1..raw.len() - 1]);
        &negated
    } else {
        raw
    };

    if let Some(m) = decimal_separator_re().find(raw) {
        if m.start() > 0 {
            let left = extract_numbers(&raw[..m.start()]);
            let right = extract_numbers(&raw[m.start() + 1..]);
            return format!("{left}.{right}").parse().ok();
        }
    }
    extract_numbers(raw).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_noisy_amounts() {
        assert_eq!(loosely_parse_amount("1234.56"), Some(1234.56));
        assert_eq!(loosely_parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(loosely_parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(loosely_parse_amount("  -42.50  "), Some(-42.5));
        assert_eq!(loosely_parse_amount("0"), Some(0.0));
    }

    #[test]
    fn parses_parenthesized_negatives() {
        assert_eq!(loosely_parse_amount("(500.00)"), Some(-500.0));
        assert_eq!(loosely_parse_amount("($1,234.56)"), Some(-1234.56));
    }

    #[test]
    fn parses_european_separators() {
        assert_eq!(loosely_parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(loosely_parse_amount("1 234,56"), Some(1234.56));
    }

    #[test]
    fn treats_three_trailing_digits_as_a_thousands_group() {
        assert_eq!(loosely_parse_amount("1,234"), Some(1234.0));
        assert_eq!(loosely_parse_amount("1.234"), Some(1234.0));
    }

    #[test]
    fn keeps_long_fractions() {
        assert_eq!(loosely_parse_amount("0.123456"), Some(0.123456));
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert_eq!(loosely_parse_amount("not a number"), None);
        assert_eq!(loosely_parse_amount(""), None);
        assert_eq!(loosely_parse_amount("--"), None);
    }
}
