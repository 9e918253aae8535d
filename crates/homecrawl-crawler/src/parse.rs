//! Localized numeric string parsing for provider payloads.
//!
//! The provider renders numbers with Persian (and occasionally Arabic-Indic)
//! digit glyphs and decorates them with unit words and thousands separators,
//! e.g. `"۸۰ متر"` or `"متری: ۱۲۵٬۰۰۰٬۰۰۰ تومان"`. These helpers fold the
//! glyphs to ASCII and extract the numeric value by character scanning — no
//! regex, matching how the rest of the workspace parses loose text.

/// Folds Persian (`۰`–`۹`) and Arabic-Indic (`٠`–`٩`) digit glyphs to their
/// ASCII equivalents, leaving every other character untouched.
pub(crate) fn to_ascii_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + u8::try_from(c as u32 - '۰' as u32).unwrap_or(0)),
            '٠'..='٩' => char::from(b'0' + u8::try_from(c as u32 - '٠' as u32).unwrap_or(0)),
            other => other,
        })
        .collect()
}

/// Extracts the numeric value from a localized string.
///
/// Folds digit glyphs, then keeps only ASCII digits and whitespace — unit
/// words, currency names, and thousands separators all drop out. A string
/// that yields two whitespace-separated digit runs is ambiguous and returns
/// `None` rather than guessing which run was meant.
pub(crate) fn parse_localized_number(s: &str) -> Option<f64> {
    let folded = to_ascii_digits(s);
    let kept: String = folded
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_whitespace())
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Like [`parse_localized_number`] but rejects non-positive results, for
/// fields where zero means "not provided".
pub(crate) fn parse_positive_number(s: &str) -> Option<f64> {
    parse_localized_number(s).filter(|v| *v > 0.0)
}

/// Extracts a small integer (room count, construction year) from a chip
/// title, taking all digits regardless of separators.
pub(crate) fn parse_digits_only(s: &str) -> Option<u32> {
    let folded = to_ascii_digits(s);
    let digits: String = folded.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<u32>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_persian_digits() {
        assert_eq!(to_ascii_digits("۸۰ متر"), "80 متر");
        assert_eq!(to_ascii_digits("۱۲۳۴۵۶۷۸۹۰"), "1234567890");
    }

    #[test]
    fn folds_arabic_indic_digits() {
        assert_eq!(to_ascii_digits("٤٢"), "42");
    }

    #[test]
    fn leaves_ascii_untouched() {
        assert_eq!(to_ascii_digits("75 sqm"), "75 sqm");
    }

    #[test]
    fn parses_size_chip() {
        assert_eq!(parse_localized_number("۸۰ متر"), Some(80.0));
    }

    #[test]
    fn parses_price_with_separators() {
        assert_eq!(
            parse_localized_number("۱۲۵٬۰۰۰٬۰۰۰ تومان"),
            Some(125_000_000.0)
        );
    }

    #[test]
    fn rejects_two_separated_numbers() {
        // "طبقه ۲ از ۵" style strings carry two values; neither is "the" number.
        assert_eq!(parse_localized_number("۲ از ۵"), None);
    }

    #[test]
    fn rejects_empty_and_unit_only_strings() {
        assert_eq!(parse_localized_number(""), None);
        assert_eq!(parse_localized_number("توافقی"), None);
    }

    #[test]
    fn positive_filter_drops_zero() {
        assert_eq!(parse_positive_number("۰"), None);
        assert_eq!(parse_positive_number("۱"), Some(1.0));
    }

    #[test]
    fn digits_only_concatenates_runs() {
        assert_eq!(parse_digits_only("ساخت ۱۳۹۸"), Some(1398));
        assert_eq!(parse_digits_only("۲ خواب"), Some(2));
        assert_eq!(parse_digits_only("بدون عدد"), None);
    }
}
