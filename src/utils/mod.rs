//! Small text helpers shared by the catalog modules.

/// Trimmed copy of `value`, or `None` when it is absent or only whitespace.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

/// Integer prefix of `text` the way form inputs are read: surrounding whitespace is
/// ignored, an optional sign is honoured, and anything after the digits is dropped.
/// `"12 copies"` reads as `12`; `"abc"` reads as nothing.
pub fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    // Overflowing input saturates rather than being discarded
    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  1937 ")), Some("1937".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn leading_integer_reads_prefix() {
        assert_eq!(leading_integer("12"), Some(12));
        assert_eq!(leading_integer(" 3 copies"), Some(3));
        assert_eq!(leading_integer("-4"), Some(-4));
        assert_eq!(leading_integer("+7"), Some(7));
        assert_eq!(leading_integer("2.9"), Some(2));
        assert_eq!(leading_integer("abc"), None);
        assert_eq!(leading_integer(""), None);
        assert_eq!(leading_integer("-"), None);
    }
}
