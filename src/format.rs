//! Text formatting helpers shared by edge labels and tables

use regex::Regex;
use std::sync::LazyLock;

/// Number of decimals used by ledger coin amounts
pub const COIN_DECIMALS: u32 = 9;

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br/>|<br>|\n").expect("valid line break pattern"));

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid camel case pattern"));

/// Render a nano-denominated amount as a decimal string, trimming trailing zeros.
pub fn from_nanos(amount: u128, decimals: u32) -> String {
    let unit = 10u128.pow(decimals);
    let whole = amount / unit;
    let fraction = amount % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Lowercase hex with a `0x` prefix
pub fn to_hex_str(code: impl Into<i64>) -> String {
    let code = code.into();
    if code < 0 {
        format!("-0x{:x}", code.unsigned_abs())
    } else {
        format!("0x{:x}", code)
    }
}

/// Group the integer part of a decimal string in threes with `_`.
///
/// The sign is kept and the fractional part is left untouched, so only
/// separators are inserted and no digit changes.
pub fn pretty_number(src: &str) -> String {
    let (sign, unsigned) = match src.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", src.strip_prefix('+').unwrap_or(src)),
    };
    let (int_part, fraction) = match unsigned.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('_');
        }
        grouped.push(*ch);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

/// `ftInternalTransfer` -> `ft_internal_transfer`
pub fn to_snake_case(src: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(src, "${1}_${2}")
        .to_lowercase()
}

/// Replace markdown/mermaid line breaks with single spaces
pub fn flatten_display_label(src: &str) -> String {
    LINE_BREAKS.replace_all(src, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nanos() {
        assert_eq!(from_nanos(1_000_000_000, COIN_DECIMALS), "1");
        assert_eq!(from_nanos(1_500_000_000, COIN_DECIMALS), "1.5");
        assert_eq!(from_nanos(1, COIN_DECIMALS), "0.000000001");
        assert_eq!(from_nanos(0, COIN_DECIMALS), "0");
    }

    #[test]
    fn test_to_hex_str() {
        assert_eq!(to_hex_str(1u32), "0x1");
        assert_eq!(to_hex_str(0xd53276dbu32), "0xd53276db");
        assert_eq!(to_hex_str(-14i32), "-0xe");
    }

    #[test]
    fn test_pretty_number() {
        assert_eq!(pretty_number("1234567"), "1_234_567");
        assert_eq!(pretty_number("-1234"), "-1_234");
        assert_eq!(pretty_number("123"), "123");
        assert_eq!(pretty_number("1234.56789"), "1_234.56789");
        assert_eq!(pretty_number("+1000"), "1_000");
    }

    #[test]
    fn test_pretty_number_keeps_digits() {
        let src = "98765432101234567890";
        assert_eq!(pretty_number(src).replace('_', ""), src);
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("ftInternalTransfer"), "ft_internal_transfer");
        assert_eq!(to_snake_case("excesses"), "excesses");
    }

    #[test]
    fn test_flatten_display_label() {
        assert_eq!(flatten_display_label("a<br/>b<br>c\nd"), "a b c d");
    }
}
