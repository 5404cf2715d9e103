// ============================================================
// CELL VALUE
// ============================================================
// Per-cell typing: each field is text, a number, or empty

use serde::{Serialize, Serializer};
use std::fmt;

/// A single typed cell of a parsed table.
///
/// Typing is decided per cell from the field text, never per column, so two rows
/// may hold different variants under the same header.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Non-numeric text, trimmed and with surrounding quotes removed
    Text(String),

    /// Text that coerces to a number
    Number(f64),

    /// Empty field (distinct from zero)
    Empty,
}

impl CellValue {
    /// Type a field whose text is already trimmed and unquoted
    pub fn from_field(text: &str) -> Self {
        if text.is_empty() {
            return CellValue::Empty;
        }

        match coerce_number(text) {
            Some(number) => CellValue::Number(number),
            None => CellValue::Text(text.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Non-empty and numeric-coercible
    pub fn is_numeric(&self) -> bool {
        match self {
            CellValue::Number(_) => true,
            CellValue::Text(text) => coerce_number(text).is_some(),
            CellValue::Empty => false,
        }
    }

    /// Whether the value counts as present when a filter asks for one.
    /// Zero and empty cells do not.
    pub fn is_present(&self) -> bool {
        match self {
            CellValue::Text(text) => !text.is_empty(),
            CellValue::Number(number) => *number != 0.0 && !number.is_nan(),
            CellValue::Empty => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(number) => f.write_str(&format_number(*number)),
            CellValue::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Text(text) => serializer.serialize_str(text),
            CellValue::Number(number) if number.is_finite() => serializer.serialize_f64(*number),
            CellValue::Number(number) => serializer.serialize_str(&format_number(*number)),
            CellValue::Empty => serializer.serialize_str(""),
        }
    }
}

/// Numeric coercion with the same acceptance rules as a JavaScript `Number(text)` call.
///
/// Accepts decimal literals (optional sign, fraction and exponent), `Infinity`
/// and `0x`/`0o`/`0b` integer literals. Whitespace-only text coerces to zero.
/// Returns `None` where JavaScript would produce NaN.
pub fn coerce_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    if let Some(number) = parse_radix_literal(trimmed) {
        return Some(number);
    }

    if !is_decimal_literal(trimmed) {
        return None;
    }

    trimmed.parse::<f64>().ok()
}

fn parse_radix_literal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'0' {
        return None;
    }

    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };

    text[2..].chars().try_fold(0f64, |acc, c| {
        c.to_digit(radix)
            .map(|digit| acc * radix as f64 + digit as f64)
    })
}

// sign? (digits [. digits?] | . digits) ([eE] sign? digits)?
fn is_decimal_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut mantissa_digits = pos - int_start;

    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        let frac_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        mantissa_digits += pos - frac_start;
    }

    if mantissa_digits == 0 {
        return false;
    }

    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+') | Some(b'-')) {
            pos += 1;
        }
        let exp_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == exp_start {
            return false;
        }
    }

    pos == bytes.len()
}

/// Render a number the way JavaScript's `String(number)` does
pub fn format_number(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_string();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if number == 0.0 {
        return "0".to_string();
    }

    let magnitude = number.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", number);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }

    number.to_string()
}
