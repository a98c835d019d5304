//! Locale-independent parsers for raw attribute text
//!
//! Both the type inferencer and the populator go through these functions so a
//! value is always read the same way whether it decides a column's type or
//! fills a cell.

use chrono::{NaiveDate, TimeDelta};
use regex::Regex;
use std::sync::LazyLock;

/// Value stored in a Timestamp cell when the text is not a timestamp
pub const TIMESTAMP_SENTINEL: f64 = -1.0;

/// Value stored in a Numeric cell when no number can be read
pub const NUMERIC_FALLBACK: f64 = 0.0;

/// Date and time-of-day components up to (not including) the seconds field.
/// Seconds are read separately as a float so fractions survive.
static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4})-(\d{1,2})-(\d{1,2})T(\d{1,2}):(\d{1,2}):").unwrap()
});

/// Read the longest floating point prefix of `text`, strtod style.
///
/// Returns the parsed value together with the number of bytes consumed.
/// Leading ASCII whitespace is skipped, an optional sign is accepted, as are
/// the words `inf`, `infinity` and `nan` in any case and `0x` hex floats with
/// an optional binary `p` exponent. When nothing can be converted the result
/// is `(0.0, 0)`.
pub fn parse_float_prefix(text: &str) -> (f64, usize) {
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let start = pos;
    let negative = bytes.get(pos) == Some(&b'-');
    if matches!(bytes.get(pos), Some(b'+' | b'-')) {
        pos += 1;
    }

    if let Some((value, len)) = special_value(&text[pos..]) {
        let value = if negative { -value } else { value };
        return (value, pos + len);
    }

    if let Some((value, len)) = hex_value(&bytes[pos..]) {
        let value = if negative { -value } else { value };
        return (value, pos + len);
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = pos - int_start;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        let frac_start = pos + 1;
        let mut end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        frac_digits = end - frac_start;
        if int_digits + frac_digits > 0 {
            pos = end;
        }
    }

    if int_digits + frac_digits == 0 {
        return (0.0, 0);
    }

    // An exponent only counts when at least one digit follows it
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut end = pos + 1;
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let exp_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > exp_start {
            pos = end;
        }
    }

    let value = text[start..pos].parse::<f64>().unwrap_or(NUMERIC_FALLBACK);
    (value, pos)
}

fn special_value(rest: &str) -> Option<(f64, usize)> {
    let starts_with = |word: &str| {
        rest.get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word))
    };

    if starts_with("infinity") {
        Some((f64::INFINITY, 8))
    } else if starts_with("inf") {
        Some((f64::INFINITY, 3))
    } else if starts_with("nan") {
        Some((f64::NAN, 3))
    } else {
        None
    }
}

/// Hex mantissa after `0x`, scaled by an optional `p` power of two.
/// `None` when no hex digit follows the prefix; the caller then reads the `0`.
fn hex_value(bytes: &[u8]) -> Option<(f64, usize)> {
    if bytes.len() < 2 || bytes[0] != b'0' || !matches!(bytes[1], b'x' | b'X') {
        return None;
    }

    let hex_digit = |pos: usize| bytes.get(pos).and_then(|b| (*b as char).to_digit(16));
    let mut pos = 2;
    let mut mantissa = 0.0_f64;
    let mut digits = 0;
    let mut frac_digits = 0_i32;

    while let Some(d) = hex_digit(pos) {
        mantissa = mantissa * 16.0 + f64::from(d);
        digits += 1;
        pos += 1;
    }

    if bytes.get(pos) == Some(&b'.') {
        let mut end = pos + 1;
        while let Some(d) = hex_digit(end) {
            mantissa = mantissa * 16.0 + f64::from(d);
            frac_digits += 1;
            end += 1;
        }
        if digits + frac_digits > 0 {
            pos = end;
        }
    }

    if digits + frac_digits == 0 {
        return None;
    }

    let mut exponent = 0_i32;
    if matches!(bytes.get(pos), Some(b'p' | b'P')) {
        let mut end = pos + 1;
        let negative = bytes.get(end) == Some(&b'-');
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let exp_start = end;
        let mut value = 0_i32;
        while let Some(d) = bytes.get(end).filter(|b| b.is_ascii_digit()) {
            value = value.saturating_mul(10).saturating_add(i32::from(d - b'0'));
            end += 1;
        }
        if end > exp_start {
            exponent = if negative { -value } else { value };
            pos = end;
        }
    }

    let scale = exponent.saturating_sub(frac_digits.saturating_mul(4));
    Some((mantissa * 2f64.powi(scale), pos))
}

/// Parse `text` as a number only if every byte is consumed.
///
/// The empty string counts as fully consumed and yields `0.0`.
pub fn parse_float_strict(text: &str) -> Option<f64> {
    let (value, consumed) = parse_float_prefix(text);
    (consumed == text.len()).then_some(value)
}

/// Parse `YYYY-MM-DDTHH:MM:SS[.fraction]` into seconds since the Unix epoch (UTC).
///
/// Text after the seconds field is ignored. Components past their range
/// carry into the next unit the way `mktime` normalises them, so a leap
/// second `23:59:60` lands on the following midnight and `2023-02-29` is
/// 1 March. The fraction is added back after the calendar conversion.
pub fn parse_timestamp(text: &str) -> Option<f64> {
    let caps = TIMESTAMP_PREFIX.captures(text)?;
    let field = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<i64>().ok());

    let year = field(1)?;
    let month = field(2)?;
    let day = field(3)?;
    let hour = field(4)?;
    let minute = field(5)?;

    let seconds_text = &text[caps.get(0)?.end()..];
    let (seconds, consumed) = parse_float_prefix(seconds_text);
    if consumed == 0 || !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc();

    let months = year * 12 + month - 1;
    let first_of_month = NaiveDate::from_ymd_opt(
        i32::try_from(months.div_euclid(12)).ok()?,
        u32::try_from(months.rem_euclid(12) + 1).ok()?,
        1,
    )?;

    let offset = TimeDelta::try_days(day - 1)?
        .checked_add(&TimeDelta::try_seconds(hour * 3600 + minute * 60)?)?
        .checked_add(&TimeDelta::try_seconds(whole as i64)?)?;
    let datetime = first_of_month
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(offset)?;

    Some(datetime.and_utc().timestamp() as f64 + (seconds - whole))
}
