//! Field decoders (§4.4): per-cell raw bytes → typed `Value`.

use time::{Date, Duration, Month, OffsetDateTime};

use crate::error::{Error, Result, Section};
use crate::metadata::Endianness;
use crate::value::Value;

/// 1960-01-01T00:00:00Z, the reference instant for numeric date/datetime encoding.
fn sas_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
        .replace_date(Date::from_calendar_date(1960, Month::January, 1).expect("valid date"))
}

fn sas_epoch_date() -> Date {
    Date::from_calendar_date(1960, Month::January, 1).expect("valid date")
}

/// Trims trailing `0x00`/`0x20`, then leading `0x20`, then decodes with `codec`.
/// An all-blank/NUL cell yields an empty string, not absent.
#[must_use]
pub fn decode_text<'a>(raw: &'a [u8], codec: &'static encoding_rs::Encoding) -> Value<'a> {
    let trimmed = crate::parser::encoding::trim_trailing(raw);
    let trimmed = trim_leading_space(trimmed);
    if let Ok(text) = simdutf8::basic::from_utf8(trimmed) {
        return Value::Text(std::borrow::Cow::Borrowed(text));
    }
    let (text, _, _) = codec.decode(trimmed);
    Value::Text(std::borrow::Cow::Owned(text.into_owned()))
}

fn trim_leading_space(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b != b' ') {
        Some(first) => &bytes[first..],
        None => &[],
    }
}

/// Interprets `raw` as an integer of the cell's width at `endian`, then
/// bit-casts to `f64`. A resulting NaN is the absent-value marker.
pub fn decode_number(
    raw: &[u8],
    endian: Endianness,
    section: Section,
) -> Result<Value<'static>> {
    let width = raw.len();
    let bits: u64 = match width {
        1 => u64::from(raw[0]),
        2 => {
            let signed = match endian {
                Endianness::Little => i16::from_le_bytes([raw[0], raw[1]]),
                Endianness::Big => i16::from_be_bytes([raw[0], raw[1]]),
            };
            return Ok(number_or_absent(f64::from(signed)));
        }
        3..=7 => {
            // The truncated little-endian image: for little-endian files the
            // raw bytes already are this image; for big-endian files the raw
            // bytes must be reversed to get it. Either way, the missing bytes
            // are appended as zeros on the right (the least-significant end).
            let mut image = [0u8; 8];
            match endian {
                Endianness::Little => image[..width].copy_from_slice(raw),
                Endianness::Big => {
                    for (dst, src) in image[..width].iter_mut().zip(raw.iter().rev()) {
                        *dst = *src;
                    }
                }
            }
            u64::from_le_bytes(image)
        }
        8 => match endian {
            Endianness::Little => u64::from_le_bytes(raw.try_into().expect("8 bytes")),
            Endianness::Big => u64::from_be_bytes(raw.try_into().expect("8 bytes")),
        },
        _ => {
            return Err(Error::BadField {
                section,
                details: format!("numeric cell width {width} is not in {{1,2,3..7,8}}").into(),
            });
        }
    };

    if width == 1 {
        return Ok(number_or_absent(bits as f64));
    }

    Ok(number_or_absent(f64::from_bits(bits)))
}

fn number_or_absent(value: f64) -> Value<'static> {
    if value.is_nan() {
        Value::Absent
    } else {
        Value::Number(value)
    }
}

/// Rounds half away from zero to the nearest whole number.
#[must_use]
pub fn round_half_away_from_zero(value: f64) -> f64 {
    if value >= 0.0 {
        (value + 0.5).floor()
    } else {
        (value - 0.5).ceil()
    }
}

/// Decodes a duration cell (SAS "time"): number of seconds, rounded half
/// away from zero.
#[must_use]
pub fn decode_time(number: Value<'static>) -> Value<'static> {
    match number {
        Value::Number(seconds) => Value::Duration(Duration::seconds_f64(round_half_away_from_zero(seconds))),
        _ => Value::Absent,
    }
}

/// Decodes a datetime cell: seconds since the SAS epoch, rounded half away
/// from zero. Out-of-range values become absent rather than an error.
#[must_use]
pub fn decode_datetime(number: Value<'static>) -> Value<'static> {
    let Value::Number(seconds) = number else {
        return Value::Absent;
    };
    let whole_seconds = round_half_away_from_zero(seconds);
    if !whole_seconds.is_finite() {
        return Value::Absent;
    }
    match sas_epoch().checked_add(Duration::seconds_f64(whole_seconds)) {
        Some(instant) => Value::DateTime(instant),
        None => Value::Absent,
    }
}

/// Decodes a date cell. `date_from_datetime` selects between the two
/// variants named in §4.4/§4.5 step 7.
#[must_use]
pub fn decode_date(number: Value<'static>, date_from_datetime: bool) -> Value<'static> {
    let Value::Number(raw) = number else {
        return Value::Absent;
    };

    if date_from_datetime {
        let whole_seconds = round_half_away_from_zero(raw);
        if !whole_seconds.is_finite() {
            return Value::Absent;
        }
        return match sas_epoch().checked_add(Duration::seconds_f64(whole_seconds)) {
            Some(instant) => Value::Date(instant.date()),
            None => Value::Absent,
        };
    }

    let whole_days = round_half_away_from_zero(raw);
    if !whole_days.is_finite() || whole_days.abs() > f64::from(i32::MAX) {
        return Value::Absent;
    }
    #[allow(clippy::cast_possible_truncation)]
    let days = whole_days as i64;
    match i32::try_from(days) {
        Ok(days) => match sas_epoch_date().checked_add(Duration::days(i64::from(days))) {
            Some(date) => Value::Date(date),
            None => Value::Absent,
        },
        Err(_) => Value::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Endianness;

    #[test]
    fn text_is_trimmed_both_ends_and_blank_is_empty_not_absent() {
        let raw = b"  hello   \x00\x00";
        let value = decode_text(raw, encoding_rs::WINDOWS_1252);
        assert_eq!(value, Value::Text("hello".into()));
        let blank = decode_text(b"        ", encoding_rs::WINDOWS_1252);
        assert_eq!(blank, Value::Text("".into()));
    }

    #[test]
    fn width_one_byte_promotes_unsigned() {
        let value = decode_number(&[200], Endianness::Little, Section::Row { index: 0 }).unwrap();
        assert_eq!(value, Value::Number(200.0));
    }

    #[test]
    fn width_two_is_signed() {
        let value = decode_number(&(-5i16).to_le_bytes(), Endianness::Little, Section::Row { index: 0 })
            .unwrap();
        assert_eq!(value, Value::Number(-5.0));
    }

    #[test]
    fn nan_sentinel_is_absent() {
        let bytes = f64::NAN.to_le_bytes();
        let value = decode_number(&bytes, Endianness::Little, Section::Row { index: 0 }).unwrap();
        assert_eq!(value, Value::Absent);
    }

    #[test]
    fn date_variant_whole_days_vs_datetime() {
        let date = decode_date(Value::Number(1.0), false);
        assert_eq!(date, Value::Date(Date::from_calendar_date(1960, Month::January, 2).unwrap()));

        let date_from_datetime = decode_date(Value::Number(86_400.0), true);
        assert_eq!(
            date_from_datetime,
            Value::Date(Date::from_calendar_date(1960, Month::January, 2).unwrap())
        );
    }
}
