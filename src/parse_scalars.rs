//! Conversion of scalar tag bodies.
//!
//! Bodies are taken verbatim: no trimming and no entity decoding, so
//! `<integer> 5</integer>` is a conversion error just like `<integer>five</integer>`.
//! Errors returned from here carry no location; the deserializer attaches the
//! offset of the body.

use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset};

use crate::error::Error;

/// Parse a base-10 signed or unsigned integer at the width of `T`.
///
/// An optional leading `+` or `-` is accepted. Out-of-range values are
/// conversion errors naming `ty`.
pub(crate) fn parse_integer<T: FromStr>(text: &str, ty: &'static str) -> Result<T, Error> {
    text.parse::<T>()
        .map_err(|_| Error::conversion("integer", ty, text))
}

/// Parse a 64-bit floating point body of `<tag>` (`real`, or `integer` when widening).
pub(crate) fn parse_f64(tag: &str, text: &str) -> Result<f64, Error> {
    match text.parse::<f64>() {
        Ok(v) if v.is_infinite() && !spells_infinity(text) => Err(Error::conversion(tag, "f64", text)),
        Ok(v) => Ok(v),
        Err(_) => Err(Error::conversion(tag, "f64", text)),
    }
}

/// Parse with 32-bit precision, so the nearest `f32` is chosen directly rather
/// than rounding twice through `f64`.
pub(crate) fn parse_f32(tag: &str, text: &str) -> Result<f32, Error> {
    match text.parse::<f32>() {
        Ok(v) if v.is_infinite() && !spells_infinity(text) => Err(Error::conversion(tag, "f32", text)),
        Ok(v) => Ok(v),
        Err(_) => Err(Error::conversion(tag, "f32", text)),
    }
}

/// True if the text spells infinity rather than overflowing into it.
fn spells_infinity(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Parse a strict RFC3339 timestamp: `YYYY-MM-DDTHH:MM:SS[.frac](Z|±HH:MM)`.
///
/// The textual shape is checked first (uppercase `T` and `Z` only, no space
/// separator), then the calendar values are validated.
pub(crate) fn parse_date(text: &str) -> Result<DateTime<FixedOffset>, Error> {
    if !has_rfc3339_shape(text.as_bytes()) {
        return Err(Error::conversion("date", "RFC3339 date", text));
    }
    DateTime::parse_from_rfc3339(text).map_err(|_| Error::conversion("date", "RFC3339 date", text))
}

fn has_rfc3339_shape(b: &[u8]) -> bool {
    fn digits(b: &[u8]) -> bool {
        !b.is_empty() && b.iter().all(u8::is_ascii_digit)
    }

    if b.len() < 20 {
        return false;
    }
    let fixed = digits(&b[0..4])
        && b[4] == b'-'
        && digits(&b[5..7])
        && b[7] == b'-'
        && digits(&b[8..10])
        && b[10] == b'T'
        && digits(&b[11..13])
        && b[13] == b':'
        && digits(&b[14..16])
        && b[16] == b':'
        && digits(&b[17..19]);
    if !fixed {
        return false;
    }

    let mut rest = &b[19..];
    if let Some(frac) = rest.strip_prefix(b".") {
        let n = frac.iter().take_while(|c| c.is_ascii_digit()).count();
        if n == 0 {
            return false;
        }
        rest = &frac[n..];
    }
    match rest {
        [b'Z'] => true,
        [b'+' | b'-', h1, h2, b':', m1, m2] => digits(&[*h1, *h2, *m1, *m2]),
        _ => false,
    }
}

/// Decode a `<data>` body: standard padded base64, ASCII whitespace ignored.
pub(crate) fn decode_data(text: &str) -> Result<Vec<u8>, Error> {
    let cleaned: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    STANDARD
        .decode(&cleaned)
        .map_err(|_| Error::conversion("data", "base64 data", text))
}
