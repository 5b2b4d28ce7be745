//! # Fixed-column field parsers
//!
//! Each parser extracts the byte range `start..start + len` of an input line, strips
//! surrounding whitespace and converts the fragment into a [`FieldValue`].
//!
//! ## NULL conventions
//! -----------------
//! * **Empty-after-strip**: a blank fragment is `Null` for every numeric parser.
//! * **Magic sentinel**: the `*_with_magic_null` variants also return `Null` when the
//!   stripped fragment equals the caller's sentinel exactly (`"NULL"`, `"---"`, `"99.999"`…).
//!
//! ## Errors
//! -----------------
//! A non-blank fragment that is not a complete literal of the target type yields
//! [`ParseFieldError::InvalidLiteral`] carrying the stripped fragment. Numbers are parsed
//! with Rust's locale-independent `FromStr`, so `"1.5"` is always one and a half.
//!
//! Ranges reaching past the end of the line are clamped: lines whose trailing blanks
//! were trimmed by an editor still parse, their missing columns being blank.
use std::{borrow::Cow, str::FromStr};

use crate::{
    booster_errors::ParseFieldError,
    conversion::{parse_dec_to_deg, parse_ra_to_deg},
    value::{FieldValue, ValueKind},
};

/// `isspace` in the C locale: blank, `\t`, `\n`, `\v`, `\f`, `\r`.
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Remove leading and trailing whitespace.
pub fn strip_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_space(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| !is_space(b)).map_or(start, |p| p + 1);
    &bytes[start..end]
}

/// The stripped fragment `src[start..start + len]`, clamped to the line.
pub fn extract_field(src: &[u8], start: usize, len: usize) -> &[u8] {
    let from = start.min(src.len());
    let to = start.saturating_add(len).min(src.len());
    strip_whitespace(&src[from..to])
}

/// Numeric types that have a [`FieldValue`] variant.
pub trait NumericField: FromStr + Into<FieldValue<'static>> {
    const KIND: ValueKind;
}

impl NumericField for i16 {
    const KIND: ValueKind = ValueKind::Short;
}

impl NumericField for i32 {
    const KIND: ValueKind = ValueKind::Int;
}

impl NumericField for i64 {
    const KIND: ValueKind = ValueKind::Bigint;
}

impl NumericField for f32 {
    const KIND: ValueKind = ValueKind::Float;
}

impl NumericField for f64 {
    const KIND: ValueKind = ValueKind::Double;
}

/// Parse an already stripped fragment as a `T`; blank is `Null`.
pub(crate) fn parse_literal<T: NumericField>(
    input: &[u8],
) -> Result<FieldValue<'static>, ParseFieldError> {
    if input.is_empty() {
        return Ok(FieldValue::Null);
    }
    let text = std::str::from_utf8(input).map_err(|_| ParseFieldError::not_utf8(T::KIND, input))?;
    text.parse::<T>()
        .map(Into::into)
        .map_err(|_| ParseFieldError::invalid_literal(T::KIND, text))
}

/// Parse `src[start..start + len]` as a number of type `T`.
///
/// Arguments
/// -----------------
/// * `src` – the whole input line.
/// * `start`, `len` – byte range of the column.
/// * `magic_null` – optional sentinel mapped to `Null` after stripping.
///
/// Return
/// ----------
/// * The typed value, `Null` for a blank (or sentinel) fragment, or
///   [`ParseFieldError::InvalidLiteral`].
pub fn parse_number<T: NumericField>(
    src: &[u8],
    start: usize,
    len: usize,
    magic_null: Option<&str>,
) -> Result<FieldValue<'static>, ParseFieldError> {
    let input = extract_field(src, start, len);
    if magic_null.is_some_and(|magic| input == magic.as_bytes()) {
        return Ok(FieldValue::Null);
    }
    parse_literal::<T>(input)
}

pub fn parse_short(
    src: &[u8],
    start: usize,
    len: usize,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_number::<i16>(src, start, len, None)
}

pub fn parse_int(
    src: &[u8],
    start: usize,
    len: usize,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_number::<i32>(src, start, len, None)
}

pub fn parse_bigint(
    src: &[u8],
    start: usize,
    len: usize,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_number::<i64>(src, start, len, None)
}

pub fn parse_float(
    src: &[u8],
    start: usize,
    len: usize,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_number::<f32>(src, start, len, None)
}

pub fn parse_double(
    src: &[u8],
    start: usize,
    len: usize,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_number::<f64>(src, start, len, None)
}

pub fn parse_float_with_magic_null(
    src: &[u8],
    start: usize,
    len: usize,
    magic: &str,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_number::<f32>(src, start, len, Some(magic))
}

pub fn parse_double_with_magic_null(
    src: &[u8],
    start: usize,
    len: usize,
    magic: &str,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_number::<f64>(src, start, len, Some(magic))
}

/// Borrow the stripped fragment as `Text`.
///
/// A blank fragment gives an empty `Text`, not `Null`; use
/// [`parse_string_with_magic_null`] when blanks mean "unknown".
pub fn parse_string(src: &[u8], start: usize, len: usize) -> FieldValue<'_> {
    FieldValue::Text(Cow::Borrowed(extract_field(src, start, len)))
}

/// Like [`parse_string`], with `Null` for a blank fragment or one equal to `magic`.
pub fn parse_string_with_magic_null<'a>(
    src: &'a [u8],
    start: usize,
    len: usize,
    magic: &str,
) -> FieldValue<'a> {
    let input = extract_field(src, start, len);
    if input.is_empty() || input == magic.as_bytes() {
        FieldValue::Null
    } else {
        FieldValue::Text(Cow::Borrowed(input))
    }
}

/// The raw byte at `index`, or `Null` if it is whitespace or past the end of the line.
pub fn parse_char(src: &[u8], index: usize) -> FieldValue<'static> {
    match src.get(index) {
        Some(&b) if !is_space(b) => FieldValue::Char(b),
        _ => FieldValue::Null,
    }
}

/// A flag column where any non-blank character means `true`.
pub fn parse_blank_boolean(src: &[u8], index: usize) -> FieldValue<'static> {
    FieldValue::Bool(matches!(src.get(index), Some(&b) if !is_space(b)))
}

/// Parse a sexagesimal right ascension (`HH MM SS.ss`) into a `Double` in degrees.
pub fn parse_hms_angle(
    src: &[u8],
    start: usize,
    len: usize,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_sexagesimal(extract_field(src, start, len), parse_ra_to_deg)
}

/// Parse a sexagesimal declination (`±DD MM SS.s`) into a `Double` in degrees.
pub fn parse_dms_angle(
    src: &[u8],
    start: usize,
    len: usize,
) -> Result<FieldValue<'static>, ParseFieldError> {
    parse_sexagesimal(extract_field(src, start, len), parse_dec_to_deg)
}

fn parse_sexagesimal(
    input: &[u8],
    convert: fn(&str) -> Option<f64>,
) -> Result<FieldValue<'static>, ParseFieldError> {
    if input.is_empty() {
        return Ok(FieldValue::Null);
    }
    let text = std::str::from_utf8(input)
        .map_err(|_| ParseFieldError::not_utf8(ValueKind::Double, input))?;
    convert(text)
        .map(FieldValue::Double)
        .ok_or_else(|| ParseFieldError::invalid_literal(ValueKind::Double, text))
}
