//! # Text parsers
//!
//! Conversion of raw text fragments into [`FieldValue`](crate::value::FieldValue)s.
//!
//! Modules
//! -----------------
//! * [`fixed`] – Fixed-column parsers working on byte ranges of a line (`parse_double`,
//!   `parse_string_with_magic_null`, `parse_char`…).
//! * [`scan`] – The generic formatted scanner ([`FieldScan`], [`scan_field`]) and
//!   strftime-style [`TimePattern`]s.
//! * [`tokenizer`] – A delimiter splitter that keeps empty fields.
//!
//! Every parser strips surrounding whitespace first and reports a malformed fragment as a
//! [`ParseFieldError`](crate::booster_errors::ParseFieldError); what happens to the rest
//! of the record is decided by the [`policy`](crate::policy) layer.
pub mod fixed;
pub mod scan;
pub mod tokenizer;

pub use fixed::{
    extract_field, parse_bigint, parse_blank_boolean, parse_char, parse_dms_angle, parse_double,
    parse_double_with_magic_null, parse_float, parse_float_with_magic_null, parse_hms_angle,
    parse_int, parse_number, parse_short, parse_string, parse_string_with_magic_null,
    strip_whitespace, NumericField,
};
pub use scan::{scan_field, FieldScan, TimePattern};
pub use tokenizer::{tokenize_non_merging, NonMergingTokens};

use crate::value::FieldValue;

/// Convert an already parsed Julian date (`Double`) into a `Datetime`, in place.
///
/// See [`FieldValue::make_time_from_jd`].
pub fn make_time_from_jd(field: &mut FieldValue<'_>) {
    field.make_time_from_jd();
}
