//! # Field values
//!
//! [`FieldValue`] is the intermediate representation between the text parsers and the
//! COPY BINARY encoder: one variant per wire-representable kind, with exactly one payload
//! active at a time. Text payloads borrow from the input line whenever possible, so a
//! value normally lives no longer than the record it was parsed from.
//!
//! [`ValueKind`] is the payload-free tag of a value. It names target column types in
//! layouts and error messages.
use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{ARCSEC_TO_DEG, JD, MAS_TO_DEG},
    time::{julian_date_to_unix_time, Timestamp},
};

/// A typed field value.
///
/// Variants
/// -----------------
/// * `Null` – SQL NULL; short-circuits every encoder to the NULL wire form.
/// * `Bool` – `boolean`, one byte on the wire.
/// * `Char` – a single raw byte (`"char"`). Kept unsigned; the wire byte is the same
///   as for PostgreSQL's signed `"char"`.
/// * `Short` / `Int` / `Bigint` – `smallint` / `integer` / `bigint`.
/// * `Float` / `Double` – `real` / `double precision`.
/// * `Text` – raw bytes, written without terminator; the length is the byte length.
/// * `JulianDate` – a continuous Julian date, reduced to a whole `date` only when encoded.
/// * `Date` – an instant truncated to whole days when encoded.
/// * `Datetime` – an instant encoded as a `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Char(u8),
    Short(i16),
    Int(i32),
    Bigint(i64),
    Float(f32),
    Double(f64),
    Text(Cow<'a, [u8]>),
    JulianDate(JD),
    Date(Timestamp),
    Datetime(Timestamp),
}

/// The tag of a [`FieldValue`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Char,
    Short,
    Int,
    Bigint,
    Float,
    Double,
    Text,
    #[serde(alias = "jdate")]
    JulianDate,
    Date,
    Datetime,
}

impl ValueKind {
    /// Name of the kind as used in diagnostics and layout files.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Char => "char",
            ValueKind::Short => "short",
            ValueKind::Int => "int",
            ValueKind::Bigint => "bigint",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Text => "text",
            ValueKind::JulianDate => "juliandate",
            ValueKind::Date => "date",
            ValueKind::Datetime => "datetime",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'a> FieldValue<'a> {
    /// Borrow `text` as a `Text` value.
    pub fn text(text: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(text.as_bytes()))
    }

    /// `Null` when `value` equals the in-band null marker `null_value`, `value` otherwise.
    ///
    /// Catalogs often flag missing numbers with magic values such as `-9999` or `99.99`;
    /// this maps them to SQL NULL once the raw value is known.
    pub fn with_null<T>(value: T, null_value: T) -> Self
    where
        T: PartialEq + Into<FieldValue<'a>>,
    {
        if value == null_value {
            FieldValue::Null
        } else {
            value.into()
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Null => ValueKind::Null,
            FieldValue::Bool(_) => ValueKind::Bool,
            FieldValue::Char(_) => ValueKind::Char,
            FieldValue::Short(_) => ValueKind::Short,
            FieldValue::Int(_) => ValueKind::Int,
            FieldValue::Bigint(_) => ValueKind::Bigint,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::Double(_) => ValueKind::Double,
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::JulianDate(_) => ValueKind::JulianDate,
            FieldValue::Date(_) => ValueKind::Date,
            FieldValue::Datetime(_) => ValueKind::Datetime,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Rewrite a numeric value in place as `offset + value * factor`.
    ///
    /// Only `Float`, `Double` and `Int` are affected; the `Int` result is truncated
    /// toward zero. Every other variant, `Null` included, is left untouched.
    pub fn linear_transform(&mut self, offset: f64, factor: f64) {
        match self {
            FieldValue::Float(v) => *v = (offset + *v as f64 * factor) as f32,
            FieldValue::Double(v) => *v = offset + *v * factor,
            FieldValue::Int(v) => *v = (offset + *v as f64 * factor) as i32,
            _ => {}
        }
    }

    /// Arcseconds → degrees
    pub fn arcsec_to_deg(&mut self) {
        self.linear_transform(0.0, ARCSEC_TO_DEG);
    }

    /// Milliarcseconds → degrees
    pub fn mas_to_deg(&mut self) {
        self.linear_transform(0.0, MAS_TO_DEG);
    }

    /// Turn a `Double` holding a Julian date into a `Datetime`.
    ///
    /// `Null` stays `Null`, so a missing epoch remains missing. Other variants are left
    /// untouched.
    pub fn make_time_from_jd(&mut self) {
        if let FieldValue::Double(jd) = *self {
            *self = FieldValue::Datetime(julian_date_to_unix_time(jd));
        }
    }

    /// Detach the value from the buffer it was parsed from.
    pub fn into_owned(self) -> FieldValue<'static> {
        match self {
            FieldValue::Null => FieldValue::Null,
            FieldValue::Bool(v) => FieldValue::Bool(v),
            FieldValue::Char(v) => FieldValue::Char(v),
            FieldValue::Short(v) => FieldValue::Short(v),
            FieldValue::Int(v) => FieldValue::Int(v),
            FieldValue::Bigint(v) => FieldValue::Bigint(v),
            FieldValue::Float(v) => FieldValue::Float(v),
            FieldValue::Double(v) => FieldValue::Double(v),
            FieldValue::Text(v) => FieldValue::Text(Cow::Owned(v.into_owned())),
            FieldValue::JulianDate(v) => FieldValue::JulianDate(v),
            FieldValue::Date(v) => FieldValue::Date(v),
            FieldValue::Datetime(v) => FieldValue::Datetime(v),
        }
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<u8> for FieldValue<'_> {
    fn from(v: u8) -> Self {
        FieldValue::Char(v)
    }
}

impl From<i16> for FieldValue<'_> {
    fn from(v: i16) -> Self {
        FieldValue::Short(v)
    }
}

impl From<i32> for FieldValue<'_> {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(v: i64) -> Self {
        FieldValue::Bigint(v)
    }
}

impl From<f32> for FieldValue<'_> {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(v: &'a str) -> Self {
        FieldValue::text(v)
    }
}

impl From<String> for FieldValue<'_> {
    fn from(v: String) -> Self {
        FieldValue::Text(Cow::Owned(v.into_bytes()))
    }
}
