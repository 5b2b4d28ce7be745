//! # COPY BINARY encoder
//!
//! Serialization of [`FieldValue`]s into PostgreSQL's binary bulk-load format
//! (`COPY … FROM … WITH (FORMAT binary)`).
//!
//! ## Stream layout
//! -----------------
//! ```text
//! header   "PGCOPY\n\xff\r\n\0"  i32 flags = 0  i32 extension length = 0
//! tuple*   i16 field count, then per field:
//!            i32 length (-1 for NULL, no payload)   payload[length]
//! trailer  i16 -1
//! ```
//! Every integer is big-endian.
//!
//! ## Per-kind payloads
//! -----------------
//! | Value        | Length | Payload                                                   |
//! |--------------|--------|-----------------------------------------------------------|
//! | `Bool`/`Char`| 1      | the byte                                                  |
//! | `Short`      | 2      | `i16`                                                     |
//! | `Int`        | 4      | `i32`                                                     |
//! | `Bigint`     | 8      | `i64`                                                     |
//! | `Float`      | 4      | IEEE-754 bits, big-endian                                 |
//! | `Double`     | 8      | IEEE-754 bits, big-endian                                 |
//! | `Text`       | n      | the raw bytes, no terminator                              |
//! | `JulianDate` | 4      | `i32` days since 2000-01-01, `round(jd - 2451545.0)`      |
//! | `Date`       | 4      | `i32` whole days since 2000-01-01 (truncated)             |
//! | `Datetime`   | 8      | see [`TimestampEncoding`]                                 |
//!
//! Floating-point payloads are the native bit patterns mirrored on little-endian hosts,
//! which is exactly what `to_be_bytes` produces.
//!
//! Fields are written as soon as they are encoded: a failure in the middle of a tuple
//! leaves a truncated stream behind, to be discarded by the caller.
pub mod sink;
pub mod writer;

use serde::{Deserialize, Serialize};

pub use sink::ByteSink;
pub use writer::CopyBinaryWriter;

use crate::{
    booster_errors::BoosterError,
    constants::{COPY_SIGNATURE, END_OF_STREAM, JD_J2000, NULL_FIELD_LENGTH, SECONDS_PER_DAY},
    time::{reference_epoch, Timestamp},
    value::{FieldValue, ValueKind},
};

/// Wire representation of `timestamp` values.
///
/// A server built with integer datetimes (the default since PostgreSQL 8.4, and the only
/// option since 10) expects `Int64Micros`; `Float8Seconds` is for servers built with
/// `--disable-integer-datetimes`. The two are not interchangeable and nothing in the
/// stream tells them apart, so one encoding is used for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampEncoding {
    /// `i64` microseconds since 2000-01-01T00:00:00
    #[default]
    Int64Micros,
    /// `f64` seconds since 2000-01-01T00:00:00
    Float8Seconds,
}

/// Stateless field/tuple encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoder {
    pub timestamp: TimestampEncoding,
}

impl Encoder {
    pub fn new(timestamp: TimestampEncoding) -> Self {
        Encoder { timestamp }
    }

    /// Write the 19-byte stream header.
    pub fn write_header<S: ByteSink + ?Sized>(&self, sink: &mut S) -> Result<(), BoosterError> {
        sink.put(COPY_SIGNATURE)?;
        sink.put(&0_i32.to_be_bytes())?;
        sink.put(&0_i32.to_be_bytes())
    }

    /// Write the stream trailer.
    pub fn write_end_marker<S: ByteSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<(), BoosterError> {
        sink.put(&END_OF_STREAM.to_be_bytes())
    }

    /// Write the field count followed by every field, in order.
    pub fn write_tuple<S: ByteSink + ?Sized>(
        &self,
        values: &[FieldValue<'_>],
        sink: &mut S,
    ) -> Result<(), BoosterError> {
        let count =
            i16::try_from(values.len()).map_err(|_| BoosterError::TooManyFields(values.len()))?;
        sink.put(&count.to_be_bytes())?;
        values
            .iter()
            .try_for_each(|value| self.write_field(value, sink))
    }

    /// Write one length-framed field.
    pub fn write_field<S: ByteSink + ?Sized>(
        &self,
        value: &FieldValue<'_>,
        sink: &mut S,
    ) -> Result<(), BoosterError> {
        match value {
            FieldValue::Null => sink.put(&NULL_FIELD_LENGTH.to_be_bytes()),
            FieldValue::Bool(v) => framed(sink, &[u8::from(*v)]),
            FieldValue::Char(v) => framed(sink, &[*v]),
            FieldValue::Short(v) => framed(sink, &v.to_be_bytes()),
            FieldValue::Int(v) => framed(sink, &v.to_be_bytes()),
            FieldValue::Bigint(v) => framed(sink, &v.to_be_bytes()),
            FieldValue::Float(v) => framed(sink, &v.to_be_bytes()),
            FieldValue::Double(v) => framed(sink, &v.to_be_bytes()),
            FieldValue::Text(bytes) => framed(sink, bytes),
            FieldValue::JulianDate(jd) => {
                framed(sink, &julian_date_to_days(*jd)?.to_be_bytes())
            }
            FieldValue::Date(t) => framed(sink, &date_to_days(*t)?.to_be_bytes()),
            FieldValue::Datetime(t) => match self.timestamp {
                TimestampEncoding::Int64Micros => {
                    framed(sink, &datetime_to_micros(*t)?.to_be_bytes())
                }
                TimestampEncoding::Float8Seconds => {
                    let seconds = t.seconds_since(reference_epoch()) as f64;
                    framed(sink, &seconds.to_be_bytes())
                }
            },
        }
    }
}

fn framed<S: ByteSink + ?Sized>(sink: &mut S, payload: &[u8]) -> Result<(), BoosterError> {
    let length = i32::try_from(payload.len()).map_err(|_| BoosterError::ValueOutOfRange {
        kind: ValueKind::Text,
        detail: format!("{} bytes do not fit one field", payload.len()),
    })?;
    sink.put(&length.to_be_bytes())?;
    sink.put(payload)
}

/// Whole days between 2000-01-01 and a Julian date, halves rounded away from zero.
fn julian_date_to_days(jd: f64) -> Result<i32, BoosterError> {
    let days = (jd - JD_J2000).round();
    if days >= i32::MIN as f64 && days <= i32::MAX as f64 {
        Ok(days as i32)
    } else {
        Err(BoosterError::ValueOutOfRange {
            kind: ValueKind::JulianDate,
            detail: jd.to_string(),
        })
    }
}

fn date_to_days(t: Timestamp) -> Result<i32, BoosterError> {
    let days = t.seconds_since(reference_epoch()) / SECONDS_PER_DAY;
    i32::try_from(days).map_err(|_| BoosterError::ValueOutOfRange {
        kind: ValueKind::Date,
        detail: format!("{days} days from 2000-01-01"),
    })
}

fn datetime_to_micros(t: Timestamp) -> Result<i64, BoosterError> {
    let seconds = t.seconds_since(reference_epoch());
    seconds
        .checked_mul(1_000_000)
        .ok_or_else(|| BoosterError::ValueOutOfRange {
            kind: ValueKind::Datetime,
            detail: format!("{seconds} s from 2000-01-01"),
        })
}

/// [`Encoder::write_header`] with the default encoder.
pub fn write_header<S: ByteSink + ?Sized>(sink: &mut S) -> Result<(), BoosterError> {
    Encoder::default().write_header(sink)
}

/// [`Encoder::write_end_marker`] with the default encoder.
pub fn write_end_marker<S: ByteSink + ?Sized>(sink: &mut S) -> Result<(), BoosterError> {
    Encoder::default().write_end_marker(sink)
}

/// [`Encoder::write_tuple`] with the default encoder.
pub fn write_tuple<S: ByteSink + ?Sized>(
    values: &[FieldValue<'_>],
    sink: &mut S,
) -> Result<(), BoosterError> {
    Encoder::default().write_tuple(values, sink)
}

/// [`Encoder::write_field`] with the default encoder.
pub fn write_field<S: ByteSink + ?Sized>(
    value: &FieldValue<'_>,
    sink: &mut S,
) -> Result<(), BoosterError> {
    Encoder::default().write_field(value, sink)
}
