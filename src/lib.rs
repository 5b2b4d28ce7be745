//! # importbooster
//!
//! Fast bulk ingestion of astronomical catalog dumps into PostgreSQL.
//!
//! Catalog records (fixed-width columns or separated fields) are parsed into typed
//! [`FieldValue`]s and serialized in PostgreSQL's COPY BINARY format, ready to be piped
//! into `COPY table FROM STDIN WITH (FORMAT binary)`.
//!
//! ## Layers
//! -----------------
//! * [`parsers`] – text fragments into values, with NULL sentinels and whitespace handling.
//! * [`value`] – the typed value and its in-place transforms (rescaling, Julian dates).
//! * [`encoder`] – values into COPY BINARY bytes over any [`ByteSink`].
//! * [`policy`] – what a malformed field does to its record.
//! * [`loader`] – a declarative record layout driving all of the above over a reader.
//!
//! ## Example
//! -----------------
//! ```rust
//! use importbooster::{
//!     encoder::CopyBinaryWriter,
//!     parsers::{parse_double, parse_double_with_magic_null},
//! };
//!
//! let line = b"  1.5 NULL";
//! let mut writer = CopyBinaryWriter::new(Vec::new())?;
//! writer.write_tuple(&[
//!     parse_double(line, 0, 5)?,
//!     parse_double_with_magic_null(line, 6, 4, "NULL")?,
//! ])?;
//! writer.finish()?;
//! assert_eq!(writer.tuples_written(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod booster_errors;
pub mod constants;
pub mod conversion;
pub mod encoder;
pub mod loader;
pub mod parsers;
pub mod policy;
pub mod time;
pub mod value;

pub use booster_errors::{BoosterError, ParseFieldError};
pub use encoder::{ByteSink, CopyBinaryWriter, Encoder, TimestampEncoding};
pub use loader::{ColumnSource, ColumnSpec, LoadStats, Loader, LoaderConfig, RecordLayout};
pub use policy::{BadRecordPolicy, Diagnostics, RecordBuilder, RecordFailure};
pub use time::Timestamp;
pub use value::{FieldValue, ValueKind};
