use thiserror::Error;

use crate::value::ValueKind;

/// Field-level parsing errors.
///
/// A `ParseFieldError` marks the surrounding record as **malformed**; whether that
/// aborts the record or is only reported is decided by
/// [`BadRecordPolicy`](crate::policy::BadRecordPolicy) at the record-loop boundary.
///
/// Variants
/// -----------------
/// * `InvalidLiteral` – A numeric (or sexagesimal) fragment was not fully consumed by the parser.
/// * `Unscannable` – The generic formatted scanner could not interpret a named field.
/// * `BoolNotScannable` – Booleans have no textual form understood by the generic scanner.
/// * `NotUtf8` – The fragment is not valid UTF-8 and cannot be interpreted as a number or date.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseFieldError {
    #[error("Invalid literal for {kind}: '{literal}'")]
    InvalidLiteral { kind: ValueKind, literal: String },

    #[error("fieldscanf: Can't parse field {field} (value '{literal}')")]
    Unscannable { field: String, literal: String },

    #[error("Can't fieldscanf bools at {field}")]
    BoolNotScannable { field: String },

    #[error("Non UTF-8 input for {kind}: '{literal}'")]
    NotUtf8 { kind: ValueKind, literal: String },
}

impl ParseFieldError {
    pub(crate) fn invalid_literal(kind: ValueKind, literal: &str) -> Self {
        ParseFieldError::InvalidLiteral {
            kind,
            literal: literal.to_string(),
        }
    }

    pub(crate) fn not_utf8(kind: ValueKind, raw: &[u8]) -> Self {
        ParseFieldError::NotUtf8 {
            kind,
            literal: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

/// Unrecoverable conditions.
///
/// A `BoosterError` ends the run: the sink may hold a partial stream and it is up to
/// the caller to discard it. Top-level code usually hands it to
/// [`Diagnostics::die`](crate::policy::Diagnostics::die).
#[derive(Error, Debug)]
pub enum BoosterError {
    #[error("Unable to perform I/O operation: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid time pattern: {0}")]
    InvalidPattern(String),

    #[error("Value out of range for {kind}: {detail}")]
    ValueOutOfRange { kind: ValueKind, detail: String },

    #[error("Too many fields for one tuple: {0}")]
    TooManyFields(usize),

    #[error("COPY stream misuse: {0}")]
    StreamState(String),

    #[error("Bad Record: '{}': {source}", context.as_deref().unwrap_or(""))]
    MalformedRecord {
        context: Option<String>,
        source: ParseFieldError,
    },

    #[error("{0}")]
    Fatal(String),
}

impl PartialEq for BoosterError {
    fn eq(&self, other: &Self) -> bool {
        use BoosterError::*;
        match (self, other) {
            // io::Error is not comparable: equal if same variant
            (Io(_), Io(_)) => true,

            (InvalidPattern(a), InvalidPattern(b)) => a == b,
            (
                ValueOutOfRange {
                    kind: ka,
                    detail: da,
                },
                ValueOutOfRange {
                    kind: kb,
                    detail: db,
                },
            ) => ka == kb && da == db,
            (TooManyFields(a), TooManyFields(b)) => a == b,
            (StreamState(a), StreamState(b)) => a == b,
            (
                MalformedRecord {
                    context: ca,
                    source: sa,
                },
                MalformedRecord {
                    context: cb,
                    source: sb,
                },
            ) => ca == cb && sa == sb,
            (Fatal(a), Fatal(b)) => a == b,

            _ => false,
        }
    }
}
