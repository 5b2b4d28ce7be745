//! # Bad-record handling
//!
//! Parsers report a malformed fragment as a [`ParseFieldError`]; this module decides,
//! once per run, what such an error does to the record it belongs to.
//!
//! * [`BadRecordPolicy::Report`] – print a diagnostic, store NULL for the offending field
//!   and keep going. The record is still written.
//! * [`BadRecordPolicy::Skip`] – print the record context and abandon the record. Nothing
//!   of it reaches the output stream.
//!
//! The default is `Report`, or `Skip` when the crate is built with the
//! `ignore-bad-records` feature.
//!
//! Diagnostics go to a [`Diagnostics`] writer (stderr unless told otherwise), every line
//! prefixed with `importbooster: `, and are mirrored as `tracing` events.
use std::{
    borrow::Cow,
    fmt,
    io::{self, Write},
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    booster_errors::{BoosterError, ParseFieldError},
    value::FieldValue,
};

/// Prefix of every diagnostic line.
pub const DIAGNOSTIC_PREFIX: &str = "importbooster: ";

/// What a malformed field does to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadRecordPolicy {
    Report,
    Skip,
}

impl Default for BadRecordPolicy {
    fn default() -> Self {
        if cfg!(feature = "ignore-bad-records") {
            BadRecordPolicy::Skip
        } else {
            BadRecordPolicy::Report
        }
    }
}

/// Why a record did not make it to the output.
#[derive(Error, Debug)]
pub enum RecordFailure {
    /// The record was abandoned under [`BadRecordPolicy::Skip`].
    #[error(transparent)]
    Malformed(#[from] ParseFieldError),

    /// The run cannot continue.
    #[error(transparent)]
    Fatal(#[from] BoosterError),
}

/// The diagnostic stream.
pub struct Diagnostics {
    out: Box<dyn Write + Send>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::new(io::stderr())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

impl Diagnostics {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Diagnostics { out: Box::new(out) }
    }

    /// Report a malformed field.
    ///
    /// Under `Report` the context line (if any) is followed by the error detail; under
    /// `Skip` only the context is printed since the whole record is dropped.
    pub fn report_bad_record(
        &mut self,
        policy: BadRecordPolicy,
        context: Option<&str>,
        error: &ParseFieldError,
    ) {
        let message = format_bad_record(policy, context, error);
        if let Err(err) = self.out.write_all(message.as_bytes()) {
            tracing::error!(%err, "unable to write diagnostic");
        }
    }

    /// Print `error` and terminate the process with status 1.
    pub fn die(&mut self, error: &BoosterError) -> ! {
        tracing::error!(%error, "fatal");
        let _ = self.out.write_all(format_fatal(error).as_bytes());
        let _ = self.out.flush();
        std::process::exit(1)
    }
}

/// Text written by [`Diagnostics::report_bad_record`].
pub fn format_bad_record(
    policy: BadRecordPolicy,
    context: Option<&str>,
    error: &ParseFieldError,
) -> String {
    let mut message = String::from(DIAGNOSTIC_PREFIX);
    match context {
        Some(context) => message.push_str(&format!("Bad Record: '{context}'\n")),
        None if policy == BadRecordPolicy::Skip => message.push_str("Bad Record\n"),
        None => {}
    }
    if policy == BadRecordPolicy::Report {
        message.push_str(&format!("{error}\n"));
    }
    message
}

/// Text written by [`Diagnostics::die`].
pub fn format_fatal(error: &BoosterError) -> String {
    format!("{DIAGNOSTIC_PREFIX}{error}\n")
}

/// Collects the fields of one record, applying the bad-record policy as they come in.
#[derive(Debug)]
pub struct RecordBuilder<'a, 'd> {
    policy: BadRecordPolicy,
    context: Option<Cow<'a, str>>,
    fields: SmallVec<[FieldValue<'a>; 16]>,
    reported: usize,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> RecordBuilder<'a, 'd> {
    pub fn new(policy: BadRecordPolicy, diagnostics: &'d mut Diagnostics) -> Self {
        RecordBuilder {
            policy,
            context: None,
            fields: SmallVec::new(),
            reported: 0,
            diagnostics,
        }
    }

    /// Attach the text printed with diagnostics for this record.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Append a parse result.
    ///
    /// # Errors
    /// `RecordFailure::Malformed` if the field is malformed and the policy is `Skip`; the
    /// record must then be dropped.
    pub fn push(
        &mut self,
        parsed: Result<FieldValue<'a>, ParseFieldError>,
    ) -> Result<(), RecordFailure> {
        match parsed {
            Ok(value) => {
                self.fields.push(value);
                Ok(())
            }
            Err(error) => {
                self.diagnostics
                    .report_bad_record(self.policy, self.context.as_deref(), &error);
                match self.policy {
                    BadRecordPolicy::Report => {
                        tracing::warn!(field = self.fields.len(), %error, "malformed field stored as NULL");
                        self.fields.push(FieldValue::Null);
                        self.reported += 1;
                        Ok(())
                    }
                    BadRecordPolicy::Skip => {
                        tracing::debug!(field = self.fields.len(), %error, "record skipped");
                        Err(RecordFailure::Malformed(error))
                    }
                }
            }
        }
    }

    pub fn fields(&self) -> &[FieldValue<'a>] {
        &self.fields
    }

    /// Malformed fields replaced by NULL so far.
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn into_fields(self) -> SmallVec<[FieldValue<'a>; 16]> {
        self.fields
    }
}

#[cfg(test)]
mod policy_test {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::value::ValueKind;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn bad_double() -> ParseFieldError {
        ParseFieldError::invalid_literal(ValueKind::Double, "12a")
    }

    #[test]
    fn test_default_policy_follows_feature() {
        let expected = if cfg!(feature = "ignore-bad-records") {
            BadRecordPolicy::Skip
        } else {
            BadRecordPolicy::Report
        };
        assert_eq!(BadRecordPolicy::default(), expected);
    }

    #[test]
    fn test_report_format() {
        assert_eq!(
            format_bad_record(BadRecordPolicy::Report, Some("12a x"), &bad_double()),
            "importbooster: Bad Record: '12a x'\nInvalid literal for double: '12a'\n"
        );
        assert_eq!(
            format_bad_record(BadRecordPolicy::Report, None, &bad_double()),
            "importbooster: Invalid literal for double: '12a'\n"
        );
        assert_eq!(
            format_bad_record(BadRecordPolicy::Skip, Some("12a x"), &bad_double()),
            "importbooster: Bad Record: '12a x'\n"
        );
        assert_eq!(
            format_fatal(&BoosterError::Fatal("Unknown type code".into())),
            "importbooster: Unknown type code\n"
        );
    }

    #[test]
    fn test_report_stores_null_and_continues() {
        let out = Shared::default();
        let mut diagnostics = Diagnostics::new(out.clone());
        let mut record = RecordBuilder::new(BadRecordPolicy::Report, &mut diagnostics)
            .with_context("12a 3");
        record.push(Err(bad_double())).unwrap();
        record.push(Ok(FieldValue::Int(3))).unwrap();

        assert_eq!(record.fields(), &[FieldValue::Null, FieldValue::Int(3)]);
        assert_eq!(record.reported(), 1);
        assert_eq!(
            out.text(),
            "importbooster: Bad Record: '12a 3'\nInvalid literal for double: '12a'\n"
        );
    }

    #[test]
    fn test_skip_abandons_record() {
        let out = Shared::default();
        let mut diagnostics = Diagnostics::new(out.clone());
        let mut record =
            RecordBuilder::new(BadRecordPolicy::Skip, &mut diagnostics).with_context("12a 3");
        record.push(Ok(FieldValue::Int(1))).unwrap();
        assert!(matches!(
            record.push(Err(bad_double())),
            Err(RecordFailure::Malformed(_))
        ));
        assert_eq!(out.text(), "importbooster: Bad Record: '12a 3'\n");
    }
}
