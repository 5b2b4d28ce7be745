//! # Loader
//!
//! A generic record loop: a [`RecordLayout`] describes where every column of a
//! line lives and what it becomes, and a [`Loader`] applies it to every line of a
//! reader, writing one COPY BINARY tuple per accepted record.
//!
//! Columns come from three kinds of [`ColumnSource`]:
//!
//! * `Fixed { start, len }` – a byte range of the line, parsed with the fixed-column
//!   parsers (`format: "hms"`/`"dms"` reads a sexagesimal angle into a `double`).
//! * `Char { index }` – a single byte (`"char"`, or a blank-means-false `boolean`).
//! * `Token { index }` – the n-th field of a separated line, read by the generic scanner.
//!
//! Date and timestamp columns take an optional strftime-style `format`. A numeric
//! column may be rescaled (`value * factor + offset`) and a `double` holding a Julian
//! date may be turned into a timestamp with `from_julian_date`. Rescaling comes first,
//! so an MJD column reads as `scale: { offset: 2400000.5 }` plus `from_julian_date`.
//!
//! Layouts deserialize with serde:
//!
//! ```json
//! { "columns": [
//!     { "name": "ra",    "kind": "double", "source": { "type": "fixed", "start": 0, "len": 11 }, "format": "hms" },
//!     { "name": "mag",   "kind": "float",  "source": { "type": "fixed", "start": 12, "len": 5 }, "null_value": "99.99" },
//!     { "name": "epoch", "kind": "datetime", "source": { "type": "token", "index": 3 } }
//! ] }
//! ```
use std::{
    fs::File,
    io::{BufRead, BufReader},
};

use camino::Utf8Path;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    booster_errors::{BoosterError, ParseFieldError},
    encoder::{ByteSink, CopyBinaryWriter, Encoder, TimestampEncoding},
    parsers::{
        extract_field, parse_blank_boolean, parse_char, parse_dms_angle, parse_hms_angle,
        parse_number, parse_string, parse_string_with_magic_null, strip_whitespace,
        tokenize_non_merging, FieldScan, TimePattern,
    },
    policy::{BadRecordPolicy, Diagnostics, RecordBuilder, RecordFailure},
    value::{FieldValue, ValueKind},
};

/// Run-wide loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub policy: BadRecordPolicy,
    /// Field separator for `Token` columns.
    pub separator: String,
    /// Lines made only of whitespace are not records.
    pub skip_blank_lines: bool,
    /// Sentinel read as NULL by every `Token` column without its own `null_value`.
    pub auto_null: Option<String>,
    pub timestamp: TimestampEncoding,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            policy: BadRecordPolicy::default(),
            separator: "|".to_string(),
            skip_blank_lines: true,
            auto_null: None,
            timestamp: TimestampEncoding::default(),
        }
    }
}

/// Where the text of a column comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnSource {
    Fixed { start: usize, len: usize },
    Char { index: usize },
    Token { index: usize },
}

/// `value * factor + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "unit_factor")]
    pub factor: f64,
}

fn unit_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ValueKind,
    pub source: ColumnSource,
    #[serde(default)]
    pub null_value: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub scale: Option<LinearScale>,
    #[serde(default)]
    pub from_julian_date: bool,
}

impl ColumnSpec {
    fn new(name: &str, kind: ValueKind, source: ColumnSource) -> Self {
        ColumnSpec {
            name: name.to_string(),
            kind,
            source,
            null_value: None,
            format: None,
            scale: None,
            from_julian_date: false,
        }
    }

    pub fn fixed(name: &str, kind: ValueKind, start: usize, len: usize) -> Self {
        Self::new(name, kind, ColumnSource::Fixed { start, len })
    }

    pub fn at(name: &str, kind: ValueKind, index: usize) -> Self {
        Self::new(name, kind, ColumnSource::Char { index })
    }

    pub fn token(name: &str, kind: ValueKind, index: usize) -> Self {
        Self::new(name, kind, ColumnSource::Token { index })
    }

    pub fn with_null_value(mut self, null_value: &str) -> Self {
        self.null_value = Some(null_value.to_string());
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn with_scale(mut self, offset: f64, factor: f64) -> Self {
        self.scale = Some(LinearScale { offset, factor });
        self
    }

    pub fn from_julian_date(mut self) -> Self {
        self.from_julian_date = true;
        self
    }
}

/// The ordered columns of a record; one tuple field per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordLayout {
    pub columns: Vec<ColumnSpec>,
}

impl RecordLayout {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        RecordLayout { columns }
    }
}

/// Counters of one [`Loader::load`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Non-blank lines seen.
    pub records_read: u64,
    pub tuples_written: u64,
    /// Records dropped under [`BadRecordPolicy::Skip`].
    pub records_skipped: u64,
    /// Malformed fields replaced by NULL under [`BadRecordPolicy::Report`].
    pub fields_reported: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Angle {
    Hours,
    Degrees,
}

#[derive(Debug)]
struct Column {
    spec: ColumnSpec,
    pattern: Option<TimePattern>,
    angle: Option<Angle>,
}

impl Column {
    fn compile(spec: ColumnSpec) -> Result<Self, BoosterError> {
        let mut column = Column {
            spec,
            pattern: None,
            angle: None,
        };
        let Some(format) = column.spec.format.as_deref() else {
            return Ok(column);
        };
        match (column.spec.kind, format) {
            (ValueKind::Date | ValueKind::Datetime, _) => {
                column.pattern = Some(TimePattern::new(format)?);
            }
            (ValueKind::Double, "hms") => column.angle = Some(Angle::Hours),
            (ValueKind::Double, "dms") => column.angle = Some(Angle::Degrees),
            (kind, _) => {
                return Err(BoosterError::InvalidPattern(format!(
                    "format '{format}' does not apply to {kind} column {}",
                    column.spec.name
                )))
            }
        }
        Ok(column)
    }

    fn parse<'a>(
        &self,
        line: &'a [u8],
        tokens: &[&'a [u8]],
        auto_null: Option<&str>,
    ) -> Result<FieldValue<'a>, ParseFieldError> {
        let mut value = match self.spec.source {
            ColumnSource::Fixed { start, len } => self.parse_range(line, start, len)?,
            ColumnSource::Char { index } => match self.spec.kind {
                ValueKind::Bool => parse_blank_boolean(line, index),
                ValueKind::Char => parse_char(line, index),
                _ => self.parse_range(line, index, 1)?,
            },
            ColumnSource::Token { index } => {
                let token = tokens.get(index).copied().unwrap_or_default();
                self.parse_token(token, auto_null)?
            }
        };
        if let Some(scale) = self.spec.scale {
            value.linear_transform(scale.offset, scale.factor);
        }
        if self.spec.from_julian_date {
            value.make_time_from_jd();
        }
        Ok(value)
    }

    fn parse_range<'a>(
        &self,
        line: &'a [u8],
        start: usize,
        len: usize,
    ) -> Result<FieldValue<'a>, ParseFieldError> {
        let null_value = self.spec.null_value.as_deref();
        if null_value.is_some_and(|n| extract_field(line, start, len) == n.as_bytes()) {
            return Ok(FieldValue::Null);
        }
        match (self.spec.kind, self.angle) {
            (ValueKind::Null, _) => Ok(FieldValue::Null),
            (ValueKind::Bool, _) => Ok(parse_blank_boolean(line, start)),
            (ValueKind::Char, _) => Ok(parse_char(line, start)),
            (ValueKind::Text, _) => Ok(match null_value {
                Some(magic) => parse_string_with_magic_null(line, start, len, magic),
                None => parse_string(line, start, len),
            }),
            (ValueKind::Short, _) => parse_number::<i16>(line, start, len, null_value),
            (ValueKind::Int, _) => parse_number::<i32>(line, start, len, null_value),
            (ValueKind::Bigint, _) => parse_number::<i64>(line, start, len, null_value),
            (ValueKind::Float, _) => parse_number::<f32>(line, start, len, null_value),
            (ValueKind::Double, Some(Angle::Hours)) => parse_hms_angle(line, start, len),
            (ValueKind::Double, Some(Angle::Degrees)) => parse_dms_angle(line, start, len),
            (ValueKind::Double, None) => parse_number::<f64>(line, start, len, null_value),
            (ValueKind::JulianDate | ValueKind::Date | ValueKind::Datetime, _) => {
                self.scanner(null_value).scan(extract_field(line, start, len))
            }
        }
    }

    fn parse_token<'a>(
        &self,
        token: &'a [u8],
        auto_null: Option<&str>,
    ) -> Result<FieldValue<'a>, ParseFieldError> {
        let null_value = self.spec.null_value.as_deref().or(auto_null);
        match self.angle {
            Some(angle) if !null_value.is_some_and(|n| strip_whitespace(token) == n.as_bytes()) => {
                match angle {
                    Angle::Hours => parse_hms_angle(token, 0, token.len()),
                    Angle::Degrees => parse_dms_angle(token, 0, token.len()),
                }
            }
            Some(_) => Ok(FieldValue::Null),
            None => self.scanner(null_value).scan(token),
        }
    }

    fn scanner<'p>(&'p self, null_value: Option<&'p str>) -> FieldScan<'p> {
        FieldScan {
            name: &self.spec.name,
            kind: self.spec.kind,
            pattern: self.pattern.as_ref(),
            auto_null: null_value,
        }
    }
}

/// Drives parsing and encoding over a line reader.
#[derive(Debug)]
pub struct Loader {
    config: LoaderConfig,
    columns: Vec<Column>,
    has_tokens: bool,
    diagnostics: Diagnostics,
}

impl Loader {
    /// Compile `layout` (time patterns and angle formats) for repeated use.
    ///
    /// # Errors
    /// `BoosterError::InvalidPattern` for an unsupported format.
    pub fn new(config: LoaderConfig, layout: RecordLayout) -> Result<Self, BoosterError> {
        tracing::debug!(
            columns = %layout.columns.iter().map(|c| &c.name).join(","),
            policy = ?config.policy,
            "compiling record layout"
        );
        let columns = layout
            .columns
            .into_iter()
            .map(Column::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let has_tokens = columns
            .iter()
            .any(|c| matches!(c.spec.source, ColumnSource::Token { .. }));
        Ok(Loader {
            config,
            columns,
            has_tokens,
            diagnostics: Diagnostics::default(),
        })
    }

    /// Send bad-record diagnostics somewhere else than stderr.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read every line of `reader` and write a complete COPY BINARY stream to `sink`.
    ///
    /// Arguments
    /// -----------------
    /// * `reader` – line source; `\n` and `\r\n` endings are removed.
    /// * `sink` – receives the header, one tuple per accepted record and the trailer.
    ///
    /// Return
    /// ----------
    /// * The run counters. Malformed records never fail the run; I/O errors and values
    ///   without a wire representation do, leaving a truncated stream behind.
    pub fn load<R: BufRead, S: ByteSink>(
        &mut self,
        mut reader: R,
        sink: S,
    ) -> Result<LoadStats, BoosterError> {
        let mut writer =
            CopyBinaryWriter::with_encoder(sink, Encoder::new(self.config.timestamp))?;
        let mut stats = LoadStats::default();
        let mut buffer = Vec::new();

        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            let line = trim_line_end(&buffer);
            if self.config.skip_blank_lines && strip_whitespace(line).is_empty() {
                continue;
            }
            stats.records_read += 1;

            match self.process_record(line, &mut writer) {
                Ok(reported) => stats.fields_reported += reported as u64,
                Err(RecordFailure::Malformed(_)) => stats.records_skipped += 1,
                Err(RecordFailure::Fatal(err)) => return Err(err),
            }
        }

        writer.finish()?;
        stats.tuples_written = writer.tuples_written();
        tracing::info!(
            records = stats.records_read,
            tuples = stats.tuples_written,
            skipped = stats.records_skipped,
            reported = stats.fields_reported,
            "load finished"
        );
        Ok(stats)
    }

    /// [`load`](Self::load) on a file.
    pub fn load_file<S: ByteSink>(
        &mut self,
        path: &Utf8Path,
        sink: S,
    ) -> Result<LoadStats, BoosterError> {
        tracing::debug!(%path, "loading");
        let file = File::open(path)?;
        self.load(BufReader::new(file), sink)
    }

    /// Parse one record and write it; returns the number of fields stored as NULL
    /// after a diagnostic.
    fn process_record<S: ByteSink>(
        &mut self,
        line: &[u8],
        writer: &mut CopyBinaryWriter<S>,
    ) -> Result<usize, RecordFailure> {
        let Loader {
            config,
            columns,
            has_tokens,
            diagnostics,
        } = self;

        let mut tokens: SmallVec<[&[u8]; 32]> = SmallVec::new();
        if *has_tokens {
            let mut splitter = tokenize_non_merging(line, config.separator.as_bytes());
            tokens.extend(splitter.by_ref());
            let tail = splitter.remainder();
            if !tail.is_empty() {
                tokens.push(tail);
            }
        }

        let mut record = RecordBuilder::new(config.policy, diagnostics)
            .with_context(String::from_utf8_lossy(line));
        for column in columns.iter() {
            record.push(column.parse(line, &tokens, config.auto_null.as_deref()))?;
        }

        writer.write_tuple(record.fields())?;
        Ok(record.reported())
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod loader_test {
    use std::io::{self, Write};

    use super::*;

    fn quiet(loader: Loader) -> Loader {
        loader.with_diagnostics(Diagnostics::new(io::sink()))
    }

    fn layout() -> RecordLayout {
        RecordLayout::new(vec![
            ColumnSpec::fixed("a", ValueKind::Double, 0, 5),
            ColumnSpec::fixed("b", ValueKind::Double, 6, 4).with_null_value("NULL"),
        ])
    }

    #[test]
    fn test_trim_line_end() {
        assert_eq!(trim_line_end(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_end(b"abc\n"), b"abc");
        assert_eq!(trim_line_end(b"abc"), b"abc");
    }

    #[test]
    fn test_scale_applies_before_julian_date() {
        let column = Column::compile(
            ColumnSpec::fixed("epoch", ValueKind::Double, 0, 7)
                .with_scale(2_400_000.5, 1.0)
                .from_julian_date(),
        )
        .unwrap();
        assert_eq!(
            column.parse(b"51544.0", &[], None),
            Ok(FieldValue::Datetime(crate::time::reference_epoch()))
        );

        let layout = RecordLayout::new(vec![ColumnSpec::fixed("epoch", ValueKind::Double, 0, 7)
            .with_scale(2_400_000.5, 1.0)
            .from_julian_date()]);
        let mut loader = quiet(Loader::new(LoaderConfig::default(), layout).unwrap());
        let mut out = Vec::new();
        loader.load(&b"51544.0\n51544.5\n"[..], &mut out).unwrap();
        let tuples = &out[19..out.len() - 2];
        assert_eq!(&tuples[..14], &[0, 1, 0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&tuples[14..20], &[0, 1, 0, 0, 0, 8]);
        assert_eq!(
            i64::from_be_bytes(tuples[20..28].try_into().unwrap()),
            43_200 * 1_000_000
        );
    }

    #[test]
    fn test_column_parsing() {
        let column = Column::compile(ColumnSpec::fixed("a", ValueKind::Double, 0, 5)).unwrap();
        assert_eq!(
            column.parse(b"  1.5 NULL", &[], None),
            Ok(FieldValue::Double(1.5))
        );

        let column = Column::compile(
            ColumnSpec::fixed("ra", ValueKind::Double, 0, 11).with_format("hms"),
        )
        .unwrap();
        assert_eq!(
            column.parse(b"01 00 00.00", &[], None),
            Ok(FieldValue::Double(15.0))
        );

        let column = Column::compile(
            ColumnSpec::token("pm", ValueKind::Double, 1).with_scale(0.0, 0.001),
        )
        .unwrap();
        let tokens: [&[u8]; 2] = [b"x", b"2000"];
        assert_eq!(column.parse(b"", &tokens, None), Ok(FieldValue::Double(2.0)));

        let column = Column::compile(ColumnSpec::token("c", ValueKind::Int, 5)).unwrap();
        assert_eq!(column.parse(b"", &tokens, None), Ok(FieldValue::Null));

        let column = Column::compile(ColumnSpec::at("flag", ValueKind::Bool, 3)).unwrap();
        assert_eq!(column.parse(b"abc", &[], None), Ok(FieldValue::Bool(false)));
    }

    #[test]
    fn test_format_must_fit_kind() {
        assert!(matches!(
            Column::compile(ColumnSpec::fixed("n", ValueKind::Int, 0, 3).with_format("hms")),
            Err(BoosterError::InvalidPattern(_))
        ));
        assert!(matches!(
            Column::compile(ColumnSpec::fixed("d", ValueKind::Date, 0, 3).with_format("%Q")),
            Err(BoosterError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_blank_lines_are_not_records() {
        let mut loader = quiet(Loader::new(LoaderConfig::default(), layout()).unwrap());
        let mut out = Vec::new();
        let stats = loader
            .load(&b"  1.5 NULL   AB\n\n   \n"[..], &mut out)
            .unwrap();
        assert_eq!(stats.records_read, 1);
        assert_eq!(stats.tuples_written, 1);
        assert_eq!(out.len(), 19 + 2 + 12 + 4 + 2);
    }

    #[test]
    fn test_policies() {
        let input = &b"  1.5 NULL\n 12a  2.0\n"[..];

        let config = LoaderConfig {
            policy: BadRecordPolicy::Report,
            ..LoaderConfig::default()
        };
        let mut loader = quiet(Loader::new(config, layout()).unwrap());
        let stats = loader.load(input, io::sink()).unwrap();
        assert_eq!(
            stats,
            LoadStats {
                records_read: 2,
                tuples_written: 2,
                records_skipped: 0,
                fields_reported: 1,
            }
        );

        let config = LoaderConfig {
            policy: BadRecordPolicy::Skip,
            ..LoaderConfig::default()
        };
        let mut loader = quiet(Loader::new(config, layout()).unwrap());
        let stats = loader.load(input, io::sink()).unwrap();
        assert_eq!(stats.tuples_written, 1);
        assert_eq!(stats.records_skipped, 1);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("importbooster-{}.txt", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(b"a|1|\nb||\n").unwrap();
        drop(file);

        let layout = RecordLayout::new(vec![
            ColumnSpec::token("name", ValueKind::Text, 0),
            ColumnSpec::token("n", ValueKind::Int, 1),
        ]);
        let mut loader = quiet(Loader::new(LoaderConfig::default(), layout).unwrap());
        let mut out = Vec::new();
        let path = camino::Utf8PathBuf::from_path_buf(path).unwrap();
        let stats = loader.load_file(&path, &mut out).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(stats.tuples_written, 2);
        // "b" then NULL
        assert!(out.ends_with(&[0, 2, 0, 0, 0, 1, b'b', 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]));
    }
}
