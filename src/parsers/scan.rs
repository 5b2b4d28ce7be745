//! # Generic formatted field scanner
//!
//! [`FieldScan`] converts a whole text token (typically one field of a delimited line)
//! into a value of a target [`ValueKind`]. Dates and timestamps are read with a
//! strftime-style [`TimePattern`] that must consume the entire token.
//!
//! The scanner applies, in order:
//! 1. whitespace stripping;
//! 2. `Null` for an empty token, whatever the target kind;
//! 3. `Null` for a token equal to the optional auto-NULL sentinel;
//! 4. the kind-specific conversion.
//!
//! Failures name the field being scanned: `fieldscanf: Can't parse field <name> (value
//! '<token>')`.
use std::{borrow::Cow, fmt, str::FromStr, sync::LazyLock};

use regex::{Captures, Regex};

use crate::{
    booster_errors::{BoosterError, ParseFieldError},
    constants::SECONDS_PER_DAY,
    parsers::fixed::{parse_literal, strip_whitespace, NumericField},
    time::Timestamp,
    value::{FieldValue, ValueKind},
};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A compiled strftime-style pattern for reading dates and times.
///
/// Supported directives
/// -----------------
/// * `%Y` year (up to 4 digits, optional sign), `%y` two-digit year (`69..=99` → 19xx, else 20xx)
/// * `%m` month, `%d`/`%e` day of month, `%j` day of year
/// * `%H` hour, `%M` minute, `%S` second
/// * `%b`/`%h`/`%B` month name, abbreviated or full, any case
/// * `%F` = `%Y-%m-%d`, `%T` = `%H:%M:%S`, `%D` = `%m/%d/%y`
/// * `%n`, `%t` and any blank in the pattern match a run of zero or more blanks
/// * `%%` a literal percent sign
///
/// Fields absent from the pattern default to 1900-01-01 00:00:00.
#[derive(Debug, Clone)]
pub struct TimePattern {
    format: String,
    regex: Regex,
}

impl TimePattern {
    pub fn new(format: &str) -> Result<Self, BoosterError> {
        let mut body = String::from("^");
        translate(format, &mut body)?;
        body.push('$');
        let regex = Regex::new(&body)
            .map_err(|e| BoosterError::InvalidPattern(format!("{format}: {e}")))?;
        Ok(TimePattern {
            format: format.to_string(),
            regex,
        })
    }

    /// The strftime pattern this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.format
    }

    /// Read `text` as an instant; `None` unless the whole text matches and names an
    /// existing date and time.
    pub fn scan(&self, text: &str) -> Option<Timestamp> {
        let caps = self.regex.captures(text)?;

        let year = match (number::<i32>(&caps, "Y"), number::<i32>(&caps, "y")) {
            (Some(year), _) => year,
            (None, Some(short)) if short >= 69 => 1900 + short,
            (None, Some(short)) => 2000 + short,
            (None, None) => 1900,
        };
        let hour = number(&caps, "H").unwrap_or(0);
        let minute = number(&caps, "M").unwrap_or(0);
        let second = number(&caps, "S").unwrap_or(0);

        if let Some(day_of_year) = number::<i64>(&caps, "j") {
            if !(1..=366).contains(&day_of_year) {
                return None;
            }
            let new_year = Timestamp::from_calendar(year, 1, 1, hour, minute, second)?;
            let shifted = new_year.unix_seconds() + (day_of_year - 1) * SECONDS_PER_DAY;
            return Some(Timestamp::from_unix_seconds(shifted));
        }

        let month = match (number(&caps, "m"), caps.name("b")) {
            (Some(month), _) => month,
            (None, Some(name)) => month_from_name(name.as_str())?,
            (None, None) => 1,
        };
        let day = number(&caps, "d").unwrap_or(1);

        Timestamp::from_calendar(year, month, day, hour, minute, second)
    }
}

impl FromStr for TimePattern {
    type Err = BoosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimePattern::new(s)
    }
}

impl fmt::Display for TimePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format)
    }
}

fn translate(format: &str, out: &mut String) -> Result<(), BoosterError> {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            out.push_str(r"\s*");
            continue;
        }
        if c != '%' {
            out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            continue;
        }
        let directive = chars
            .next()
            .ok_or_else(|| BoosterError::InvalidPattern(format!("{format}: dangling '%'")))?;
        match directive {
            'Y' => out.push_str(r"(?P<Y>[+-]?\d{1,4})"),
            'y' => out.push_str(r"(?P<y>\d{1,2})"),
            'm' => out.push_str(r"(?P<m>\d{1,2})"),
            'd' => out.push_str(r"(?P<d>\d{1,2})"),
            'e' => out.push_str(r"\s*(?P<d>\d{1,2})"),
            'j' => out.push_str(r"(?P<j>\d{1,3})"),
            'H' => out.push_str(r"(?P<H>\d{1,2})"),
            'M' => out.push_str(r"(?P<M>\d{1,2})"),
            'S' => out.push_str(r"(?P<S>\d{1,2})"),
            'b' | 'h' | 'B' => out.push_str(r"(?P<b>[A-Za-z]{3,9})"),
            'F' => translate("%Y-%m-%d", out)?,
            'T' => translate("%H:%M:%S", out)?,
            'D' => translate("%m/%d/%y", out)?,
            'n' | 't' => out.push_str(r"\s*"),
            '%' => out.push('%'),
            other => {
                return Err(BoosterError::InvalidPattern(format!(
                    "{format}: unsupported directive '%{other}'"
                )))
            }
        }
    }
    Ok(())
}

fn number<T: FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|full| *full == lower || (lower.len() == 3 && full.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

static ISO_DATE: LazyLock<Option<TimePattern>> =
    LazyLock::new(|| TimePattern::new("%Y-%m-%d").ok());

static ISO_DATETIME: LazyLock<Option<TimePattern>> =
    LazyLock::new(|| TimePattern::new("%Y-%m-%dT%H:%M:%S").ok());

/// Scan instructions for one field.
///
/// Construct with [`FieldScan::new`] and refine with the `with_*` builders. Dates and
/// timestamps without an explicit pattern are read as ISO 8601 (`%Y-%m-%d` and
/// `%Y-%m-%dT%H:%M:%S`).
#[derive(Debug, Clone, Copy)]
pub struct FieldScan<'p> {
    pub name: &'p str,
    pub kind: ValueKind,
    pub pattern: Option<&'p TimePattern>,
    pub auto_null: Option<&'p str>,
}

impl<'p> FieldScan<'p> {
    pub fn new(name: &'p str, kind: ValueKind) -> Self {
        FieldScan {
            name,
            kind,
            pattern: None,
            auto_null: None,
        }
    }

    pub fn with_pattern(mut self, pattern: &'p TimePattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_auto_null(mut self, sentinel: &'p str) -> Self {
        self.auto_null = Some(sentinel);
        self
    }

    /// Convert `token` into a value of the target kind.
    pub fn scan<'a>(&self, token: &'a [u8]) -> Result<FieldValue<'a>, ParseFieldError> {
        let input = strip_whitespace(token);
        if input.is_empty() {
            return Ok(FieldValue::Null);
        }
        if self.auto_null.is_some_and(|s| input == s.as_bytes()) {
            return Ok(FieldValue::Null);
        }

        match self.kind {
            ValueKind::Null => Ok(FieldValue::Null),
            ValueKind::Bool => Err(ParseFieldError::BoolNotScannable {
                field: self.name.to_string(),
            }),
            ValueKind::Char => Ok(FieldValue::Char(input[0])),
            ValueKind::Text => Ok(FieldValue::Text(Cow::Borrowed(input))),
            ValueKind::Short => self.number::<i16>(input),
            ValueKind::Int => self.number::<i32>(input),
            ValueKind::Bigint => self.number::<i64>(input),
            ValueKind::Float => self.number::<f32>(input),
            ValueKind::Double => self.number::<f64>(input),
            ValueKind::JulianDate => match self.number::<f64>(input)? {
                FieldValue::Double(jd) => Ok(FieldValue::JulianDate(jd)),
                other => Ok(other),
            },
            ValueKind::Date => self.instant(input).map(FieldValue::Date),
            ValueKind::Datetime => self.instant(input).map(FieldValue::Datetime),
        }
    }

    fn number<T: NumericField>(&self, input: &[u8]) -> Result<FieldValue<'static>, ParseFieldError> {
        parse_literal::<T>(input).map_err(|_| self.unscannable(input))
    }

    fn instant(&self, input: &[u8]) -> Result<Timestamp, ParseFieldError> {
        let pattern = match (self.pattern, self.kind) {
            (Some(pattern), _) => Some(pattern),
            (None, ValueKind::Date) => ISO_DATE.as_ref(),
            (None, _) => ISO_DATETIME.as_ref(),
        };
        let text = std::str::from_utf8(input).ok();
        pattern
            .zip(text)
            .and_then(|(pattern, text)| pattern.scan(text))
            .ok_or_else(|| self.unscannable(input))
    }

    fn unscannable(&self, input: &[u8]) -> ParseFieldError {
        ParseFieldError::Unscannable {
            field: self.name.to_string(),
            literal: String::from_utf8_lossy(input).into_owned(),
        }
    }
}

/// Scan `token` as a `kind` value for the field `name`, with an optional date pattern.
pub fn scan_field<'a>(
    token: &'a [u8],
    kind: ValueKind,
    name: &str,
    pattern: Option<&TimePattern>,
) -> Result<FieldValue<'a>, ParseFieldError> {
    let scan = FieldScan {
        name,
        kind,
        pattern,
        auto_null: None,
    };
    scan.scan(token)
}

#[cfg(test)]
mod scan_test {
    use super::*;
    use crate::time::reference_epoch;

    fn days_after_epoch(days: i64, seconds: i64) -> Timestamp {
        Timestamp::from_unix_seconds(reference_epoch().unix_seconds() + days * 86_400 + seconds)
    }

    #[test]
    fn test_time_pattern_full_match() {
        let pattern = TimePattern::new("%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            pattern.scan("2000-01-02 01:00:30"),
            Some(days_after_epoch(1, 3630))
        );
        assert_eq!(
            pattern.scan("2000-01-02   01:00:30"),
            Some(days_after_epoch(1, 3630))
        );
        assert_eq!(pattern.scan("2000-01-02 01:00:30x"), None);
        assert_eq!(pattern.scan("2000-01-02"), None);
        assert_eq!(pattern.scan("2001-02-29 00:00:00"), None);
    }

    #[test]
    fn test_time_pattern_directives() {
        let pattern: TimePattern = "%d %b %Y".parse().unwrap();
        assert_eq!(pattern.scan("3 Jan 2000"), Some(days_after_epoch(2, 0)));
        assert_eq!(pattern.scan("03 JANUARY 2000"), Some(days_after_epoch(2, 0)));
        assert_eq!(pattern.scan("3 Jax 2000"), None);

        let pattern = TimePattern::new("%Y.%j").unwrap();
        assert_eq!(pattern.scan("2000.032"), Some(days_after_epoch(31, 0)));

        let pattern = TimePattern::new("%D").unwrap();
        assert_eq!(pattern.scan("01/01/00"), Some(reference_epoch()));
        assert_eq!(
            pattern.scan("12/31/99"),
            Timestamp::from_calendar(1999, 12, 31, 0, 0, 0)
        );

        let pattern = TimePattern::new("%FT%T").unwrap();
        assert_eq!(pattern.as_str(), "%FT%T");
        assert_eq!(
            pattern.scan("2000-01-01T12:00:00"),
            Some(days_after_epoch(0, 43_200))
        );
    }

    #[test]
    fn test_time_pattern_rejects_unknown_directive() {
        assert!(matches!(
            TimePattern::new("%Q"),
            Err(BoosterError::InvalidPattern(_))
        ));
        assert!(matches!(
            TimePattern::new("%Y%"),
            Err(BoosterError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_scan_empty_is_null_for_every_kind() {
        for kind in [
            ValueKind::Bool,
            ValueKind::Int,
            ValueKind::Date,
            ValueKind::Datetime,
            ValueKind::JulianDate,
            ValueKind::Text,
        ] {
            assert_eq!(scan_field(b"  ", kind, "f", None), Ok(FieldValue::Null));
        }
    }

    #[test]
    fn test_scan_kinds() {
        assert_eq!(
            scan_field(b" 42 ", ValueKind::Short, "n", None),
            Ok(FieldValue::Short(42))
        );
        assert_eq!(
            scan_field(b"2451545.25", ValueKind::JulianDate, "jd", None),
            Ok(FieldValue::JulianDate(2451545.25))
        );
        assert_eq!(
            scan_field(b"Vmag", ValueKind::Char, "flag", None),
            Ok(FieldValue::Char(b'V'))
        );
        assert_eq!(
            scan_field(b" HD 1234 ", ValueKind::Text, "name", None),
            Ok(FieldValue::text("HD 1234"))
        );
        assert_eq!(
            scan_field(b"2000-01-11", ValueKind::Date, "obs_date", None),
            Ok(FieldValue::Date(days_after_epoch(10, 0)))
        );
        assert_eq!(
            scan_field(b"2000-01-01T00:00:05", ValueKind::Datetime, "t", None),
            Ok(FieldValue::Datetime(days_after_epoch(0, 5)))
        );
    }

    #[test]
    fn test_scan_failures_name_the_field() {
        let err = scan_field(b"1.5x", ValueKind::Double, "vmag", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "fieldscanf: Can't parse field vmag (value '1.5x')"
        );

        let pattern = TimePattern::new("%Y-%m-%d").unwrap();
        assert!(scan_field(b"2000-01-01 junk", ValueKind::Date, "d", Some(&pattern)).is_err());

        assert_eq!(
            scan_field(b"1", ValueKind::Bool, "flag", None),
            Err(ParseFieldError::BoolNotScannable {
                field: "flag".into()
            })
        );
    }

    #[test]
    fn test_scan_rejects_out_of_range_clock() {
        for text in ["2000-01-01T24:00:00", "2000-01-01T23:60:00"] {
            assert_eq!(
                scan_field(text.as_bytes(), ValueKind::Datetime, "epoch", None),
                Err(ParseFieldError::Unscannable {
                    field: "epoch".into(),
                    literal: text.into(),
                })
            );
        }
        assert_eq!(
            scan_field(b"2000-01-01T23:59:59", ValueKind::Datetime, "epoch", None),
            Ok(FieldValue::Datetime(days_after_epoch(0, 86_399)))
        );
    }

    #[test]
    fn test_auto_null() {
        let scan = FieldScan::new("plx", ValueKind::Double).with_auto_null("---");
        assert_eq!(scan.scan(b" --- "), Ok(FieldValue::Null));
        assert_eq!(scan.scan(b"1.5"), Ok(FieldValue::Double(1.5)));
    }
}
