mod common;

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use approx::assert_relative_eq;
use camino::Utf8Path;
use importbooster::{
    BadRecordPolicy, Diagnostics, LoadStats, Loader, LoaderConfig, RecordLayout, ValueKind,
};

use common::{as_f32, as_f64, as_i32, as_i64, decode};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn bright_stars_layout() -> RecordLayout {
    let json = std::fs::read_to_string("tests/data/bright_stars_layout.json").unwrap();
    serde_json::from_str(&json).unwrap()
}

fn load_bright_stars(policy: BadRecordPolicy) -> (LoadStats, Vec<u8>, Captured) {
    let config = LoaderConfig {
        policy,
        ..LoaderConfig::default()
    };
    let captured = Captured::default();
    let mut loader = Loader::new(config, bright_stars_layout())
        .unwrap()
        .with_diagnostics(Diagnostics::new(captured.clone()));
    let mut out = Vec::new();
    let stats = loader
        .load_file(Utf8Path::new("tests/data/bright_stars.psv"), &mut out)
        .unwrap();
    (stats, out, captured)
}

#[test]
fn test_layout_from_json() {
    let layout = bright_stars_layout();
    assert_eq!(layout.columns.len(), 7);
    assert_eq!(layout.columns[3].null_value.as_deref(), Some("---"));
    assert_eq!(layout.columns[5].kind, ValueKind::JulianDate);
    assert!(layout.columns[6].from_julian_date);
    assert!(!layout.columns[0].from_julian_date);

    let config: LoaderConfig = serde_json::from_str(r#"{ "policy": "skip" }"#).unwrap();
    assert_eq!(config.policy, BadRecordPolicy::Skip);
    assert_eq!(config.separator, "|");
    assert!(config.skip_blank_lines);
}

#[test]
fn test_bright_stars_reported() {
    let (stats, out, captured) = load_bright_stars(BadRecordPolicy::Report);
    assert_eq!(
        stats,
        LoadStats {
            records_read: 3,
            tuples_written: 3,
            records_skipped: 0,
            fields_reported: 2,
        }
    );

    let decoded = decode(&out);
    assert_eq!(decoded.trailing, 0);
    let vega = &decoded.tuples[0];
    assert_eq!(vega.len(), 7);
    assert_eq!(vega[0].as_deref(), Some(&b"Vega"[..]));
    assert_relative_eq!(as_f64(&vega[1]), 279.23475, epsilon = 1e-10);
    assert_relative_eq!(as_f64(&vega[2]), 38.78369444444444, epsilon = 1e-10);
    assert_relative_eq!(as_f32(&vega[3]), 0.03_f32);
    assert_eq!(as_i64(&vega[4]), 668_149_567 * 1_000_000);
    assert_eq!(as_i32(&vega[5]), 0);
    assert_eq!(as_i64(&vega[6]), 43_200 * 1_000_000);

    let sirius = &decoded.tuples[1];
    assert_relative_eq!(as_f64(&sirius[1]), 101.28716666666666, epsilon = 1e-10);
    assert_relative_eq!(as_f64(&sirius[2]), -16.71611111111111, epsilon = 1e-10);
    assert_eq!(sirius[3], None);
    assert_eq!(as_i64(&sirius[4]), 0);
    assert_eq!(as_i32(&sirius[5]), 2);

    let bad = &decoded.tuples[2];
    assert_eq!(bad[0].as_deref(), Some(&b"Bad"[..]));
    assert_eq!(bad[1], None);
    assert_eq!(bad[4], None);
    assert_relative_eq!(as_f64(&bad[2]), 0.0);

    let lines = captured.lines();
    let context = "importbooster: Bad Record: 'Bad|xx|+00 00 00.0|1.0|not a date|2451545.0|'";
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], context);
    assert_eq!(lines[2], context);
    assert_eq!(
        lines[3],
        "fieldscanf: Can't parse field epoch (value 'not a date')"
    );
}

#[test]
fn test_bright_stars_skipped() {
    let (stats, out, captured) = load_bright_stars(BadRecordPolicy::Skip);
    assert_eq!(stats.tuples_written, 2);
    assert_eq!(stats.records_skipped, 1);
    assert_eq!(stats.fields_reported, 0);

    let decoded = decode(&out);
    assert_eq!(decoded.tuples.len(), 2);
    assert_eq!(decoded.tuples[1][0].as_deref(), Some(&b"Sirius"[..]));

    assert_eq!(
        captured.lines(),
        ["importbooster: Bad Record: 'Bad|xx|+00 00 00.0|1.0|not a date|2451545.0|'"]
    );
}

#[test]
fn test_missing_file_is_fatal() {
    let mut loader = Loader::new(LoaderConfig::default(), bright_stars_layout()).unwrap();
    let result = loader.load_file(Utf8Path::new("tests/data/no_such_file.psv"), io::sink());
    assert!(matches!(result, Err(importbooster::BoosterError::Io(_))));
}
