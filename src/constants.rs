//! # Constants and type definitions for importbooster
//!
//! This module centralizes the **astronomical epochs**, **unit conversion factors**, and the
//! **COPY BINARY framing constants** used throughout the crate.
//!
//! ## Overview
//!
//! - Julian day / Modified Julian Date reference points
//! - Unit conversions (arcseconds and milliarcseconds ↔ degrees, days ↔ seconds)
//! - Core type aliases used across the crate
//! - Fixed byte sequences of the PostgreSQL bulk-load stream

// -------------------------------------------------------------------------------------------------
// Astronomical epochs and unit conversions
// -------------------------------------------------------------------------------------------------

/// Number of seconds in a day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Number of days in a Julian year
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Julian date of J2000.0 (2000-01-01 12:00:00)
pub const JD_J2000: f64 = 2_451_545.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Julian day number of 1970-01-01 (the civil day starting at midnight)
pub const UNIX_EPOCH_JDN: i64 = 2_440_588;

/// Arcseconds → degrees
pub const ARCSEC_TO_DEG: f64 = 1.0 / 3600.0;

/// Milliarcseconds → degrees
pub const MAS_TO_DEG: f64 = 1.0 / 3600.0 / 1000.0;

// -------------------------------------------------------------------------------------------------
// COPY BINARY framing
// -------------------------------------------------------------------------------------------------

/// Signature opening every COPY BINARY stream
pub const COPY_SIGNATURE: &[u8; 11] = b"PGCOPY\n\xff\r\n\0";

/// Field length announcing a NULL value
pub const NULL_FIELD_LENGTH: i32 = -1;

/// Tuple field count closing the stream
pub const END_OF_STREAM: i16 = -1;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Continuous Julian date (days)
pub type JD = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Julian epoch expressed in years (e.g. 2000.0 for J2000.0)
pub type JulianYear = f64;
