//! # Calendar arithmetic
//!
//! Conversions between the astronomical time scales found in catalog dumps and the
//! civil instants the COPY BINARY format expects:
//!
//! - Julian day number ↔ proleptic Gregorian date ([`julian_day_to_calendar`])
//! - continuous Julian date → [`Timestamp`] ([`julian_date_to_unix_time`])
//! - Modified Julian Date ↔ Julian year ([`mjd_to_julian_year`], [`julian_year_to_jd`])
//!
//! All instants are UTC. The database epoch (2000-01-01T00:00:00 UTC) is computed once
//! with [hifitime](https://docs.rs/hifitime) and shared read-only by every conversion
//! ([`reference_epoch`]).
use std::sync::LazyLock;

use hifitime::Epoch;

use crate::constants::{
    JulianYear, DAYS_PER_JULIAN_YEAR, JDTOMJD, JD_J2000, SECONDS_PER_DAY, T2000, UNIX_EPOCH_JDN,
    JD, MJD,
};

/// A civil instant at one-second resolution, counted in seconds since
/// 1970-01-01T00:00:00 UTC (leap seconds excluded, as in POSIX time).
///
/// `Date` and `Datetime` field values both carry a `Timestamp`; the encoder decides
/// how much of it reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Timestamp(seconds)
    }

    pub const fn unix_seconds(self) -> i64 {
        self.0
    }

    /// Build a timestamp from civil UTC fields.
    ///
    /// Return
    /// ----------
    /// * `None` if the fields do not name an existing Gregorian date and time
    ///   (e.g. February 30th, hour 24).
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        // hifitime rolls hour 24 and minute 60 into the next unit
        if hour > 23 || minute > 59 || second > 60 {
            return None;
        }
        let narrow = |v: u32| u8::try_from(v).ok();
        let epoch = Epoch::maybe_from_gregorian_utc(
            year,
            narrow(month)?,
            narrow(day)?,
            narrow(hour)?,
            narrow(minute)?,
            narrow(second)?,
            0,
        )
        .ok()?;
        Some(Self::from_epoch(epoch))
    }

    /// Midnight UTC of the given Julian day number, plus `seconds_of_day`.
    ///
    /// Saturates at the ends of the `i64` range.
    pub const fn from_julian_day_number(jdn: i64, seconds_of_day: i64) -> Self {
        Timestamp(
            jdn.saturating_sub(UNIX_EPOCH_JDN)
                .saturating_mul(SECONDS_PER_DAY)
                .saturating_add(seconds_of_day),
        )
    }

    /// Seconds elapsed between `origin` and `self` (negative if `self` is earlier).
    pub const fn seconds_since(self, origin: Timestamp) -> i64 {
        self.0.saturating_sub(origin.0)
    }

    fn from_epoch(epoch: Epoch) -> Self {
        Timestamp(epoch.to_unix_seconds().round() as i64)
    }
}

static REFERENCE_EPOCH: LazyLock<Timestamp> =
    LazyLock::new(|| Timestamp::from_epoch(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1)));

/// The database epoch, 2000-01-01T00:00:00 UTC.
///
/// Zero point of every `date` and `timestamp` value in the COPY BINARY stream.
pub fn reference_epoch() -> Timestamp {
    *REFERENCE_EPOCH
}

/// Convert a Julian day number to a proleptic Gregorian calendar date.
///
/// Branch-free integer algorithm (as used by PostgreSQL's `j2date`), valid for every
/// day number from -4713-11-24 (JDN 0) onwards. Negative day numbers give meaningless
/// dates.
///
/// Return
/// ----------
/// * `(year, month, day)` with astronomical year numbering (year 0 exists).
pub fn julian_day_to_calendar(jd: i32) -> (i32, u32, u32) {
    let mut julian = jd as i64 + 32044;
    let mut quad = julian / 146097;
    let extra = (julian - quad * 146097) * 4 + 3;
    julian += 60 + quad * 3 + extra / 146097;
    quad = julian / 1461;
    julian -= quad * 1461;
    let mut y = julian * 4 / 1461;
    julian = if y != 0 {
        (julian + 305) % 365
    } else {
        (julian + 306) % 366
    } + 123;
    y += quad * 4;
    let year = (y - 4800) as i32;
    quad = julian * 2141 / 65536;
    let day = (julian - 7834 * quad / 256) as u32;
    let month = ((quad + 10) % 12 + 1) as u32;
    (year, month, day)
}

/// Convert a continuous Julian date into a UTC [`Timestamp`].
///
/// The Julian date is shifted by half a day (Julian days start at noon), split into a
/// day number and a day fraction; the day goes through [`julian_day_to_calendar`] and
/// the fraction is truncated to whole hours, minutes and seconds.
///
/// Day numbers outside `0..=i32::MAX` (and dates hifitime cannot represent) are counted
/// directly from the Unix epoch with saturating arithmetic, so an infinite Julian date
/// ends up at `i64::MAX` and is refused by the encoder.
pub fn julian_date_to_unix_time(jd: JD) -> Timestamp {
    let shifted = jd + 0.5;
    let day_number = shifted.floor();

    let hours = (shifted - day_number) * 24.0;
    let hour = hours.trunc();
    let minutes = (hours - hour) * 60.0;
    let minute = minutes.trunc();
    let second = ((minutes - minute) * 60.0).trunc();

    let (hour, minute, second) = (hour as u32, minute as u32, second as u32);
    let seconds_of_day = (hour * 3600 + minute * 60 + second) as i64;
    let by_day_count = || Timestamp::from_julian_day_number(day_number as i64, seconds_of_day);

    if !(0.0..=i32::MAX as f64).contains(&day_number) {
        return by_day_count();
    }
    let (year, month, day) = julian_day_to_calendar(day_number as i32);
    Timestamp::from_calendar(year, month, day, hour, minute, second).unwrap_or_else(by_day_count)
}

/// Modified Julian Date → Julian epoch in years (`51544.5` is `2000.0`).
pub fn mjd_to_julian_year(mjd: MJD) -> JulianYear {
    (mjd - T2000) / DAYS_PER_JULIAN_YEAR + 2000.0
}

/// Julian epoch in years → Julian date (`2000.0` is `2451545.0`).
pub fn julian_year_to_jd(julian_year: JulianYear) -> JD {
    (julian_year - 2000.0) * DAYS_PER_JULIAN_YEAR + JD_J2000
}

/// Julian date → Modified Julian Date
pub fn jd_to_mjd(jd: JD) -> MJD {
    jd - JDTOMJD
}

/// Modified Julian Date → Julian date
pub fn mjd_to_jd(mjd: MJD) -> JD {
    mjd + JDTOMJD
}
