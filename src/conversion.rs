use crate::constants::Degree;

/// An angle split into hours, minutes and seconds of time (`24h = 360°`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hms {
    pub hours: i32,
    pub minutes: i32,
    pub seconds: f64,
}

/// An angle split into sign, degrees, arcminutes and arcseconds.
///
/// The sign is kept apart from the numeric parts so that angles in `(-1°, 0°)` keep
/// their sign (`-0° 30′` has `degrees == 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub sign: char,
    pub degrees: i32,
    pub minutes: i32,
    pub seconds: f64,
}

/// Split a decimal angle into hours, minutes and seconds of time.
///
/// Negative angles are first brought into `[0, 360)`; the result is then split by
/// repeated fractional extraction at bases 24 and 60. An angle within rounding
/// distance of 360° (a tiny negative angle included) comes out as `hours == 24`.
///
/// Arguments
/// ---------
/// * `deg`: the angle in decimal degrees (typically a right ascension)
pub fn deg_to_hms(deg: Degree) -> Hms {
    let deg = if deg < 0.0 { deg.rem_euclid(360.0) } else { deg };

    let hours = deg / 360.0 * 24.0;
    let minutes = hours.fract() * 60.0;
    Hms {
        hours: hours.trunc() as i32,
        minutes: minutes.trunc() as i32,
        seconds: minutes.fract() * 60.0,
    }
}

/// Split a decimal angle into sign, degrees, arcminutes and arcseconds.
///
/// Arguments
/// ---------
/// * `deg`: the angle in decimal degrees (typically a declination)
pub fn deg_to_dms(deg: Degree) -> Dms {
    let (sign, magnitude) = if deg < 0.0 { ('-', -deg) } else { ('+', deg) };

    let minutes = magnitude.fract() * 60.0;
    Dms {
        sign,
        degrees: magnitude.trunc() as i32,
        minutes: minutes.trunc() as i32,
        seconds: minutes.fract() * 60.0,
    }
}

/// Recompose hours, minutes and seconds of time into decimal degrees.
pub fn hms_to_deg(hms: &Hms) -> Degree {
    (hms.hours as f64 + hms.minutes as f64 / 60.0 + hms.seconds / 3600.0) * 15.0
}

/// Recompose a sign, degrees, arcminutes and arcseconds into decimal degrees.
pub fn dms_to_deg(dms: &Dms) -> Degree {
    let magnitude = dms.degrees as f64 + dms.minutes as f64 / 60.0 + dms.seconds / 3600.0;
    if dms.sign == '-' {
        -magnitude
    } else {
        magnitude
    }
}

/// Parse a right ascension string to degrees
///
/// Arguments
/// ---------
/// * `ra`: a string representing the right ascension in the format `HH MM SS.SS`
///   (any run of blanks or colons separates the parts)
///
/// Returns
/// -------
/// * `Option<Degree>`: the right ascension in degrees, `None` if the input format is invalid.
pub fn parse_ra_to_deg(ra: &str) -> Option<Degree> {
    let parts = split_sexagesimal(ra)?;

    let hours: i32 = parts[0].parse().ok()?;
    let minutes: i32 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hms_to_deg(&Hms {
        hours,
        minutes,
        seconds,
    }))
}

/// Parse a declination string to degrees
///
/// Arguments
/// ---------
/// * `dec`: a string representing the declination in the format `±DD MM SS.SS`
///
/// Returns
/// -------
/// * `Option<Degree>`: the declination in degrees, `None` if the input format is invalid.
pub fn parse_dec_to_deg(dec: &str) -> Option<Degree> {
    let parts = split_sexagesimal(dec)?;

    let sign = if parts[0].starts_with('-') { '-' } else { '+' };
    let degrees: i32 = parts[0].trim_start_matches(&['-', '+'][..]).parse().ok()?;
    let minutes: i32 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(dms_to_deg(&Dms {
        sign,
        degrees,
        minutes,
        seconds,
    }))
}

fn split_sexagesimal(text: &str) -> Option<[&str; 3]> {
    let mut parts = text
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|p| !p.is_empty());
    let split = [parts.next()?, parts.next()?, parts.next()?];
    match parts.next() {
        Some(_) => None,
        None => Some(split),
    }
}
