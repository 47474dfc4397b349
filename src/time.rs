//! Civil time to the continuous time scale used by the propagator.
//!
//! Instants are UTC Julian dates kept as two parts: the Julian date of the preceding
//! midnight (always ending in `.5`) and the fraction of the day elapsed since. A single
//! `f64` Julian date only resolves ~40µs, the split form keeps the fraction at full
//! precision. UT1 is taken to be UTC.

use std::{cmp::Ordering, f64::consts::PI};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{config_error, Result, TrackError};

pub const TWOPI: f64 = 2.0 * PI;
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// Julian date of 1970-01-01 00:00 UTC.
pub const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian date of 1949-12-31 00:00 UTC, the reference the deep-space model counts days from.
pub const JD_1950: f64 = 2_433_281.5;
/// Julian date of J2000.0.
pub const JD_J2000: f64 = 2_451_545.0;

/// A point on the continuous UTC time scale.
///
/// Always normalized so that `fraction` lies in `[0, 1)`, which makes the derived
/// lexicographic order the chronological one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochTime {
    jd: f64,
    fraction: f64,
}

impl EpochTime {
    /// Build from a Julian date split in any way, e.g. `(2458826.5, 0.8625)` or
    /// `(2458827.3625, 0.0)`.
    pub fn new(jd: f64, fraction: f64) -> Self {
        let whole = (jd - 0.5).floor() + 0.5;
        EpochTime::normalized(whole, (jd - whole) + fraction)
    }

    fn normalized(jd: f64, fraction: f64) -> Self {
        let days = fraction.floor();
        EpochTime { jd: jd + days, fraction: fraction - days }
    }

    pub fn now() -> Self {
        EpochTime::from(Utc::now())
    }

    /// Julian date of the midnight preceding this instant.
    pub fn jd(&self) -> f64 {
        self.jd
    }

    /// Fraction of the UTC day elapsed since `jd()`.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Single-value Julian date. Loses sub-millisecond precision.
    pub fn julian_date(&self) -> f64 {
        self.jd + self.fraction
    }

    /// Days since 1949-12-31 00:00 UTC.
    pub fn days_since_1950(&self) -> f64 {
        (self.jd - JD_1950) + self.fraction
    }

    pub fn advance(&self, seconds: f64) -> Self {
        EpochTime::normalized(self.jd, self.fraction + seconds / SECONDS_PER_DAY)
    }

    pub fn minutes_since(&self, other: &EpochTime) -> f64 {
        ((self.jd - other.jd) + (self.fraction - other.fraction)) * MINUTES_PER_DAY
    }

    pub fn seconds_since(&self, other: &EpochTime) -> f64 {
        ((self.jd - other.jd) + (self.fraction - other.fraction)) * SECONDS_PER_DAY
    }

    /// Calendar components `(year, month, day, hour, minute, second)`.
    pub fn to_calendar(&self) -> (i32, i32, i32, i32, i32, f64) {
        invjday(self.julian_date())
    }

    /// `None` if the instant is outside of what chrono can represent.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let days = (self.jd - JD_UNIX_EPOCH).round() as i64;
        let nanos = (self.fraction * SECONDS_PER_DAY * 1.0e9).round() as i64;
        let secs = days.checked_mul(86_400)?.checked_add(nanos.div_euclid(1_000_000_000))?;
        DateTime::from_timestamp(secs, nanos.rem_euclid(1_000_000_000) as u32)
    }
}

impl PartialOrd for EpochTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.jd.partial_cmp(&other.jd)? {
            Ordering::Equal => self.fraction.partial_cmp(&other.fraction),
            ord => Some(ord),
        }
    }
}

impl From<DateTime<Utc>> for EpochTime {
    fn from(dt: DateTime<Utc>) -> Self {
        let ts = dt.timestamp();
        let days = ts.div_euclid(86_400);
        let secs = ts.rem_euclid(86_400) as f64 + dt.timestamp_subsec_nanos() as f64 * 1.0e-9;
        EpochTime::normalized(JD_UNIX_EPOCH + days as f64, secs / SECONDS_PER_DAY)
    }
}

/// Convert a civil UTC timestamp to an [`EpochTime`].
///
/// Time components beyond their nominal range roll over (`second == 90` is 1m30s past
/// the minute), negative ones are rejected.
pub fn to_epoch(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: i32) -> Result<EpochTime> {
    let invalid = || TrackError::InvalidCalendarDate { year, month, day, hour, minute, second };

    if !(1..=12).contains(&month) || day < 1 || hour < 0 || minute < 0 || second < 0 {
        return Err(invalid());
    }
    let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(invalid)?;

    let fraction = (hour as f64 * 3600.0 + minute as f64 * 60.0 + second as f64) / SECONDS_PER_DAY;
    Ok(EpochTime::normalized(julian_day(date), fraction))
}

/// Step `epoch` by `seconds`.
pub fn advance(epoch: EpochTime, seconds: f64) -> EpochTime {
    epoch.advance(seconds)
}

/// Julian date of the midnight starting `date`.
pub fn julian_day(date: NaiveDate) -> f64 {
    JD_UNIX_EPOCH + date.signed_duration_since(DateTime::UNIX_EPOCH.date_naive()).num_days() as f64
}

/// Parse a start time: `now` (or empty), `YYYY.MM.DD.HH.MM.SS`, or RFC 3339.
pub fn parse_datetime_spec(spec: &str) -> Result<EpochTime> {
    let spec = spec.trim();
    if spec.is_empty() || spec.eq_ignore_ascii_case("now") {
        return Ok(EpochTime::now());
    }

    let parts: Vec<&str> = spec.split('.').collect();
    if parts.len() == 6 {
        let mut f = [0i32; 6];
        for (v, p) in f.iter_mut().zip(&parts) {
            *v = p.trim().parse().map_err(|_| config_error!("invalid datetime spec {spec}"))?;
        }
        return to_epoch(f[0], f[1], f[2], f[3], f[4], f[5]);
    }

    DateTime::parse_from_rfc3339(spec)
        .map(|dt| EpochTime::from(dt.with_timezone(&Utc)))
        .map_err(|e| config_error!("invalid datetime spec {spec}: {e}"))
}

// -----------------------------------------------------------------------------
// Julian date helpers
// -----------------------------------------------------------------------------

/// Julian date as `(midnight, fraction of day)`. Valid from 1901 through 2099.
///
/// ```text
/// jday(2020, 2, 11, 13, 57, 0.0) -> (2458890.5, 0.58125)
/// ```
pub fn jday(year: i32, mon: i32, day: i32, hr: i32, minute: i32, sec: f64) -> (f64, f64) {
    let year_f = year as f64;
    let mon_f = mon as f64;

    let jd = 367.0 * year_f - (7.0 * (year_f + ((mon_f + 9.0) / 12.0).floor()) * 0.25).floor()
        + (275.0 * mon_f / 9.0).floor()
        + day as f64
        + 1_721_013.5;
    let fr = (sec + minute as f64 * 60.0 + hr as f64 * 3600.0) / SECONDS_PER_DAY;

    (jd, fr)
}

/// Split a fractional day of year (1.0 is the start of January 1st) into
/// `(month, day, hour, minute, second)`. Seconds are rounded to the microsecond.
pub fn days2mdhms(year: i32, days: f64) -> (i32, i32, i32, i32, f64) {
    let is_leap = year % 400 == 0 || (year % 4 == 0 && year % 100 != 0);

    let mut day_of_year = days.floor() as i32;
    let mut second = ((days - days.floor()) * SECONDS_PER_DAY * 1.0e6).round() / 1.0e6;
    if second >= SECONDS_PER_DAY {
        day_of_year += 1;
        second -= SECONDS_PER_DAY;
    }
    let hour = (second / 3600.0).floor() as i32;
    second -= hour as f64 * 3600.0;
    let minute = (second / 60.0).floor() as i32;
    second -= minute as f64 * 60.0;

    let (month, day) = day_of_year_to_month_day(day_of_year, is_leap);
    (month, day, hour, minute, second)
}

/// 1-based day of year to `(month, day)`.
pub fn day_of_year_to_month_day(day_of_year: i32, is_leap: bool) -> (i32, i32) {
    let leap = is_leap as i32;
    let february_bump = (2 - leap) * (day_of_year >= 60 + leap) as i32;
    let august = (day_of_year >= 215) as i32;

    let num = 2 * (day_of_year - 1 + 30 * august + february_bump);
    let month = num / 61 + 1 - august;
    let day = (num % 61) / 2 + 1;

    (month, day)
}

/// Julian date to `(year, month, day, hour, minute, second)`.
pub fn invjday(jd: f64) -> (i32, i32, i32, i32, i32, f64) {
    let temp = jd - 2_415_019.5;
    let tu = temp / 365.25;
    let mut year = 1900 + tu.floor() as i32;
    let mut leapyrs = ((year - 1901) as f64 * 0.25).floor();

    let mut days = temp - ((year - 1900) as f64 * 365.0 + leapyrs);
    if days < 1.0 {
        year -= 1;
        leapyrs = ((year - 1901) as f64 * 0.25).floor();
        days = temp - ((year - 1900) as f64 * 365.0 + leapyrs);
    }

    let (mon, day, hr, minute, sec) = days2mdhms(year, days);
    (year, mon, day, hr, minute, sec)
}

/// Greenwich mean sidereal angle (IAU-82) in radians, `[0, 2π)`.
pub fn gmst(epoch: EpochTime) -> f64 {
    let tut1 = ((epoch.jd - JD_J2000) + epoch.fraction) / 36_525.0;
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093_104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * tut1
        + 67_310.548_41;

    // 360/86400 = 1/240 degrees per second of time
    (seconds.to_radians() / 240.0).rem_euclid(TWOPI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn approx_eq(a: f64, b: f64, tol: f64) {
        let diff = (a - b).abs();
        assert!(diff <= tol, "expected {b:.15e}, got {a:.15e}, diff={diff:.3e}");
    }

    #[test]
    fn jday_matches_reference() {
        let (jd, fr) = jday(2020, 2, 11, 13, 57, 0.0);
        approx_eq(jd, 2458890.5, 1.0e-9);
        approx_eq(fr, 0.58125, 1.0e-12);

        let (jd, fr) = jday(2019, 10, 9, 16, 57, 15.0);
        approx_eq(jd, 2458765.5, 1.0e-9);
        approx_eq(fr, 0.706_423_611_111_111_1, 1.0e-12);
    }

    #[test]
    fn to_epoch_agrees_with_jday() {
        let t = to_epoch(2020, 5, 15, 12, 54, 15).unwrap();
        let (jd, fr) = jday(2020, 5, 15, 12, 54, 15.0);
        assert_eq!(t.jd(), jd);
        approx_eq(t.fraction(), fr, 1.0e-15);
    }

    #[test]
    fn to_epoch_rejects_bad_calendar_fields() {
        for (y, mo, d, h, mi, s) in [
            (2020, 0, 1, 0, 0, 0),
            (2020, 13, 1, 0, 0, 0),
            (2019, 2, 29, 0, 0, 0),
            (2020, 4, 31, 0, 0, 0),
            (2020, 4, 0, 0, 0, 0),
            (2020, 4, 1, -1, 0, 0),
            (2020, 4, 1, 0, -5, 0),
            (2020, 4, 1, 0, 0, -1),
        ] {
            assert!(
                matches!(to_epoch(y, mo, d, h, mi, s), Err(TrackError::InvalidCalendarDate { .. })),
                "{y}-{mo}-{d} {h}:{mi}:{s} should be rejected"
            );
        }
        assert!(to_epoch(2020, 2, 29, 0, 0, 0).is_ok());
    }

    #[test]
    fn overflowing_seconds_roll_over() {
        let a = to_epoch(2020, 12, 31, 23, 59, 0).unwrap();
        let b = to_epoch(2020, 12, 31, 23, 58, 60).unwrap();
        let c = to_epoch(2021, 1, 1, 0, 0, 0).unwrap();
        let d = to_epoch(2020, 12, 31, 0, 0, 86_400).unwrap();
        assert_eq!(a, b);
        assert_eq!(c, d);
    }

    #[test]
    fn advance_is_monotonic_and_exact() {
        let t0 = to_epoch(2020, 5, 15, 23, 0, 0).unwrap();
        let mut t = t0;
        for _ in 0..480 {
            let next = t.advance(180.0);
            assert!(next > t);
            t = next;
        }
        approx_eq(t.seconds_since(&t0), 86_400.0, 1.0e-6);

        let midnight = to_epoch(2020, 5, 16, 0, 0, 0).unwrap();
        approx_eq(advance(t0, 3600.0).seconds_since(&midnight), 0.0, 1.0e-6);
    }

    #[test]
    fn datetime_round_trip() {
        let dt = Utc.with_ymd_and_hms(2020, 5, 15, 12, 54, 15).unwrap();
        let t = EpochTime::from(dt);
        assert_eq!(t, to_epoch(2020, 5, 15, 12, 54, 15).unwrap());
        assert_eq!(t.to_datetime(), Some(dt));
    }

    #[test]
    fn new_accepts_any_split() {
        let a = EpochTime::new(2458826.5, 0.8625);
        let b = EpochTime::new(2458827.3625, 0.0);
        assert_eq!(a.jd(), b.jd());
        approx_eq(a.fraction(), b.fraction(), 1.0e-9);
    }

    #[test]
    fn days2mdhms_basic_cases() {
        let (m, d, h, min, s) = days2mdhms(2020, 133.35625);
        assert_eq!((m, d, h, min), (5, 12, 8, 33));
        approx_eq(s, 0.0, 1.0e-6);

        let (m, d, h, min, _) = days2mdhms(2000, 32.0);
        assert_eq!((m, d, h, min), (2, 1, 0, 0));
    }

    #[test]
    fn months_and_days() {
        let month_lengths = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for leap in [false, true] {
            let mut lengths = month_lengths;
            if leap {
                lengths[1] = 29;
            }
            let mut day_of_year = 1;
            for (month, length) in lengths.iter().enumerate() {
                for day in 1..=*length {
                    assert_eq!(day_of_year_to_month_day(day_of_year, leap), (month as i32 + 1, day));
                    day_of_year += 1;
                }
            }
        }
    }

    #[test]
    fn invjday_round_trip() {
        let (jd, fr) = jday(2020, 2, 29, 23, 59, 30.5);
        let (year, mon, day, hr, min, sec) = invjday(jd + fr);
        assert_eq!((year, mon, day, hr, min), (2020, 2, 29, 23, 59));
        approx_eq(sec, 30.5, 2.0e-4);
    }

    #[test]
    fn gmst_at_j2000() {
        // 18h41m50.54841s at 2000-01-01 12:00 UT1
        let t = EpochTime::new(JD_J2000, 0.0);
        approx_eq(gmst(t), 67_310.548_41_f64.to_radians() / 240.0, 1.0e-12);
        let later = t.advance(12.0 * 3600.0);
        assert!(gmst(later) >= 0.0 && gmst(later) < TWOPI);
    }

    #[test]
    fn datetime_specs() {
        let t = parse_datetime_spec("2020.05.15.12.54.15").unwrap();
        assert_eq!(t, to_epoch(2020, 5, 15, 12, 54, 15).unwrap());
        let r = parse_datetime_spec("2020-05-15T12:54:15Z").unwrap();
        assert_eq!(r, t);
        assert!(parse_datetime_spec("2020.05.15").is_err());
        assert!(matches!(
            parse_datetime_spec("2020.13.15.12.54.15"),
            Err(TrackError::InvalidCalendarDate { .. })
        ));
    }
}
