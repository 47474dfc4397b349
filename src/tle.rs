//! Two-line element set parsing.
//!
//! ```text
//! 1 NNNNNC NNNNNAAA NNNNN.NNNNNNNN +.NNNNNNNN +NNNNN-N +NNNNN-N N NNNNN
//! 2 NNNNN NNN.NNNN NNN.NNNN NNNNNNN NNN.NNNN NNN.NNNN NN.NNNNNNNNNNNNNN
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::alpha5::from_alpha5;
use crate::errors::{malformed, Result};
use crate::time::{jday, EpochTime, MINUTES_PER_DAY, TWOPI};

pub const TLE_LINE_LEN: usize = 69;

/// revs/day -> rad/min
const XPDOTP: f64 = MINUTES_PER_DAY / (2.0 * PI);

/// Mean orbital elements of one satellite at its TLE epoch.
///
/// Angles are radians, inclination in `[0, π]` and the others in `[0, 2π)`. Mean motion
/// is the Kozai mean motion in rad/min. The mean motion derivatives are kept in the TLE's
/// own units (rev/day² for ṅ/2, rev/day³ for n̈/6), they are informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElementSet {
    pub name: Option<String>,
    pub catalog_number: u32,
    pub classification: char,
    pub international_designator: String,
    pub epoch: EpochTime,
    pub epoch_year: i32,
    pub epoch_day: f64,
    pub mean_motion_dot: f64,
    pub mean_motion_ddot: f64,
    pub bstar: f64,
    pub ephemeris_type: u8,
    pub element_set_number: u32,
    pub inclination: f64,
    pub right_ascension: f64,
    pub eccentricity: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
    pub mean_motion: f64,
    pub revolution_number: u32,
}

impl OrbitalElementSet {
    /// Parse the two element lines. Both must be 69 columns with valid checksums.
    pub fn from_lines(line1: &str, line2: &str) -> Result<Self> {
        let line1 = clean_line(line1);
        let line2 = clean_line(line2);

        check_line(line1, 1, &[1, 8, 32, 43, 52, 61, 63], &[23, 34])?;
        check_line(line2, 2, &[1, 7, 16, 25, 33, 42, 51], &[11, 20, 37, 46])?;

        //--- line 1
        let catalog_number = from_alpha5(&line1[2..7])?;
        let classification = line1.as_bytes()[7] as char;
        let international_designator = line1[9..17].trim().to_string();

        let two_digit_year: i32 = parse_field(line1, 18..20, "epoch year")?;
        let epoch_day: f64 = parse_field(line1, 20..32, "epoch day")?;
        if !(1.0..367.0).contains(&epoch_day) {
            return Err(malformed!("epoch day {epoch_day} out of range"));
        }
        let epoch_year = if two_digit_year < 57 { two_digit_year + 2000 } else { two_digit_year + 1900 };

        let mean_motion_dot: f64 = parse_field(line1, 33..43, "first derivative of mean motion")?;
        let mean_motion_ddot = parse_implied_decimal(&line1[44..52], "second derivative of mean motion")?;
        let bstar = parse_implied_decimal(&line1[53..61], "bstar")?;
        let ephemeris_type = match line1.as_bytes()[62] {
            b' ' => 0,
            b if b.is_ascii_digit() => b - b'0',
            b => return Err(malformed!("invalid ephemeris type '{}'", b as char)),
        };
        let element_set_number: u32 = parse_field_or_zero(line1, 64..68, "element set number")?;

        //--- line 2
        let catalog_number2 = from_alpha5(&line2[2..7])?;
        if catalog_number != catalog_number2 {
            return Err(malformed!(
                "catalog numbers of line 1 ({catalog_number}) and line 2 ({catalog_number2}) do not match"
            ));
        }

        let inclination = parse_field::<f64>(line2, 8..16, "inclination")?;
        if !(0.0..=180.0).contains(&inclination) {
            return Err(malformed!("inclination {inclination} out of range"));
        }
        let right_ascension = parse_field::<f64>(line2, 17..25, "right ascension")?;
        let eccentricity: f64 = format!("0.{}", line2[26..33].replace(' ', "0"))
            .parse()
            .map_err(|e| malformed!("eccentricity '{}': {e}", &line2[26..33]))?;
        let argument_of_perigee = parse_field::<f64>(line2, 34..42, "argument of perigee")?;
        let mean_anomaly = parse_field::<f64>(line2, 43..51, "mean anomaly")?;
        let revs_per_day: f64 = parse_field(line2, 52..63, "mean motion")?;
        if !(revs_per_day > 0.0) {
            return Err(malformed!("mean motion {revs_per_day} must be positive"));
        }
        let revolution_number: u32 = parse_field_or_zero(line2, 63..68, "revolution number")?;

        let (jd_jan1, _) = jday(epoch_year, 1, 1, 0, 0, 0.0);
        let epoch = EpochTime::new(jd_jan1 - 1.0 + epoch_day.floor(), epoch_day.fract());

        Ok(OrbitalElementSet {
            name: None,
            catalog_number,
            classification,
            international_designator,
            epoch,
            epoch_year,
            epoch_day,
            mean_motion_dot,
            mean_motion_ddot,
            bstar,
            ephemeris_type,
            element_set_number,
            inclination: inclination.to_radians(),
            right_ascension: right_ascension.to_radians().rem_euclid(TWOPI),
            eccentricity,
            argument_of_perigee: argument_of_perigee.to_radians().rem_euclid(TWOPI),
            mean_anomaly: mean_anomaly.to_radians().rem_euclid(TWOPI),
            mean_motion: revs_per_day / XPDOTP,
            revolution_number,
        })
    }

    /// Parse a TLE block of two lines, or three if the first one is the satellite name.
    pub fn from_text(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()).collect();
        match lines.as_slice() {
            [line1, line2] => OrbitalElementSet::from_lines(line1, line2),
            [title, line1, line2] => {
                let name = title.trim();
                let name = name.strip_prefix("0 ").unwrap_or(name).trim();
                Ok(OrbitalElementSet::from_lines(line1, line2)?.with_name(name))
            }
            _ => Err(malformed!("expected 2 or 3 lines, got {}", lines.len())),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// Mean motion in revolutions per day, as written in the TLE.
    pub fn revs_per_day(&self) -> f64 {
        self.mean_motion * XPDOTP
    }

    /// Nominal orbital period in minutes.
    pub fn period_minutes(&self) -> f64 {
        TWOPI / self.mean_motion
    }
}

fn clean_line(line: &str) -> &str {
    line.trim_end()
}

fn check_line(line: &str, line_no: u8, blanks: &[usize], points: &[usize]) -> Result<()> {
    if !line.is_ascii() {
        return Err(malformed!("line {line_no} contains non-ASCII characters: {line}"));
    }
    if line.len() != TLE_LINE_LEN {
        return Err(malformed!("line {line_no} has {} columns instead of {TLE_LINE_LEN}: {line}", line.len()));
    }

    let bytes = line.as_bytes();
    if bytes[0] != b'0' + line_no {
        return Err(malformed!("line {line_no} starts with '{}': {line}", bytes[0] as char));
    }
    if let Some(i) = blanks.iter().find(|&&i| bytes[i] != b' ') {
        return Err(malformed!("line {line_no} column {} should be blank: {line}", i + 1));
    }
    if let Some(i) = points.iter().find(|&&i| bytes[i] != b'.') {
        return Err(malformed!("line {line_no} column {} should be a decimal point: {line}", i + 1));
    }

    let given = bytes[TLE_LINE_LEN - 1];
    if !given.is_ascii_digit() {
        return Err(malformed!("line {line_no} has no checksum digit: {line}"));
    }
    let given = (given - b'0') as u32;
    let computed = compute_checksum(line);
    if given != computed {
        return Err(malformed!(
            "line {line_no} gives its checksum as {given} but in fact tallies to {computed}: {line}"
        ));
    }

    Ok(())
}

fn parse_field<T>(line: &str, range: std::ops::Range<usize>, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let s = line[range].trim();
    s.parse::<T>().map_err(|e| malformed!("{what} '{s}': {e}"))
}

fn parse_field_or_zero<T>(line: &str, range: std::ops::Range<usize>, what: &str) -> Result<T>
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    if line[range.clone()].trim().is_empty() {
        Ok(T::default())
    } else {
        parse_field(line, range, what)
    }
}

/// Parse the exponent notation TLEs use for n̈ and B*, e.g. ` 58675-4` = 0.58675e-4.
fn parse_implied_decimal(field: &str, what: &str) -> Result<f64> {
    let s = field.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    if field.len() != 8 {
        return Err(malformed!("{what} '{field}' is not an 8 column field"));
    }

    let (mantissa, exponent) = field.split_at(6);
    let (sign, digits) = mantissa.split_at(1);
    let sign = match sign {
        " " | "+" => "",
        "-" => "-",
        other => return Err(malformed!("{what} '{field}' has invalid sign '{other}'")),
    };
    let mantissa: f64 = format!("{sign}0.{}", digits.replace(' ', "0"))
        .parse()
        .map_err(|e| malformed!("{what} '{field}': {e}"))?;
    let exponent: i32 = exponent
        .trim_start_matches('+')
        .parse()
        .map_err(|e| malformed!("{what} exponent '{exponent}': {e}"))?;

    Ok(mantissa * 10f64.powi(exponent))
}

/// TLE checksum over the first 68 columns: digits count their value, '-' counts 1.
pub fn compute_checksum(line: &str) -> u32 {
    line.bytes()
        .take(TLE_LINE_LEN - 1)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

/// Copy of `line` with column 69 replaced by the correct checksum.
pub fn fix_checksum(line: &str) -> String {
    let body: String = line.chars().take(TLE_LINE_LEN - 1).collect();
    let body = format!("{body:<68}");
    let checksum = compute_checksum(&body);
    format!("{body}{checksum}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TrackError;
    use crate::time::to_epoch;

    const ISS1: &str = "1 25544U 98067A   20136.53767674  .00002826  00000-0  58675-4 0  9990";
    const ISS2: &str = "2 25544  51.6449 150.0725 0001795 321.2979 176.4300 15.49373505226953";

    fn approx(expected: f64, got: f64, tol: f64) {
        let diff = (expected - got).abs();
        assert!(diff <= tol, "expected {expected}, got {got} (|Δ| = {diff})");
    }

    #[test]
    fn parses_iss_fields() {
        let tle = OrbitalElementSet::from_lines(ISS1, ISS2).unwrap();

        assert_eq!(tle.catalog_number, 25544);
        assert_eq!(tle.classification, 'U');
        assert_eq!(tle.international_designator, "98067A");
        assert_eq!(tle.epoch_year, 2020);
        approx(136.53767674, tle.epoch_day, 1.0e-12);
        approx(0.00002826, tle.mean_motion_dot, 1.0e-15);
        assert_eq!(tle.mean_motion_ddot, 0.0);
        approx(0.58675e-4, tle.bstar, 1.0e-15);
        assert_eq!(tle.ephemeris_type, 0);
        assert_eq!(tle.element_set_number, 999);
        assert_eq!(tle.revolution_number, 22695);

        approx(51.6449_f64.to_radians(), tle.inclination, 1.0e-12);
        approx(150.0725_f64.to_radians(), tle.right_ascension, 1.0e-12);
        approx(0.0001795, tle.eccentricity, 1.0e-12);
        approx(321.2979_f64.to_radians(), tle.argument_of_perigee, 1.0e-12);
        approx(176.4300_f64.to_radians(), tle.mean_anomaly, 1.0e-12);
        approx(15.49373505 / XPDOTP, tle.mean_motion, 1.0e-12);
        approx(15.49373505, tle.revs_per_day(), 1.0e-9);
    }

    #[test]
    fn epoch_is_day_of_year() {
        let tle = OrbitalElementSet::from_lines(ISS1, ISS2).unwrap();
        // day 136 of 2020 is May 15th
        let midnight = to_epoch(2020, 5, 15, 0, 0, 0).unwrap();
        assert_eq!(tle.epoch.jd(), midnight.jd());
        approx(0.53767674 * 86_400.0, tle.epoch.seconds_since(&midnight), 1.0e-4);
    }

    #[test]
    fn two_digit_years_pivot_at_57() {
        let l1 = fix_checksum("1 00005U 58002B   58179.78495062  .00000023  00000-0  28098-4 0  4753");
        let l2 = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";
        assert_eq!(OrbitalElementSet::from_lines(&l1, l2).unwrap().epoch_year, 1958);

        let l1 = fix_checksum("1 00005U 58002B   56179.78495062  .00000023  00000-0  28098-4 0  4753");
        assert_eq!(OrbitalElementSet::from_lines(&l1, l2).unwrap().epoch_year, 2056);
    }

    #[test]
    fn three_line_text_keeps_name() {
        let text = format!("ISS (ZARYA)\r\n{ISS1}\r\n{ISS2}\r\n");
        let tle = OrbitalElementSet::from_text(&text).unwrap();
        assert_eq!(tle.name.as_deref(), Some("ISS (ZARYA)"));

        let text = format!("0 ISS (ZARYA)\n{ISS1}\n{ISS2}");
        assert_eq!(OrbitalElementSet::from_text(&text).unwrap().name.as_deref(), Some("ISS (ZARYA)"));

        let tle = OrbitalElementSet::from_text(&format!("{ISS1}\n{ISS2}")).unwrap();
        assert_eq!(tle.name, None);

        assert!(OrbitalElementSet::from_text(ISS1).is_err());
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let bad = format!("{}1", &ISS1[..68]);
        let err = OrbitalElementSet::from_lines(&bad, ISS2).unwrap_err();
        assert!(matches!(err, TrackError::MalformedElementSet(ref msg) if msg.contains("checksum")));

        // a changed digit with the old checksum
        let bad2 = ISS2.replacen("51.6449", "51.6448", 1);
        assert!(matches!(
            OrbitalElementSet::from_lines(ISS1, &bad2),
            Err(TrackError::MalformedElementSet(_))
        ));
    }

    #[test]
    fn checksum_counts_minus_as_one() {
        assert_eq!(compute_checksum(ISS1), 0);
        assert_eq!(compute_checksum(ISS2), 3);
        assert_eq!(compute_checksum("1 -"), 2);
        assert_eq!(fix_checksum(&ISS1[..68]), ISS1);
        assert_eq!(fix_checksum(&format!("{}7", &ISS2[..68])), ISS2);
    }

    #[test]
    fn layout_errors_are_rejected() {
        // short line
        assert!(OrbitalElementSet::from_lines(&ISS1[..60], ISS2).is_err());
        // swapped lines
        assert!(OrbitalElementSet::from_lines(ISS2, ISS1).is_err());
        // non-ASCII
        let nbsp = ISS1.replacen("  .00002826", "\u{a0} .00002826", 1);
        assert!(OrbitalElementSet::from_lines(&nbsp, ISS2).is_err());
        // mismatched catalog numbers
        let other = fix_checksum(&ISS2.replacen("25544", "25545", 1));
        let err = OrbitalElementSet::from_lines(ISS1, &other).unwrap_err();
        assert!(err.to_string().contains("do not match"));
        // unparsable field
        let garbled = fix_checksum(&ISS2.replacen("51.6449", "51.6x49", 1));
        assert!(OrbitalElementSet::from_lines(ISS1, &garbled).is_err());
    }

    #[test]
    fn implied_decimal_fields() {
        approx(0.58675e-4, parse_implied_decimal(" 58675-4", "bstar").unwrap(), 1.0e-18);
        approx(-0.11606e-4, parse_implied_decimal("-11606-4", "bstar").unwrap(), 1.0e-18);
        approx(0.12345e3, parse_implied_decimal("+12345+3", "bstar").unwrap(), 1.0e-9);
        assert_eq!(parse_implied_decimal(" 00000-0", "nddot").unwrap(), 0.0);
        assert_eq!(parse_implied_decimal("        ", "nddot").unwrap(), 0.0);
        assert!(parse_implied_decimal("*12345-3", "bstar").is_err());
    }

    #[test]
    fn alpha5_catalog_numbers() {
        let l1 = fix_checksum(&ISS1.replacen("25544", "A5544", 1));
        let l2 = fix_checksum(&ISS2.replacen("25544", "A5544", 1));
        let tle = OrbitalElementSet::from_lines(&l1, &l2).unwrap();
        assert_eq!(tle.catalog_number, 105_544);
    }
}
