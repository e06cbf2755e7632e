//! Partial dates, date-times and times
//!
//! FHIRPath temporal values carry the precision they were written with. A
//! value is stored as the earliest instant it covers plus that precision, and
//! ordering follows the precision rules in [`compare_date_times`].

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Error, Result};

/// Precision of a temporal value, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
}

impl Precision {
    /// Second and finer values are fully specified instants.
    fn is_exact(self) -> bool {
        self >= Precision::Second
    }

    fn from_fraction_digits(digits: usize) -> Precision {
        if digits <= 3 {
            Precision::Millisecond
        } else {
            Precision::Microsecond
        }
    }
}

/// Date or date-time with precision and optional UTC offset.
///
/// Dates use the same representation with `Year`..`Day` precision and no
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDateTime {
    local: NaiveDateTime,
    offset: Option<FixedOffset>,
    precision: Precision,
}

/// Time of day with precision (`Hour`..`Microsecond`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialTime {
    time: NaiveTime,
    precision: Precision,
}

fn malformed(kind: &str, text: &str) -> Error {
    Error::Parse(format!("Invalid {kind} value '{text}'"))
}

fn number<T: std::str::FromStr>(text: &str, kind: &str, original: &str) -> Result<T> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(kind, original));
    }
    text.parse().map_err(|_| malformed(kind, original))
}

/// Parses `HH[:MM[:SS[.fff...]]]`.
fn parse_clock(text: &str, kind: &str, original: &str) -> Result<(NaiveTime, Precision)> {
    let (clock, fraction) = match text.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (text, None),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.len() != 2) {
        return Err(malformed(kind, original));
    }

    let hour: u32 = number(parts[0], kind, original)?;
    let minute: u32 = parts.get(1).map_or(Ok(0), |p| number(p, kind, original))?;
    let second: u32 = parts.get(2).map_or(Ok(0), |p| number(p, kind, original))?;
    let mut precision = [Precision::Hour, Precision::Minute, Precision::Second][parts.len() - 1];

    let mut nanos = 0u32;
    if let Some(fraction) = fraction {
        if parts.len() != 3 || fraction.is_empty() {
            return Err(malformed(kind, original));
        }
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
        nanos = number(&digits, kind, original)?;
        precision = Precision::from_fraction_digits(fraction.len());
    }

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or_else(|| malformed(kind, original))?;
    Ok((time, precision))
}

/// Parses `Z` or `+HH:MM` / `-HH:MM`.
fn parse_offset(text: &str, original: &str) -> Result<FixedOffset> {
    if text == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(|| malformed("timezone", original));
    }
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'+') => (1, &text[1..]),
        Some(b'-') => (-1, &text[1..]),
        _ => return Err(malformed("timezone", original)),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| malformed("timezone", original))?;
    let hours: i32 = number(hours, "timezone", original)?;
    let minutes: i32 = number(minutes, "timezone", original)?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| malformed("timezone", original))
}

impl PartialDateTime {
    /// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    pub fn parse_date(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split('-').collect();
        let widths_ok = parts.len() <= 3
            && parts[0].len() == 4
            && parts[1..].iter().all(|p| p.len() == 2);
        if !widths_ok {
            return Err(malformed("date", text));
        }
        let year: i32 = number(parts[0], "date", text)?;
        let month: u32 = parts.get(1).map_or(Ok(1), |p| number(p, "date", text))?;
        let day: u32 = parts.get(2).map_or(Ok(1), |p| number(p, "date", text))?;
        let precision = [Precision::Year, Precision::Month, Precision::Day][parts.len() - 1];

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| malformed("date", text))?;
        Ok(Self {
            local: date.and_time(NaiveTime::MIN),
            offset: None,
            precision,
        })
    }

    /// Parses a date-time: a date, optionally followed by `T`, a time and an
    /// offset. `2014T` and `2014-01-25T` are partial date-times at the date's
    /// precision.
    pub fn parse_date_time(text: &str) -> Result<Self> {
        let Some((date_part, rest)) = text.split_once('T') else {
            return Self::parse_date(text);
        };
        let date = Self::parse_date(date_part)?;
        if rest.is_empty() {
            return Ok(date);
        }
        if date.precision != Precision::Day {
            return Err(malformed("dateTime", text));
        }

        let zone_start = rest.find(|c| matches!(c, 'Z' | '+' | '-'));
        let (clock, zone) = match zone_start {
            Some(at) => (&rest[..at], Some(&rest[at..])),
            None => (rest, None),
        };
        let (time, precision) = parse_clock(clock, "dateTime", text)?;
        let offset = zone.map(|z| parse_offset(z, text)).transpose()?;

        Ok(Self {
            local: date.local.date().and_time(time),
            offset,
            precision,
        })
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// Assigns UTC to a value written without an offset.
    pub fn or_utc(mut self) -> Self {
        if self.offset.is_none() && self.precision > Precision::Day {
            self.offset = FixedOffset::east_opt(0);
        }
        self
    }

    /// Local wall-clock value shifted into `target`. Date-precision values are
    /// calendar values and never shift.
    fn local_in(&self, target: Option<FixedOffset>) -> NaiveDateTime {
        match (self.precision > Precision::Day, self.offset, target) {
            (true, Some(own), Some(target)) => {
                let delta = target.local_minus_utc() - own.local_minus_utc();
                self.local + Duration::seconds(i64::from(delta))
            }
            _ => self.local,
        }
    }

    fn components(local: NaiveDateTime) -> [i64; 8] {
        [
            i64::from(local.year()),
            i64::from(local.month()),
            i64::from(local.day()),
            i64::from(local.hour()),
            i64::from(local.minute()),
            i64::from(local.second()),
            i64::from(local.nanosecond() / 1_000_000),
            i64::from(local.nanosecond() / 1_000 % 1_000),
        ]
    }
}

/// Orders two date-times.
///
/// Values at second precision or finer compare as instants. Otherwise both
/// are truncated to the coarser precision after moving the finer value into
/// the coarser value's offset; equal truncations at different precisions are
/// indeterminate and return `None`.
pub fn compare_date_times(a: &PartialDateTime, b: &PartialDateTime) -> Option<Ordering> {
    let coarse = a.precision.min(b.precision);
    let target = if a.precision <= b.precision {
        a.offset.or(b.offset)
    } else {
        b.offset.or(a.offset)
    }
    .or_else(|| FixedOffset::east_opt(0));

    let left = a.local_in(target);
    let right = b.local_in(target);

    if a.precision.is_exact() && b.precision.is_exact() {
        return Some(left.cmp(&right));
    }

    let depth = coarse as usize + 1;
    let ordering = PartialDateTime::components(left)[..depth]
        .cmp(&PartialDateTime::components(right)[..depth]);
    if ordering == Ordering::Equal && a.precision != b.precision {
        None
    } else {
        Some(ordering)
    }
}

/// Equality requires the same precision and the same instant.
pub fn date_times_equal(a: &PartialDateTime, b: &PartialDateTime) -> bool {
    a.precision == b.precision && compare_date_times(a, b) == Some(Ordering::Equal)
}

impl PartialTime {
    /// Parses `HH[:MM[:SS[.fff]]]`, with or without a leading `T`.
    pub fn parse(text: &str) -> Result<Self> {
        let clock = text.strip_prefix('T').unwrap_or(text);
        let (time, precision) = parse_clock(clock, "time", text)?;
        Ok(Self { time, precision })
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    fn components(&self) -> [i64; 5] {
        [
            i64::from(self.time.hour()),
            i64::from(self.time.minute()),
            i64::from(self.time.second()),
            i64::from(self.time.nanosecond() / 1_000_000),
            i64::from(self.time.nanosecond() / 1_000 % 1_000),
        ]
    }
}

/// Orders two times with the same precision rules as date-times.
pub fn compare_times(a: &PartialTime, b: &PartialTime) -> Option<Ordering> {
    if a.precision.is_exact() && b.precision.is_exact() {
        return Some(a.time.cmp(&b.time));
    }
    let depth = a.precision.min(b.precision) as usize - Precision::Hour as usize + 1;
    let ordering = a.components()[..depth].cmp(&b.components()[..depth]);
    if ordering == Ordering::Equal && a.precision != b.precision {
        None
    } else {
        Some(ordering)
    }
}

fn write_fraction(f: &mut fmt::Formatter<'_>, nanos: u32, precision: Precision) -> fmt::Result {
    match precision {
        Precision::Millisecond => write!(f, ".{:03}", nanos / 1_000_000),
        Precision::Microsecond => write!(f, ".{:06}", nanos / 1_000),
        _ => Ok(()),
    }
}

fn write_clock(f: &mut fmt::Formatter<'_>, time: NaiveTime, precision: Precision) -> fmt::Result {
    write!(f, "{:02}", time.hour())?;
    if precision >= Precision::Minute {
        write!(f, ":{:02}", time.minute())?;
    }
    if precision >= Precision::Second {
        write!(f, ":{:02}", time.second())?;
    }
    write_fraction(f, time.nanosecond(), precision)
}

impl fmt::Display for PartialDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.local.year())?;
        if self.precision >= Precision::Month {
            write!(f, "-{:02}", self.local.month())?;
        }
        if self.precision >= Precision::Day {
            write!(f, "-{:02}", self.local.day())?;
        }
        if self.precision <= Precision::Day {
            return Ok(());
        }
        f.write_str("T")?;
        write_clock(f, self.local.time(), self.precision)?;
        match self.offset.map(|o| o.local_minus_utc()) {
            Some(0) => f.write_str("Z"),
            Some(seconds) => {
                let sign = if seconds < 0 { '-' } else { '+' };
                let seconds = seconds.abs();
                write!(f, "{sign}{:02}:{:02}", seconds / 3600, seconds % 3600 / 60)
            }
            None => Ok(()),
        }
    }
}

impl fmt::Display for PartialTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clock(f, self.time, self.precision)
    }
}
