use crate::xsd::{Decimal, XsdLexicalError};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// [XML Schema `dateTime` datatype](https://www.w3.org/TR/xmlschema11-2/#dateTime)
///
/// Stores the broken-down calendar components plus fractional seconds and an
/// optional timezone offset. Equality, ordering and hashing are based on the
/// absolute instant; a value without a timezone is interpreted as UTC so that
/// `ORDER BY` stays total.
#[derive(Debug, Clone, Copy)]
pub struct DateTime {
    year: i64,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
    timezone_offset: Option<TimezoneOffset>,
}

impl DateTime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i64,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        nanosecond: u32,
        timezone_offset: Option<TimezoneOffset>,
    ) -> Result<Self, DateTimeOverflowError> {
        if !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
            || nanosecond >= NANOS_PER_SECOND
        {
            return Err(DateTimeOverflowError);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond,
            timezone_offset,
        })
    }

    /// The current instant, in UTC.
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => {
                let mut value = Self::from_unix_seconds(i64::try_from(duration.as_secs()).unwrap_or(0));
                value.nanosecond = duration.subsec_nanos();
                value
            }
            Err(_) => Self::from_unix_seconds(0),
        }
    }

    /// Builds the UTC date-time for the given number of seconds since the Unix epoch.
    pub fn from_unix_seconds(seconds: i64) -> Self {
        let days = seconds.div_euclid(86_400);
        let remainder = seconds.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            hour: (remainder / 3_600) as u8,
            minute: (remainder % 3_600 / 60) as u8,
            second: (remainder % 60) as u8,
            nanosecond: 0,
            timezone_offset: Some(TimezoneOffset::UTC),
        }
    }

    /// Seconds since the Unix epoch; a missing timezone is interpreted as UTC.
    pub fn to_unix_seconds(self) -> i64 {
        let local = days_from_civil(self.year, self.month, self.day) * 86_400
            + i64::from(self.hour) * 3_600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        local - i64::from(self.timezone_offset.map_or(0, TimezoneOffset::in_minutes)) * 60
    }

    #[inline]
    pub fn year(self) -> i64 {
        self.year
    }

    #[inline]
    pub fn month(self) -> u8 {
        self.month
    }

    #[inline]
    pub fn day(self) -> u8 {
        self.day
    }

    #[inline]
    pub fn hour(self) -> u8 {
        self.hour
    }

    #[inline]
    pub fn minute(self) -> u8 {
        self.minute
    }

    /// The seconds component including the fractional part.
    pub fn second(self) -> Decimal {
        let whole = Decimal::from(i64::from(self.second));
        // The fraction fits in the nine digits a Decimal keeps
        whole
            .checked_add(
                Decimal::from(i64::from(self.nanosecond))
                    .checked_div(Decimal::from(i64::from(NANOS_PER_SECOND)))
                    .unwrap_or_default(),
            )
            .unwrap_or(whole)
    }

    #[inline]
    pub fn timezone_offset(self) -> Option<TimezoneOffset> {
        self.timezone_offset
    }

    /// The date part of this value, keeping the timezone.
    pub fn date(self) -> Date {
        Date {
            year: self.year,
            month: self.month,
            day: self.day,
            timezone_offset: self.timezone_offset,
        }
    }
}

impl PartialEq for DateTime {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DateTime {}

impl Hash for DateTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_unix_seconds().hash(state);
        self.nanosecond.hash(state);
    }
}

impl PartialOrd for DateTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_unix_seconds()
            .cmp(&other.to_unix_seconds())
            .then_with(|| self.nanosecond.cmp(&other.nanosecond))
    }
}

impl FromStr for DateTime {
    type Err = XsdLexicalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || XsdLexicalError::new("dateTime", input);
        let (date_part, rest) = input.split_once('T').ok_or_else(error)?;
        let (year, month, day) = parse_date_part(date_part).ok_or_else(error)?;
        let (time_part, timezone_offset) = split_timezone(rest).ok_or_else(error)?;
        let (hour, minute, second, nanosecond) = parse_time_part(time_part).ok_or_else(error)?;
        // 24:00:00 is valid XSD syntax for the end of the day
        if hour == 24 && minute == 0 && second == 0 && nanosecond == 0 {
            Self::new(year, month, day, 0, 0, 0, 0, timezone_offset).map_err(|_| error())?;
            let (year, month, day) = civil_from_days(days_from_civil(year, month, day) + 1);
            return Self::new(year, month, day, 0, 0, 0, 0, timezone_offset).map_err(|_| error());
        }
        Self::new(year, month, day, hour, minute, second, nanosecond, timezone_offset)
            .map_err(|_| error())
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_year(f, self.year)?;
        write!(
            f,
            "-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.month, self.day, self.hour, self.minute, self.second
        )?;
        write_fraction(f, self.nanosecond)?;
        if let Some(timezone_offset) = self.timezone_offset {
            timezone_offset.fmt(f)?;
        }
        Ok(())
    }
}

/// [XML Schema `date` datatype](https://www.w3.org/TR/xmlschema11-2/#date)
#[derive(Debug, Clone, Copy)]
pub struct Date {
    year: i64,
    month: u8,
    day: u8,
    timezone_offset: Option<TimezoneOffset>,
}

impl Date {
    pub fn new(
        year: i64,
        month: u8,
        day: u8,
        timezone_offset: Option<TimezoneOffset>,
    ) -> Result<Self, DateTimeOverflowError> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(DateTimeOverflowError);
        }
        Ok(Self {
            year,
            month,
            day,
            timezone_offset,
        })
    }

    #[inline]
    pub fn year(self) -> i64 {
        self.year
    }

    #[inline]
    pub fn month(self) -> u8 {
        self.month
    }

    #[inline]
    pub fn day(self) -> u8 {
        self.day
    }

    #[inline]
    pub fn timezone_offset(self) -> Option<TimezoneOffset> {
        self.timezone_offset
    }

    /// Midnight at the start of this date, used for comparisons.
    pub fn to_date_time(self) -> DateTime {
        DateTime {
            year: self.year,
            month: self.month,
            day: self.day,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
            timezone_offset: self.timezone_offset,
        }
    }
}

impl PartialEq for Date {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.to_date_time() == other.to_date_time()
    }
}

impl Eq for Date {}

impl Hash for Date {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_date_time().hash(state);
    }
}

impl PartialOrd for Date {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Date {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_date_time().cmp(&other.to_date_time())
    }
}

impl FromStr for Date {
    type Err = XsdLexicalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || XsdLexicalError::new("date", input);
        let (date_part, timezone_offset) = split_timezone(input).ok_or_else(error)?;
        let (year, month, day) = parse_date_part(date_part).ok_or_else(error)?;
        Self::new(year, month, day, timezone_offset).map_err(|_| error())
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_year(f, self.year)?;
        write!(f, "-{:02}-{:02}", self.month, self.day)?;
        if let Some(timezone_offset) = self.timezone_offset {
            timezone_offset.fmt(f)?;
        }
        Ok(())
    }
}

/// A timezone offset with respect to UTC, in minutes.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub struct TimezoneOffset {
    minutes: i16,
}

impl TimezoneOffset {
    pub const UTC: Self = Self { minutes: 0 };

    /// Builds an offset, validating the ±14:00 XSD bound.
    pub fn new(minutes: i16) -> Result<Self, DateTimeOverflowError> {
        if (-14 * 60..=14 * 60).contains(&minutes) {
            Ok(Self { minutes })
        } else {
            Err(DateTimeOverflowError)
        }
    }

    #[inline]
    pub fn in_minutes(self) -> i16 {
        self.minutes
    }

    /// The offset as an `xsd:dayTimeDuration` lexical form, e.g. `-PT5H30M` or `PT0S`.
    pub fn duration_lexical(self) -> String {
        if self.minutes == 0 {
            return "PT0S".to_owned();
        }
        let mut out = String::new();
        if self.minutes < 0 {
            out.push('-');
        }
        out.push_str("PT");
        let magnitude = self.minutes.unsigned_abs();
        let hours = magnitude / 60;
        let minutes = magnitude % 60;
        if hours > 0 {
            out.push_str(&hours.to_string());
            out.push('H');
        }
        if minutes > 0 {
            out.push_str(&minutes.to_string());
            out.push('M');
        }
        out
    }
}

impl fmt::Display for TimezoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes == 0 {
            return f.write_str("Z");
        }
        let magnitude = self.minutes.unsigned_abs();
        write!(
            f,
            "{}{:02}:{:02}",
            if self.minutes < 0 { '-' } else { '+' },
            magnitude / 60,
            magnitude % 60
        )
    }
}

/// An error raised when date-time components are out of their valid range.
#[derive(Debug, Clone, thiserror::Error)]
#[error("the date-time components are out of range")]
pub struct DateTimeOverflowError;

fn is_leap_year(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i64, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Days between the civil date and 1970-01-01, using Howard Hinnant's algorithm.
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = if year >= 0 { year } else { year - 399 } / 400;
    let year_of_era = year - era * 400;
    let month = i64::from(month);
    let day_of_year = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5
        + i64::from(day)
        - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}

fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let days = days + 719_468;
    let era = if days >= 0 { days } else { days - 146_096 } / 146_097;
    let day_of_era = days - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let year = year_of_era + era * 400;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

fn write_year(f: &mut fmt::Formatter<'_>, year: i64) -> fmt::Result {
    if year < 0 {
        write!(f, "-{:04}", -year)
    } else {
        write!(f, "{year:04}")
    }
}

fn write_fraction(f: &mut fmt::Formatter<'_>, nanosecond: u32) -> fmt::Result {
    if nanosecond == 0 {
        return Ok(());
    }
    let mut fraction = nanosecond;
    let mut digits: usize = 9;
    while fraction % 10 == 0 {
        fraction /= 10;
        digits -= 1;
    }
    write!(f, ".{fraction:0>digits$}")
}

/// Parses `YYYY-MM-DD` with an optional sign and more than four year digits.
fn parse_date_part(input: &str) -> Option<(i64, u8, u8)> {
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let mut parts = input.splitn(3, '-');
    let year_part = parts.next()?;
    let month_part = parts.next()?;
    let day_part = parts.next()?;
    if year_part.len() < 4 || (year_part.len() > 4 && year_part.starts_with('0')) {
        return None;
    }
    let mut year = parse_digits(year_part)? as i64;
    if negative {
        year = -year;
    }
    if month_part.len() != 2 || day_part.len() != 2 {
        return None;
    }
    Some((year, parse_digits(month_part)? as u8, parse_digits(day_part)? as u8))
}

/// Parses `hh:mm:ss` with optional fractional seconds, up to nine digits.
fn parse_time_part(input: &str) -> Option<(u8, u8, u8, u32)> {
    let mut parts = input.splitn(3, ':');
    let hour_part = parts.next()?;
    let minute_part = parts.next()?;
    let second_part = parts.next()?;
    if hour_part.len() != 2 || minute_part.len() != 2 {
        return None;
    }
    let (second_part, fraction_part) = match second_part.split_once('.') {
        Some((second_part, fraction_part)) => (second_part, Some(fraction_part)),
        None => (second_part, None),
    };
    if second_part.len() != 2 {
        return None;
    }
    let nanosecond = match fraction_part {
        Some(fraction) => {
            if fraction.is_empty() || fraction.len() > 9 {
                return None;
            }
            (parse_digits(fraction)? as u32) * 10_u32.pow(9 - fraction.len() as u32)
        }
        None => 0,
    };
    Some((
        parse_digits(hour_part)? as u8,
        parse_digits(minute_part)? as u8,
        parse_digits(second_part)? as u8,
        nanosecond,
    ))
}

/// Splits a trailing timezone designator (`Z` or `±hh:mm`) from a lexical form.
fn split_timezone(input: &str) -> Option<(&str, Option<TimezoneOffset>)> {
    if let Some(rest) = input.strip_suffix('Z') {
        return Some((rest, Some(TimezoneOffset::UTC)));
    }
    // ±hh:mm is always the last six characters when present
    if input.len() > 6 {
        let (head, tail) = input.split_at(input.len() - 6);
        let bytes = tail.as_bytes();
        if (bytes[0] == b'+' || bytes[0] == b'-') && bytes[3] == b':' {
            let hours = parse_digits(&tail[1..3])?;
            let minutes = parse_digits(&tail[4..6])?;
            if minutes > 59 {
                return None;
            }
            let mut total = (hours * 60 + minutes) as i16;
            if bytes[0] == b'-' {
                total = -total;
            }
            return Some((head, Some(TimezoneOffset::new(total).ok()?)));
        }
    }
    Some((input, None))
}

fn parse_digits(input: &str) -> Option<u64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    u64::from_str(input).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_time_round_trips() {
        for lexical in [
            "2023-06-07T08:09:10",
            "2023-06-07T08:09:10Z",
            "2023-06-07T08:09:10.5-05:30",
            "-0042-01-01T00:00:00",
            "2024-02-29T23:59:59.999999999+14:00",
        ] {
            assert_eq!(DateTime::from_str(lexical).unwrap().to_string(), lexical);
        }
        assert!(DateTime::from_str("2023-02-29T00:00:00").is_err());
        assert!(DateTime::from_str("2023-06-07").is_err());
    }

    #[test]
    fn date_round_trips() {
        for lexical in ["2023-06-07", "2023-06-07Z", "2023-06-07+05:00"] {
            assert_eq!(Date::from_str(lexical).unwrap().to_string(), lexical);
        }
    }

    #[test]
    fn ordering_is_by_instant() {
        let utc = DateTime::from_str("2023-06-07T12:00:00Z").unwrap();
        let offset = DateTime::from_str("2023-06-07T14:00:00+02:00").unwrap();
        assert_eq!(utc, offset);
        assert!(DateTime::from_str("2023-06-07T12:00:01Z").unwrap() > utc);
    }

    #[test]
    fn unix_conversion_round_trips() {
        for seconds in [0, 951_782_400, -12_345_678_900] {
            assert_eq!(DateTime::from_unix_seconds(seconds).to_unix_seconds(), seconds);
        }
        assert_eq!(
            DateTime::from_unix_seconds(951_782_400).to_string(),
            "2000-02-29T00:00:00Z"
        );
    }

    #[test]
    fn timezone_duration_lexical() {
        assert_eq!(TimezoneOffset::UTC.duration_lexical(), "PT0S");
        assert_eq!(TimezoneOffset::new(330).unwrap().duration_lexical(), "PT5H30M");
        assert_eq!(TimezoneOffset::new(-300).unwrap().duration_lexical(), "-PT5H");
    }

    #[test]
    fn end_of_day_rolls_over() {
        assert_eq!(
            DateTime::from_str("2023-06-07T24:00:00").unwrap(),
            DateTime::from_str("2023-06-08T00:00:00").unwrap()
        );
    }
}
