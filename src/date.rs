//! Locale-specific publication date parsing.
//!
//! Feed pages print timestamps in three Ukrainian forms:
//! `Сьогодні о 19:10`, `Вчора о 18:23`, and `06 Лют 2024 о 18:29`.
//! All are interpreted in local time. Callers substitute the current time on
//! failure.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use std::error::Error;
use std::fmt;

const TODAY: &str = "Сьогодні";
const YESTERDAY: &str = "Вчора";

const MONTH_ABBREVS: [&str; 12] = [
    "Січ", "Лют", "Бер", "Кві", "Тра", "Чер", "Лип", "Сер", "Вер", "Жов", "Лис", "Гру",
];

/// Reasons a feed timestamp failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParseError {
    /// The field count matched no supported form.
    UnsupportedFormat,
    /// The day component is not a number.
    InvalidDay,
    /// The hour component is not a number.
    InvalidHour,
    /// The minute component is not a number.
    InvalidMinute,
    /// The year component is not a number.
    InvalidYear,
    /// The month abbreviation is not one of the twelve known tokens.
    UnknownMonthAbbrev,
    /// The components form no valid local timestamp.
    OutOfRange,
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::UnsupportedFormat => "unsupported date format",
            Self::InvalidDay => "invalid day format",
            Self::InvalidHour => "invalid hour format",
            Self::InvalidMinute => "invalid minute format",
            Self::InvalidYear => "invalid year format",
            Self::UnknownMonthAbbrev => "unknown month abbreviation",
            Self::OutOfRange => "date out of range",
        };
        write!(f, "{reason}")
    }
}

impl Error for DateParseError {}

/// Parses a feed timestamp into a local [`DateTime`].
pub fn parse_feed_date(input: &str) -> Result<DateTime<Local>, DateParseError> {
    let fields: Vec<&str> = input.split_whitespace().collect();
    match fields.len() {
        3 => parse_relative(fields[0], fields[2]),
        5 => parse_absolute(fields[0], fields[1], fields[2], fields[4]),
        _ => Err(DateParseError::UnsupportedFormat),
    }
}

fn parse_relative(day: &str, clock: &str) -> Result<DateTime<Local>, DateParseError> {
    let base = match day {
        TODAY => Local::now(),
        YESTERDAY => Local::now() - Duration::days(1),
        _ => return Err(DateParseError::UnsupportedFormat),
    };
    let (hour, minute) = parse_clock(clock)?;
    at_local(base.date_naive(), hour, minute)
}

fn parse_absolute(
    day: &str,
    month_abbrev: &str,
    year: &str,
    clock: &str,
) -> Result<DateTime<Local>, DateParseError> {
    let month = MONTH_ABBREVS
        .iter()
        .position(|abbrev| *abbrev == month_abbrev)
        .ok_or(DateParseError::UnknownMonthAbbrev)? as u32
        + 1;
    let year: i32 = year.parse().map_err(|_| DateParseError::InvalidYear)?;
    let day: u32 = day.parse().map_err(|_| DateParseError::InvalidDay)?;
    let (hour, minute) = parse_clock(clock)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateParseError::OutOfRange)?;
    at_local(date, hour, minute)
}

fn parse_clock(clock: &str) -> Result<(u32, u32), DateParseError> {
    let (hour, minute) = clock.split_once(':').ok_or(DateParseError::InvalidHour)?;
    let hour = hour.parse().map_err(|_| DateParseError::InvalidHour)?;
    let minute = minute.parse().map_err(|_| DateParseError::InvalidMinute)?;
    Ok((hour, minute))
}

fn at_local(date: NaiveDate, hour: u32, minute: u32) -> Result<DateTime<Local>, DateParseError> {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or(DateParseError::OutOfRange)?;
    Local
        .from_local_datetime(&naive)
        .single()
        .ok_or(DateParseError::OutOfRange)
}
