//! Filename conventions for content documents.
//!
//! A document's file stem may carry ordering information ahead of its name:
//!
//! - `2016-05-12-navigation-bar-theming`: a dated post. The date orders the
//!   post (newest first) and becomes part of its URL.
//! - `010-about`: a numbered page, ordered by number after dated posts.
//! - `colophon`: neither. Ordered by slug after everything else.
//!
//! ## Display Titles
//!
//! Dashes in the name portion are converted to spaces for display:
//! - `2016-05-12-navigation-bar-theming` → "navigation bar theming"
//! - `040-who-am-i` → "who am i"

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Calendar date taken from a filename or a front-matter `date` value.
///
/// Day counts follow the Gregorian calendar, so `2017-02-31` and
/// `2019-02-29` are not dates. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl PostDate {
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        let days = days_in_month(year, month)?;
        (1..=days).contains(&day).then_some(Self { year, month, day })
    }

    /// URL directory for a dated post: `2016/05/12`.
    pub fn url_dir(&self) -> String {
        format!("{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for PostDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

fn days_in_month(year: u16, month: u8) -> Option<u8> {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if leap => Some(29),
        2 => Some(28),
        _ => None,
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Not a YYYY-MM-DD date: {0:?}")]
pub struct InvalidDate(pub String);

impl FromStr for PostDate {
    type Err = InvalidDate;

    /// Parse `YYYY-MM-DD`. Anything after the day separated by whitespace or
    /// `T` (a time, a zone) is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let date_part = s.split([' ', 'T']).next().unwrap_or(s);
        parse_date_prefix(date_part)
            .filter(|(_, rest)| rest.is_empty())
            .map(|(date, _)| date)
            .ok_or_else(|| InvalidDate(s.to_string()))
    }
}

/// Result of parsing a document file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix (`YYYY-MM-DD-`) if present.
    pub date: Option<PostDate>,
    /// Number prefix (`NNN-`) if present. Never set together with `date`.
    pub number: Option<u32>,
    /// Name part after any prefix, dashes preserved. Empty if prefix-only.
    pub name: String,
    /// Display title: name with dashes converted to spaces.
    pub display_title: String,
}

/// Parse a document file stem.
///
/// - `"2016-05-12-nav-bar"` → date=2016-05-12, name="nav-bar"
/// - `"2016-05-12"` → date=2016-05-12, name=""
/// - `"010-about-me"` → number=10, name="about-me", display_title="about me"
/// - `"001"` → number=1, name=""
/// - `"colophon"` → no prefix, name="colophon"
/// - `"2016-13-01-x"` → month 13 is not a date; parsed as number=2016, name="13-01-x"
pub fn parse_entry_name(stem: &str) -> ParsedName {
    if let Some((date, rest)) = parse_date_prefix(stem) {
        if rest.is_empty() {
            return parsed(Some(date), None, "");
        }
        if let Some(name) = rest.strip_prefix('-') {
            return parsed(Some(date), None, name);
        }
    }

    if let Some((prefix, name)) = stem.split_once('-')
        && let Ok(num) = prefix.parse::<u32>()
    {
        return parsed(None, Some(num), name);
    }

    if let Ok(num) = stem.parse::<u32>() {
        return parsed(None, Some(num), "");
    }

    parsed(None, None, stem)
}

fn parsed(date: Option<PostDate>, number: Option<u32>, name: &str) -> ParsedName {
    ParsedName {
        date,
        number,
        name: name.to_string(),
        display_title: name.replace('-', " "),
    }
}

/// Parse a leading `YYYY-MM-DD`, returning the date and the unparsed rest.
fn parse_date_prefix(s: &str) -> Option<(PostDate, &str)> {
    let bytes = s.as_bytes();
    if bytes.len() < 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = s.get(range)?;
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()
    };
    let year = u16::try_from(digits(0..4)?).ok()?;
    let month = u8::try_from(digits(5..7)?).ok()?;
    let day = u8::try_from(digits(8..10)?).ok()?;
    let date = PostDate::new(year, month, day)?;
    Some((date, &s[10..]))
}
