//! Segment file names: `YYYY-MM-DD-HH-MM-SS-<token>.csv`
//!
//! Names sort lexically in the same order they were issued. The token is a
//! fixed-width hex counter seeded from the rotation instant and forced above
//! the newest existing token, so two rotations within one second (or after
//! the wall clock steps backwards) still produce increasing names.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, Timelike};

const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
const EXTENSION: &str = ".csv";
const TOKEN_WIDTH: usize = 16;

/// Parsed segment file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentName {
    stamp: NaiveDateTime,
    token: u64,
}

impl SegmentName {
    /// Issue the name for a rotation at `now`, strictly after `last`.
    #[must_use]
    pub fn next_after(now: DateTime<Local>, last: Option<&Self>) -> Self {
        let naive = now.naive_local();
        let stamp = naive.with_nanosecond(0).unwrap_or(naive);
        let token = now
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or_default();
        let candidate = Self { stamp, token };

        match last {
            Some(last) if candidate <= *last => Self {
                stamp: last.stamp,
                token: last.token.saturating_add(1),
            },
            _ => candidate,
        }
    }

    /// Parse a file name; `None` for anything that is not a segment.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(EXTENSION)?;
        let (stamp, token) = stem.rsplit_once('-')?;
        if token.len() != TOKEN_WIDTH || !token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return None;
        }
        Some(Self {
            stamp: NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?,
            token: u64::from_str_radix(token, 16).ok()?,
        })
    }

    /// Date and time-of-day part of the name.
    #[must_use]
    pub const fn stamp(&self) -> NaiveDateTime {
        self.stamp
    }

    /// File name on disk.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:0width$x}{EXTENSION}",
            self.stamp.format(STAMP_FORMAT),
            self.token,
            width = TOKEN_WIDTH
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, h, m, s).unwrap()
    }

    #[test]
    fn test_format_and_parse() {
        let name = SegmentName::next_after(at(14, 3, 9), None);
        let file = name.file_name();
        assert!(file.starts_with("2024-05-17-14-03-09-"), "{file}");
        assert!(file.ends_with(".csv"));
        assert_eq!(SegmentName::parse(&file), Some(name));
    }

    #[test]
    fn test_same_instant_strictly_increasing() {
        let now = at(8, 0, 0);
        let first = SegmentName::next_after(now, None);
        let second = SegmentName::next_after(now, Some(&first));
        let third = SegmentName::next_after(now, Some(&second));
        assert!(first.file_name() < second.file_name());
        assert!(second.file_name() < third.file_name());
    }

    #[test]
    fn test_clock_step_back_still_increasing() {
        let first = SegmentName::next_after(at(8, 0, 30), None);
        let earlier = at(8, 0, 30) - TimeDelta::minutes(5);
        let second = SegmentName::next_after(earlier, Some(&first));
        assert!(first.file_name() < second.file_name());
        assert_eq!(second.stamp(), first.stamp());
    }

    #[test]
    fn test_later_second_sorts_after() {
        let first = SegmentName::next_after(at(23, 59, 59), None);
        let second = SegmentName::next_after(at(23, 59, 59) + TimeDelta::seconds(1), Some(&first));
        assert!(first.file_name() < second.file_name());
        assert!(second.file_name().starts_with("2024-05-18-00-00-00-"));
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        assert_eq!(SegmentName::parse("notes.txt"), None);
        assert_eq!(SegmentName::parse("2024-05-17-14-03-09.csv"), None);
        assert_eq!(SegmentName::parse("2024-05-17-14-03-09-XYZ.csv"), None);
        assert_eq!(SegmentName::parse(".2024-05-17-14-03-09-00000000000000aa.csv.tmp"), None);
    }
}
