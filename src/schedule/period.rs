//! Job periods: `every N <second|minute|hour|day>`

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::{Error, Result};

/// Granularity of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// One second
    Second,
    /// Sixty seconds
    Minute,
    /// Sixty minutes
    Hour,
    /// Twenty-four hours
    Day,
}

impl Period {
    /// Accepted spellings, in increasing granularity.
    pub const SUPPORTED: [&'static str; 4] = ["second", "minute", "hour", "day"];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    const fn seconds(self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            other => Err(Error::UnsupportedPeriod(other.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `every N <period>` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    every: u32,
    period: Period,
}

impl Interval {
    /// Create an interval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `every` is zero.
    pub fn new(every: u32, period: Period) -> Result<Self> {
        if every == 0 {
            return Err(Error::InvalidInput(
                "schedule 'every' must be a positive integer".to_string(),
            ));
        }
        Ok(Self { every, period })
    }

    /// Parse an interval from its configuration surface.
    ///
    /// ```rust
    /// use facewatch::schedule::Interval;
    ///
    /// let interval = Interval::parse(5, "minute")?;
    /// assert_eq!(interval.as_delta().num_seconds(), 300);
    /// assert!(Interval::parse(1, "fortnight").is_err());
    /// # Ok::<(), facewatch::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPeriod` for an unknown period and `InvalidInput`
    /// for a zero count.
    pub fn parse(every: u32, period: &str) -> Result<Self> {
        Self::new(every, period.parse()?)
    }

    /// Repeat count.
    #[must_use]
    pub const fn every(&self) -> u32 {
        self.every
    }

    /// Granularity.
    #[must_use]
    pub const fn period(&self) -> Period {
        self.period
    }

    /// Interval length.
    #[must_use]
    pub fn as_delta(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.every) * self.period.seconds())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} {}", self.every, self.period)
    }
}
