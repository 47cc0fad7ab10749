//! Retention window parsing and sweep planning
//!
//! A retention window is configured as a `(unit, magnitude)` pair. Records
//! whose age reaches the window become deletion candidates; planning orders
//! them newest-first so that an interrupted sweep leaves the oldest records
//! behind for at most one extra cycle.

use crate::store::BackupRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unrecognized retention unit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unrecognized retention unit '{0}' (expected weeks|days|hours|minutes|seconds|milliseconds|microseconds)"
)]
pub struct InvalidRetentionUnit(pub String);

/// Units a retention window may be configured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionUnit {
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Microseconds,
}

impl RetentionUnit {
    /// Get a display string for the unit
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weeks => "weeks",
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
            Self::Microseconds => "microseconds",
        }
    }
}

impl FromStr for RetentionUnit {
    type Err = InvalidRetentionUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weeks" => Ok(Self::Weeks),
            "days" => Ok(Self::Days),
            "hours" => Ok(Self::Hours),
            "minutes" => Ok(Self::Minutes),
            "seconds" => Ok(Self::Seconds),
            "milliseconds" => Ok(Self::Milliseconds),
            "microseconds" => Ok(Self::Microseconds),
            other => Err(InvalidRetentionUnit(other.to_string())),
        }
    }
}

impl fmt::Display for RetentionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maximum age a backup may reach before becoming eligible for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionWindow {
    pub unit: RetentionUnit,
    pub magnitude: u32,
}

impl RetentionWindow {
    /// Create a retention window
    pub fn new(unit: RetentionUnit, magnitude: u32) -> Self {
        Self { unit, magnitude }
    }

    /// Convert to a concrete duration
    pub fn to_duration(self) -> Duration {
        let n = i64::from(self.magnitude);
        match self.unit {
            RetentionUnit::Weeks => Duration::weeks(n),
            RetentionUnit::Days => Duration::days(n),
            RetentionUnit::Hours => Duration::hours(n),
            RetentionUnit::Minutes => Duration::minutes(n),
            RetentionUnit::Seconds => Duration::seconds(n),
            RetentionUnit::Milliseconds => Duration::milliseconds(n),
            RetentionUnit::Microseconds => Duration::microseconds(n),
        }
    }

    /// Oldest creation time that is still kept, relative to `now`
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.to_duration()
    }
}

impl fmt::Display for RetentionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

/// Select the records whose age has reached the cutoff, newest first.
///
/// A record created exactly at the cutoff has reached the full retention
/// window and is a deletion candidate.
pub fn expired_newest_first(
    records: Vec<BackupRecord>,
    cutoff: DateTime<Utc>,
) -> Vec<BackupRecord> {
    let mut expired: Vec<BackupRecord> = records
        .into_iter()
        .filter(|r| r.created_at <= cutoff)
        .collect();
    expired.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    expired
}
