//! Time types for chronicle.
//!
//! [`CommitTime`] is the author-supplied commit timestamp read from the source.
//! [`Sequence`] is the store's logical clock; replay ordering never consults
//! the wall clock.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Store sequence number - monotonically increasing per snapshot store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sequence(u64);

impl Sequence {
    /// The first sequence number
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from raw value
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get raw value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for Sequence {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Commit timestamp: seconds since the Unix epoch plus the committer's UTC offset
///
/// Ordering compares the instant first; the offset only breaks exact ties so
/// the ordering stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitTime {
    /// Seconds since the Unix epoch (UTC)
    pub seconds: i64,
    /// Committer's offset from UTC in minutes
    pub offset_minutes: i32,
}

impl CommitTime {
    /// Create a commit time
    #[must_use]
    pub const fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self {
            seconds,
            offset_minutes,
        }
    }

    /// Commit time in UTC
    #[must_use]
    pub const fn from_secs(seconds: i64) -> Self {
        Self::new(seconds, 0)
    }

    /// Convert to a zoned date-time in the committer's offset
    ///
    /// # Errors
    ///
    /// Returns error if the offset or instant is out of range
    pub fn to_datetime(&self) -> CoreResult<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_minutes * 60).ok_or_else(|| {
            CoreError::InvalidTimestamp {
                reason: format!("offset out of range: {} minutes", self.offset_minutes),
            }
        })?;
        let utc = Utc
            .timestamp_opt(self.seconds, 0)
            .single()
            .ok_or_else(|| CoreError::InvalidTimestamp {
                reason: format!("instant out of range: {}", self.seconds),
            })?;
        Ok(utc.with_timezone(&offset))
    }
}

impl std::fmt::Display for CommitTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Ok(dt) => write!(f, "{}", dt.to_rfc3339()),
            Err(_) => write!(f, "@{}", self.seconds),
        }
    }
}
