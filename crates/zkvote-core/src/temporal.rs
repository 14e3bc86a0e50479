//! # Temporal Types — UTC Timestamps and Clocks
//!
//! `Timestamp` is a UTC-only instant truncated to whole seconds. Ballot
//! windows, registration times and attempt ages are all expressed in it.
//!
//! Components never call `Utc::now()` directly; they read a [`Clock`]. The
//! service uses [`SystemClock`]; tests drive a [`ManualClock`] so that
//! "ballot opens in the future" and "attempt went stale" are deterministic.
//!
//! Non-UTC inputs are rejected at parse time. There is no silent offset
//! conversion.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error constructing a [`Timestamp`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp must use Z suffix (UTC only), got {0:?}")]
    NotUtc(String),

    #[error("invalid RFC 3339 timestamp {0:?}")]
    Malformed(String),

    #[error("epoch seconds out of range: {0}")]
    OutOfRange(i64),
}

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        if !s.ends_with('Z') {
            return Err(TimestampError::NotUtc(s.to_string()));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| TimestampError::Malformed(s.to_string()))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    pub fn from_epoch_secs(secs: i64) -> Result<Self, TimestampError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or(TimestampError::OutOfRange(secs))
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// This instant shifted by `secs` (negative moves backwards).
    /// Saturates at the representable range.
    pub fn plus_secs(&self, secs: i64) -> Self {
        let shifted = self.0.timestamp().saturating_add(secs);
        DateTime::from_timestamp(shifted, 0)
            .map(Self)
            .unwrap_or(*self)
    }

    /// Whole seconds elapsed from `earlier` to `self`; negative if `earlier`
    /// is in the future.
    pub fn seconds_since(&self, earlier: Timestamp) -> i64 {
        self.epoch_secs() - earlier.epoch_secs()
    }

    /// Render as ISO 8601 with Z suffix, e.g. `2026-01-15T12:00:00Z`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    epoch_secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            epoch_secs: AtomicI64::new(start.epoch_secs()),
        }
    }

    /// A manual clock starting at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Timestamp::now())
    }

    pub fn set(&self, to: Timestamp) {
        self.epoch_secs.store(to.epoch_secs(), Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.epoch_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let secs = self.epoch_secs.load(Ordering::SeqCst);
        Timestamp::from_epoch_secs(secs).unwrap_or_else(|_| Timestamp::now())
    }
}
