//! Half-open time windows
//!
//! Both availability and appointments are expressed as `[start, end)`
//! ranges. A window can only be constructed with `start < end`.
//!
//! Bounds are kept at millisecond precision, the resolution the stores
//! persist, so every backend sees the same instants.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

use crate::{Error, Result};

/// A non-empty half-open range `[start, end)` in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting empty and inverted ranges.
    ///
    /// Both bounds are truncated to whole milliseconds first, so a range
    /// shorter than a millisecond can come out empty.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        let start = truncate_to_millis(start);
        let end = truncate_to_millis(end);
        if end <= start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `other` lies entirely inside this window
    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// Whether the two windows share any instant
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Split this window around `booked`, returning what is left over.
    ///
    /// Yields zero, one or two windows in start order. Returns `None` when
    /// `booked` is not contained in `self`.
    pub fn carve(&self, booked: &TimeWindow) -> Option<Vec<TimeWindow>> {
        if !self.contains(booked) {
            return None;
        }

        let mut remainder = Vec::with_capacity(2);
        if self.start < booked.start {
            remainder.push(TimeWindow {
                start: self.start,
                end: booked.start,
            });
        }
        if booked.end < self.end {
            remainder.push(TimeWindow {
                start: booked.end,
                end: self.end,
            });
        }
        Some(remainder)
    }
}

fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = instant.nanosecond();
    instant
        .with_nanosecond(nanos - nanos % 1_000_000)
        .unwrap_or(instant)
}
