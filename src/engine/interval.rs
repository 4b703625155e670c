use chrono::{Duration, NaiveDateTime};

use super::error::{EngineError, EngineResult};

/// Half-open time interval `[start, end)`. Touching endpoints do not
/// overlap, so a slot ending at 11:00 and one starting at 11:00 can share
/// a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> EngineResult<Self> {
        if start >= end {
            return Err(EngineError::InvalidState(
                "interval start must precede its end".to_string(),
            ));
        }
        Ok(Interval { start, end })
    }

    /// Interval covering `minutes` starting at `start`.
    pub fn span(start: NaiveDateTime, minutes: i32) -> EngineResult<Self> {
        Interval::new(start, start + Duration::minutes(i64::from(minutes)))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// The one overlap predicate of the engine: `a.start < b.end` and
    /// `b.start < a.end`.
    pub fn overlaps(&self, other_start: NaiveDateTime, other_end: NaiveDateTime) -> bool {
        self.start < other_end && other_start < self.end
    }
}
