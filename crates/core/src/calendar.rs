//! Calendar-day arithmetic
//!
//! Turns caller-supplied bounds (zoned, naive, or bare-date) into ordered
//! sequences of whole calendar days and half-open extraction windows.
//! "Metrics as of day N" must have one unambiguous meaning no matter when
//! within the day an event occurred, so everything here works on civil
//! dates and civil instants, never on converted zones.

use chrono::{NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::values::{CivilDate, DayBound};

/// Errors for window and day-range construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid window: start {start} is after end {end}")]
    Inverted {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("date {0} is outside the supported calendar range")]
    OutOfRange(CivilDate),
}

pub type WindowResult<T> = std::result::Result<T, WindowError>;

/// Civil midnight at the start of `date`
pub fn day_start(date: CivilDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Civil midnight at the start of the day after `date`, i.e. the instant
/// strictly after every moment of `date`
pub fn day_end(date: CivilDate) -> WindowResult<NaiveDateTime> {
    date.succ_opt()
        .map(day_start)
        .ok_or(WindowError::OutOfRange(date))
}

/// Every calendar day strictly between `a` and `b`, ascending.
///
/// Both operands are truncated to their own civil date first, so
/// time-of-day noise and zone offsets on one side never shift the day of
/// the other. Both boundary days are excluded even when `a` or `b` carry a
/// nonzero time-of-day. Spans of one day or less yield an empty range;
/// `date(a) > date(b)` is an error.
pub fn days_between(a: impl Into<DayBound>, b: impl Into<DayBound>) -> WindowResult<DayRange> {
    let a = a.into();
    let b = b.into();
    let start = a.civil_date();
    let end = b.civil_date();

    if start > end {
        return Err(WindowError::Inverted {
            start: a.civil_time(),
            end: b.civil_time(),
        });
    }

    match (start.succ_opt(), end.pred_opt()) {
        (Some(first), Some(last)) => Ok(DayRange::closed(first, last)),
        _ => Ok(DayRange::empty()),
    }
}

/// Finite ascending sequence of calendar days.
///
/// Restartable: cloning (or rebuilding with identical inputs) always
/// reproduces the identical sequence; there is no hidden iteration state
/// beyond the cursor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRange {
    next: Option<CivilDate>,
    last: CivilDate,
}

impl DayRange {
    /// The inclusive range `[first, last]`; empty when `last < first`
    pub fn closed(first: CivilDate, last: CivilDate) -> Self {
        Self {
            next: (first <= last).then_some(first),
            last,
        }
    }

    /// The empty range
    pub fn empty() -> Self {
        Self {
            next: None,
            last: CivilDate::MIN,
        }
    }

    /// Whether the remaining sequence is empty
    pub fn is_empty(&self) -> bool {
        self.next.is_none()
    }
}

impl Iterator for DayRange {
    type Item = CivilDate;

    fn next(&mut self) -> Option<CivilDate> {
        let current = self.next.take()?;
        self.next = current.succ_opt().filter(|d| *d <= self.last);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = match self.next {
            Some(next) => (self.last - next).num_days() as usize + 1,
            None => 0,
        };
        (len, Some(len))
    }
}

impl ExactSizeIterator for DayRange {}

/// Half-open time interval `[start, end)` over civil instants, the scope
/// of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Window {
    /// Build a window, rejecting `start > end`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> WindowResult<Self> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The window covering exactly the calendar day `date`
    pub fn for_date(date: CivilDate) -> WindowResult<Self> {
        Ok(Self {
            start: day_start(date),
            end: day_end(date)?,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// An empty window (`start == end`) contains no instants
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open containment: `start <= t < end`
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
