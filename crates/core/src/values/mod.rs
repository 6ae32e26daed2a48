use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Calendar day, independent of time-of-day or zone
pub type CivilDate = NaiveDate;

/// Instant with an explicit UTC offset
pub type Timestamp = DateTime<FixedOffset>;

/// A point in time as supplied by callers: a zoned instant, a naive
/// local datetime, or a bare calendar date.
///
/// The calendar day of a bound is always taken in the bound's own
/// context. A zoned instant is never converted into another zone, so a
/// bare date on one side of a window cannot shift the day of a zoned
/// instant on the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    /// Instant carrying its own UTC offset
    Zoned(Timestamp),
    /// Civil datetime with no offset
    Naive(NaiveDateTime),
    /// Bare calendar date, treated as midnight with no offset
    Date(CivilDate),
}

impl DayBound {
    /// Calendar day of this bound in its own zone context
    pub fn civil_date(self) -> CivilDate {
        match self {
            DayBound::Zoned(ts) => ts.date_naive(),
            DayBound::Naive(dt) => dt.date(),
            DayBound::Date(d) => d,
        }
    }

    /// Civil (own-zone) instant of this bound; bare dates map to midnight
    pub fn civil_time(self) -> NaiveDateTime {
        match self {
            DayBound::Zoned(ts) => ts.naive_local(),
            DayBound::Naive(dt) => dt,
            DayBound::Date(d) => d.and_time(NaiveTime::MIN),
        }
    }
}

impl From<Timestamp> for DayBound {
    fn from(ts: Timestamp) -> Self {
        DayBound::Zoned(ts)
    }
}

impl From<DateTime<Utc>> for DayBound {
    fn from(ts: DateTime<Utc>) -> Self {
        DayBound::Zoned(ts.fixed_offset())
    }
}

impl From<NaiveDateTime> for DayBound {
    fn from(dt: NaiveDateTime) -> Self {
        DayBound::Naive(dt)
    }
}

impl From<CivilDate> for DayBound {
    fn from(d: CivilDate) -> Self {
        DayBound::Date(d)
    }
}
