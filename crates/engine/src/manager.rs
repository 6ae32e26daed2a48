//! Extraction orchestration
//!
//! The manager owns scheduling only: it builds the calendar-day sequence
//! for a request, hands each definition a lazy step over those dates, and
//! holds no mutable cross-call state. The data source is read from, never
//! cached.

use std::sync::Arc;

use daymark_core::{CivilDate, DayRange, days_between};
use daymark_ports::DataSource;

use crate::definition::Definition;
use crate::error::{ExtractError, ExtractResult};
use crate::step::Step;

/// Whether the requested boundary dates of a ranged extraction are
/// themselves extracted.
///
/// Backfills over a span usually want both boundaries (`Inclusive`);
/// resuming from the last already-extracted date wants the start
/// excluded (`IncludeEnd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Both boundary dates are extracted
    #[default]
    Inclusive,
    /// Only dates strictly between the boundaries are extracted
    Exclusive,
    /// The start date is extracted, the end date is not
    IncludeStart,
    /// The end date is extracted, the start date is not
    IncludeEnd,
}

/// Drives a set of definitions over requested dates and assembles their
/// output into per-extractor steps
pub struct ExtractionManager {
    source: Arc<dyn DataSource>,
    boundary: BoundaryPolicy,
}

impl ExtractionManager {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            boundary: BoundaryPolicy::default(),
        }
    }

    /// Set the boundary policy for ranged extraction
    pub fn with_boundary_policy(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn boundary_policy(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// One lazy step per definition, in the given order, each computing
    /// the snapshot for `date`.
    ///
    /// Effective windows per strategy: `DateAggregated` aggregates
    /// everything strictly before the end of `date` (the start of the
    /// next day); `IndividualRows` enumerates `[start_of(date),
    /// end_of(date))`.
    pub fn extract_at_date<'a>(
        &'a self,
        date: CivilDate,
        definitions: &'a [Definition],
    ) -> Vec<Step<'a>> {
        self.steps(DayRange::closed(date, date), definitions)
    }

    /// One lazy step per definition across the requested date span, in
    /// ascending date order within each step. Which boundary dates are
    /// included follows the configured [`BoundaryPolicy`]. Rejects
    /// `start > end` immediately.
    pub fn extract_over_range<'a>(
        &'a self,
        start: CivilDate,
        end: CivilDate,
        definitions: &'a [Definition],
    ) -> ExtractResult<Vec<Step<'a>>> {
        if start > end {
            return Err(ExtractError::InvalidWindow { start, end });
        }

        let dates = match self.boundary {
            BoundaryPolicy::Inclusive => DayRange::closed(start, end),
            BoundaryPolicy::Exclusive => days_between(start, end)?,
            BoundaryPolicy::IncludeStart => match end.pred_opt() {
                Some(last) => DayRange::closed(start, last),
                None => DayRange::empty(),
            },
            BoundaryPolicy::IncludeEnd => match start.succ_opt() {
                Some(first) => DayRange::closed(first, end),
                None => DayRange::empty(),
            },
        };

        Ok(self.steps(dates, definitions))
    }

    fn steps<'a>(&'a self, dates: DayRange, definitions: &'a [Definition]) -> Vec<Step<'a>> {
        definitions
            .iter()
            .map(|definition| Step::new(definition, self.source.as_ref(), dates.clone()))
            .collect()
    }
}

impl std::fmt::Debug for ExtractionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionManager")
            .field("boundary", &self.boundary)
            .finish_non_exhaustive()
    }
}
