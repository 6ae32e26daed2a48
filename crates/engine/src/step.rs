//! Lazy per-extractor record streams
//!
//! A step is the ordered output of one definition across the requested
//! dates. It is pull-based: each `next()` advances at most one calendar
//! date, so ceasing consumption is cancellation. Each per-date extraction
//! is atomic: it either fully yields its validated record(s) or yields
//! the error, and a failed step yields nothing further. Records already
//! consumed are never disturbed by a later failure.

use std::collections::VecDeque;

use daymark_core::{CivilDate, DayRange, MetricSchema};
use daymark_ports::DataSource;

use crate::definition::Definition;
use crate::error::{ExtractError, ExtractResult};
use crate::record::ExtractionRecord;

pub struct Step<'a> {
    definition: &'a Definition,
    source: &'a dyn DataSource,
    dates: DayRange,
    pending: VecDeque<ExtractionRecord>,
    failed: bool,
}

impl<'a> Step<'a> {
    pub(crate) fn new(definition: &'a Definition, source: &'a dyn DataSource, dates: DayRange) -> Self {
        Self {
            definition,
            source,
            dates,
            pending: VecDeque::new(),
            failed: false,
        }
    }

    /// Name of the definition driving this step
    pub fn extractor(&self) -> &str {
        self.definition.name()
    }

    /// Schema of the records this step yields
    pub fn schema(&self) -> &MetricSchema {
        self.definition.schema()
    }

    /// Extract, validate, and tag all records for one date
    fn run_date(&self, date: CivilDate) -> ExtractResult<Vec<ExtractionRecord>> {
        log::debug!(
            "extracting '{}' for {date}",
            self.definition.name()
        );

        let rows = self.definition.extract(self.source, date)?;
        rows.into_iter()
            .map(|row| {
                self.definition
                    .schema()
                    .validate(&row)
                    .map(|normalized| ExtractionRecord::new(date, normalized))
                    .map_err(|violation| ExtractError::Schema {
                        extractor: self.definition.name().to_string(),
                        date,
                        violation,
                    })
            })
            .collect()
    }
}

impl Iterator for Step<'_> {
    type Item = ExtractResult<ExtractionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }

            // Row-enumeration dates may legitimately yield no records;
            // keep advancing until something is produced or dates run out.
            let date = self.dates.next()?;
            match self.run_date(date) {
                Ok(records) => self.pending.extend(records),
                Err(e) => {
                    self.failed = true;
                    log::warn!("step '{}' aborted: {e}", self.definition.name());
                    return Some(Err(e));
                }
            }
        }
    }
}

impl std::fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("extractor", &self.definition.name())
            .field("dates", &self.dates)
            .field("pending", &self.pending.len())
            .field("failed", &self.failed)
            .finish()
    }
}
