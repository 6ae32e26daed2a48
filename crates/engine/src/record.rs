use serde::ser::{Serialize, SerializeMap, Serializer};

use daymark_core::{CivilDate, FieldValue, Row};

/// One metric instance tagged with the calendar date it was computed for.
///
/// Serializes as the declared fields in schema order followed by a
/// `"date"` field, always present and always last, as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRecord {
    date: CivilDate,
    row: Row,
}

impl ExtractionRecord {
    pub(crate) fn new(date: CivilDate, row: Row) -> Self {
        Self { date, row }
    }

    /// The requested date this snapshot was computed for
    pub fn date(&self) -> CivilDate {
        self.date
    }

    /// The emitted fields, normalized to schema order
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Value of one declared field
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.row.get(name)
    }
}

impl Serialize for ExtractionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.row.len() + 1))?;
        for (name, value) in self.row.iter() {
            map.serialize_entry(name, value)?;
        }
        // NaiveDate displays as ISO 8601 (YYYY-MM-DD)
        map.serialize_entry("date", &self.date.to_string())?;
        map.end()
    }
}
