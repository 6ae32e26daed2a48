//! Metric schemas and the differentiation contract
//!
//! A schema declares, once, the ordered set of named typed fields one
//! extractor emits. Fields flagged as differentiable carry cumulative
//! totals whose consecutive daily snapshots a downstream consumer may
//! subtract; the engine itself always supplies the raw cumulative value
//! and never pre-differences.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use thiserror::Error;

/// Value type of one schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Text,
    Timestamp,
}

/// Declaration of one named, typed metric field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    kind: FieldKind,
    nullable: bool,
    differentiable: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            differentiable: false,
        }
    }

    /// Mark the field as accepting null values
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the field as a cumulative total whose consecutive snapshots
    /// support downstream delta computation
    pub const fn differentiable(mut self) -> Self {
        self.differentiable = true;
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub const fn is_differentiable(&self) -> bool {
        self.differentiable
    }
}

/// Ordered field declarations for one extractable metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSchema {
    fields: Vec<FieldDescriptor>,
}

impl MetricSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a declared field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The declared fields flagged as differentiable
    pub fn differentiable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.differentiable)
    }

    /// Check an emitted row against the declaration.
    ///
    /// Every declared field must be present with a value of the declared
    /// kind (or null, when the field is nullable), and the row must carry
    /// no undeclared fields. On success the row is returned normalized to
    /// the declared field order.
    pub fn validate(&self, row: &Row) -> Result<Row, SchemaViolation> {
        let mut normalized = Row::new();

        for field in &self.fields {
            let value = row
                .get(field.name)
                .ok_or_else(|| SchemaViolation::MissingField(field.name.to_string()))?;

            match value.kind() {
                None if !field.nullable => {
                    return Err(SchemaViolation::NullField(field.name.to_string()));
                }
                Some(kind) if kind != field.kind => {
                    return Err(SchemaViolation::TypeMismatch {
                        field: field.name.to_string(),
                        expected: field.kind,
                        got: kind,
                    });
                }
                _ => {}
            }

            normalized.set(field.name, value.clone());
        }

        for (name, _) in row.iter() {
            if self.field(name).is_none() {
                return Err(SchemaViolation::UnknownField(name.to_string()));
            }
        }

        Ok(normalized)
    }
}

/// Contract violation between an emitted row and its schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("declared field '{0}' is missing from the record")]
    MissingField(String),

    #[error("record carries undeclared field '{0}'")]
    UnknownField(String),

    #[error("field '{field}' expected {expected:?}, got {got:?}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        got: FieldKind,
    },

    #[error("field '{0}' is not nullable")]
    NullField(String),
}

/// One field value: numeric, text, timestamp, or null
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    /// Kind this value satisfies; `None` for null
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::Null => None,
            FieldValue::Int(_) => Some(FieldKind::Int),
            FieldValue::Float(_) => Some(FieldKind::Float),
            FieldValue::Text(_) => Some(FieldKind::Text),
            FieldValue::Timestamp(_) => Some(FieldKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(FieldValue::Null, FieldValue::Float)
    }
}

/// Ordered field name to value mapping, one emitted metric instance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a field, preserving first-insertion order
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funnel_schema() -> MetricSchema {
        MetricSchema::new(vec![
            FieldDescriptor::new("users", FieldKind::Int).differentiable(),
            FieldDescriptor::new("prospects", FieldKind::Int).differentiable(),
            FieldDescriptor::new("average_value", FieldKind::Float).nullable(),
        ])
    }

    #[test]
    fn test_validate_normalizes_field_order() {
        let row = Row::new()
            .with("average_value", 12.5)
            .with("users", 4i64)
            .with("prospects", 3i64);

        let normalized = funnel_schema().validate(&row).unwrap();
        let names: Vec<_> = normalized.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["users", "prospects", "average_value"]);
    }

    #[test]
    fn test_validate_rejects_missing_field() {
        let row = Row::new().with("users", 4i64).with("prospects", 3i64);
        assert_eq!(
            funnel_schema().validate(&row),
            Err(SchemaViolation::MissingField("average_value".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_unknown_field() {
        let row = Row::new()
            .with("users", 4i64)
            .with("prospects", 3i64)
            .with("average_value", 12.5)
            .with("clients", 1i64);
        assert_eq!(
            funnel_schema().validate(&row),
            Err(SchemaViolation::UnknownField("clients".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_kind_mismatch() {
        let row = Row::new()
            .with("users", "four")
            .with("prospects", 3i64)
            .with("average_value", 12.5);
        assert!(matches!(
            funnel_schema().validate(&row),
            Err(SchemaViolation::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_null_handling() {
        // Null allowed on the nullable field
        let row = Row::new()
            .with("users", 4i64)
            .with("prospects", 3i64)
            .with("average_value", FieldValue::Null);
        assert!(funnel_schema().validate(&row).is_ok());

        // Null rejected on a non-nullable field
        let row = Row::new()
            .with("users", FieldValue::Null)
            .with("prospects", 3i64)
            .with("average_value", 12.5);
        assert_eq!(
            funnel_schema().validate(&row),
            Err(SchemaViolation::NullField("users".to_string()))
        );
    }

    #[test]
    fn test_differentiable_fields() {
        let schema = funnel_schema();
        let names: Vec<_> = schema.differentiable_fields().map(|f| f.name()).collect();
        assert_eq!(names, vec!["users", "prospects"]);
    }

    #[test]
    fn test_row_serializes_in_insertion_order() {
        let row = Row::new()
            .with("users", 4i64)
            .with("average_value", FieldValue::Null);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"users":4,"average_value":null}"#);
    }

    #[test]
    fn test_row_set_replaces_in_place() {
        let mut row = Row::new().with("users", 1i64).with("prospects", 0i64);
        row.set("users", 2i64);
        assert_eq!(row.get("users"), Some(&FieldValue::Int(2)));
        assert_eq!(row.len(), 2);
    }
}
