//! Typed product records and header binding
//!
//! [`RecordBuilder`] is built once from the header line and turns every
//! following line's cells into a [`ProductRecord`]: each cell is coerced,
//! then bound to the kind its column has in the field catalogue.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::coerce::{coerce, CellValue};
use super::schema::{self, FieldKind, CATEGORIES_FIELD, CATEGORIES_TAGS_FIELD, CODE_FIELD};

/// Largest integer an f64 holds exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    TextList(Vec<String>),
    Number(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::TextList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            },
            FieldValue::Number(n) => number_to_json(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            },
        }
    }
}

/// Integral values render without a fractional part (`17`, not `17.0`).
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// One product, keyed by its barcode
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    code: String,
    fields: BTreeMap<String, FieldValue>,
}

impl ProductRecord {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// A later non-null write replaces an earlier one; a null never
    /// overwrites a value already bound.
    fn bind(&mut self, name: &str, value: FieldValue) {
        if value.is_null() && self.fields.get(name).is_some_and(|v| !v.is_null()) {
            return;
        }
        self.fields.insert(name.to_string(), value);
    }

    /// The stored JSON document.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for (name, value) in &self.fields {
            doc.insert(name.clone(), value.to_json());
        }
        doc.insert(CODE_FIELD.to_string(), Value::String(self.code.clone()));
        Value::Object(doc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("header has no `code` column")]
    MissingCodeColumn,

    #[error("line has an empty product code")]
    MissingCode,
}

/// A record plus how many of its cells did not fit their field kind
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRecord {
    pub record: ProductRecord,
    pub rejected_cells: usize,
}

/// Binds positional cells to catalogue fields
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    columns: Vec<Option<(&'static str, FieldKind)>>,
    code_index: usize,
}

impl RecordBuilder {
    pub fn from_header(header: &str) -> Result<Self, RecordError> {
        let header = header.strip_prefix('\u{feff}').unwrap_or(header);
        let columns: Vec<_> = header.split('\t').map(schema::lookup).collect();
        let code_index = columns
            .iter()
            .position(|column| matches!(column, Some((CODE_FIELD, _))))
            .ok_or(RecordError::MissingCodeColumn)?;

        Ok(Self {
            columns,
            code_index,
        })
    }

    /// Number of header columns that map to catalogue fields
    pub fn known_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }

    /// Bind the cells of one line. Missing trailing cells are empty; extra
    /// cells are ignored.
    pub fn build(&self, cells: &[&str]) -> Result<BoundRecord, RecordError> {
        let code = cells
            .get(self.code_index)
            .map_or(Cow::Borrowed(""), |c| strip_nul(c));
        let code = code.trim();
        if code.is_empty() {
            return Err(RecordError::MissingCode);
        }

        let mut record = ProductRecord::new(code);
        let mut rejected_cells = 0;

        for (index, column) in self.columns.iter().enumerate() {
            let Some((name, kind)) = *column else {
                continue;
            };
            if index == self.code_index {
                continue;
            }

            let raw = strip_nul(cells.get(index).copied().unwrap_or(""));
            let mut had_nul = matches!(raw, Cow::Owned(_));
            let mut value = coerce(&raw);

            // JSON lists may carry `\u0000` escapes
            let keeps_list = kind == FieldKind::TextList || name == CATEGORIES_FIELD;
            if let (true, CellValue::List(items)) = (keeps_list, &mut value) {
                for item in items.iter_mut().filter(|item| item.contains('\0')) {
                    *item = item.replace('\0', "");
                    had_nul = true;
                }
            }

            if name == CATEGORIES_FIELD {
                if let CellValue::List(items) = value {
                    if had_nul {
                        rejected_cells += 1;
                    }
                    record.bind(CATEGORIES_FIELD, FieldValue::Text(items.join(", ")));
                    record.bind(CATEGORIES_TAGS_FIELD, FieldValue::TextList(items));
                    continue;
                }
            }

            let (bound, rejected) = bind_value(kind, &raw, value);
            if rejected || had_nul {
                rejected_cells += 1;
            }
            record.bind(name, bound);
        }

        Ok(BoundRecord {
            record,
            rejected_cells,
        })
    }
}

/// Returns the bound value and whether the cell was rejected.
fn bind_value(kind: FieldKind, raw: &str, value: CellValue) -> (FieldValue, bool) {
    if value.is_null() {
        return (FieldValue::Null, false);
    }

    match (kind, value) {
        (FieldKind::Text, _) => (FieldValue::Text(raw.to_string()), false),

        (FieldKind::TextList, CellValue::List(items)) => (FieldValue::TextList(items), false),
        (FieldKind::TextList, _) => (FieldValue::TextList(split_list(raw)), false),

        (FieldKind::Number, CellValue::Number(n)) => (FieldValue::Number(n), false),
        (FieldKind::Bool, CellValue::Bool(b)) => (FieldValue::Bool(b), false),

        (FieldKind::Timestamp, CellValue::Number(secs)) => match unix_seconds(secs) {
            Some(ts) => (FieldValue::Timestamp(ts), false),
            None => (FieldValue::Null, true),
        },
        (FieldKind::Timestamp, CellValue::Text(text)) => {
            match DateTime::parse_from_rfc3339(text.trim()) {
                Ok(ts) => (FieldValue::Timestamp(ts.with_timezone(&Utc)), false),
                Err(_) => (FieldValue::Null, true),
            }
        },

        (FieldKind::Number | FieldKind::Bool | FieldKind::Timestamp, _) => {
            (FieldValue::Null, true)
        },
    }
}

/// PostgreSQL text and JSONB cannot hold U+0000.
fn strip_nul(raw: &str) -> Cow<'_, str> {
    if raw.contains('\0') {
        Cow::Owned(raw.replace('\0', ""))
    } else {
        Cow::Borrowed(raw)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if secs.fract() != 0.0 || secs.abs() >= MAX_EXACT_INTEGER {
        return None;
    }
    DateTime::from_timestamp(secs as i64, 0)
}
