// ============================================================
// RECORD TYPES
// ============================================================
// Data structures for extracted spreadsheet rows. The header
// schema is discovered at parse time and shared by every record
// in a set; a missing key on an individual record is a normal,
// observable state (sparse worksheet rows).

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::HashMap;

/// One extracted row, keyed by header label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered collection of records sharing one header schema.
///
/// Serializes as a JSON array of flat objects. Keys appear in
/// header order; keys absent from a record are simply omitted
/// from its object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove and return the leading record, shifting the rest up.
    pub fn remove_first(&mut self) -> Option<Record> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.remove(0))
        }
    }
}

impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&OrderedRow {
                headers: &self.headers,
                row,
            })?;
        }
        seq.end()
    }
}

struct OrderedRow<'a> {
    headers: &'a [String],
    row: &'a Record,
}

impl Serialize for OrderedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.row.len()))?;
        for header in self.headers {
            if let Some(value) = self.row.get(header) {
                map.serialize_entry(header, value)?;
            }
        }
        map.end()
    }
}

/// Extractor outcome. Absence of the requested worksheet (or a
/// document too malformed to parse) is a normal result, distinct
/// from a worksheet that was found but holds no data rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    NotFound,
    Found(RecordSet),
}
