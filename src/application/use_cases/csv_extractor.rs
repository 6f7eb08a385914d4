// ============================================================
// CSV EXTRACTOR
// ============================================================
// Turn delimited text into header-keyed records, dropping rows
// flagged as private via a fixed truthy-token set.

use csv::ReaderBuilder;

use crate::application::use_cases::sanitizer::sanitize_label;
use crate::domain::record::{Extraction, Record, RecordSet};

/// Header whose value decides whether a row is excluded.
const PRIVATE_COLUMN: &str = "Privat";

/// Values marking a row as private: "yes/on/true" in German and English.
const PRIVATE_TOKENS: [&str; 6] = ["ein", "on", "true", "wahr", "an", "ja"];

pub struct CsvExtractor {
    delimiter: u8,
}

impl Default for CsvExtractor {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract records from CSV text.
    ///
    /// The first line is the header; its labels pass through the
    /// sanitizer before use as keys. Data lines are zipped positionally
    /// against the header: missing trailing fields become empty strings,
    /// extra fields are dropped. Rows whose `Privat` value matches a
    /// truthy token are excluded entirely. Text with no header line at
    /// all yields `NotFound`.
    pub fn extract(&self, content: &str) -> Extraction {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = match reader.headers() {
            Ok(record) => record.iter().map(sanitize_label).collect(),
            Err(_) => return Extraction::NotFound,
        };
        if headers.is_empty() {
            return Extraction::NotFound;
        }

        let private_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(PRIVATE_COLUMN));

        let mut set = RecordSet::new(headers.clone());
        for result in reader.records() {
            // Unreadable lines are skipped, not fatal.
            let row = match result {
                Ok(row) => row,
                Err(_) => continue,
            };

            if let Some(idx) = private_idx {
                let flag = row.get(idx).unwrap_or("").to_lowercase();
                if PRIVATE_TOKENS.contains(&flag.as_str()) {
                    continue;
                }
            }

            let mut record = Record::new();
            for (idx, header) in headers.iter().enumerate() {
                record.insert(header.clone(), row.get(idx).unwrap_or(""));
            }
            set.push(record);
        }

        Extraction::Found(set)
    }
}
