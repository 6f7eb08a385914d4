// ============================================================
// UPLOAD PIPELINE
// ============================================================
// One ingest run: persist the raw upload, extract records per
// file type, normalize, and publish the JSON cache on success.

use std::sync::Arc;

use tracing::info;

use crate::application::use_cases::csv_extractor::CsvExtractor;
use crate::application::use_cases::normalizer::{normalize, Normalized};
use crate::application::use_cases::worksheet_extractor::WorksheetExtractor;
use crate::domain::error::Result;
use crate::infrastructure::storage::EventStorage;

/// Worksheet holding the event table in spreadsheet uploads.
const EVENTS_WORKSHEET: &str = "events";

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Xml,
    Csv,
}

impl FileType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "xml" => Some(Self::Xml),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Ingest outcome, mapped to a response token at the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    NoEvents,
    NotEnoughEvents,
    Uploaded { events: usize },
}

pub struct UploadPipeline {
    storage: Arc<EventStorage>,
}

impl UploadPipeline {
    pub fn new(storage: Arc<EventStorage>) -> Self {
        Self { storage }
    }

    /// Run the full ingest. The raw payload is stored first so a failed
    /// extraction can still be inspected on disk; the cache is only
    /// replaced when normalization yields a publishable list.
    pub fn ingest(&self, file_type: FileType, payload: &[u8]) -> Result<UploadStatus> {
        self.storage.store_upload(file_type, payload)?;

        let extraction = match file_type {
            FileType::Xml => WorksheetExtractor::new(EVENTS_WORKSHEET).extract(payload),
            FileType::Csv => CsvExtractor::new().extract(&String::from_utf8_lossy(payload)),
        };

        // Spreadsheet uploads carry a column-description row under the
        // header that is not an event.
        let drop_description_row = file_type == FileType::Xml;

        match normalize(extraction, drop_description_row) {
            Normalized::NoEvents => Ok(UploadStatus::NoEvents),
            Normalized::NotEnoughEvents => Ok(UploadStatus::NotEnoughEvents),
            Normalized::Events(set) => {
                let json = serde_json::to_vec(&set)?;
                self.storage.replace_cache(&json)?;
                info!(events = set.len(), "event cache replaced");
                Ok(UploadStatus::Uploaded { events: set.len() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pipeline(dir: &std::path::Path) -> (UploadPipeline, Arc<EventStorage>) {
        let storage = Arc::new(EventStorage::new(dir));
        (UploadPipeline::new(Arc::clone(&storage)), storage)
    }

    fn csv_payload(rows: usize) -> String {
        let mut out = String::from("Titel,Datum\n");
        for i in 0..rows {
            out.push_str(&format!("Event {i},2024-0{}-01\n", (i % 9) + 1));
        }
        out
    }

    fn xml_payload(data_rows: usize) -> String {
        let mut rows = String::from(
            r#"<Row><Cell><Data ss:Type="String">Titel</Data></Cell></Row>
               <Row><Cell><Data ss:Type="String">Beschreibung der Spalte</Data></Cell></Row>"#,
        );
        for i in 0..data_rows {
            rows.push_str(&format!(
                r#"<Row><Cell><Data ss:Type="String">Event {i}</Data></Cell></Row>"#
            ));
        }
        format!(
            r#"<?xml version="1.0"?>
<Workbook xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">
<Worksheet ss:Name="events"><Table>{rows}</Table></Worksheet>
</Workbook>"#
        )
    }

    #[test]
    fn csv_upload_publishes_cache() {
        let dir = tempdir().unwrap();
        let (pipeline, storage) = pipeline(dir.path());

        let status = pipeline
            .ingest(FileType::Csv, csv_payload(4).as_bytes())
            .unwrap();
        assert_eq!(status, UploadStatus::Uploaded { events: 4 });

        let cache = storage.read_cache().unwrap().expect("cache written");
        let parsed: serde_json::Value = serde_json::from_slice(&cache).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 4);
        assert_eq!(parsed[0]["Titel"], "Event 0");
    }

    #[test]
    fn xml_upload_drops_description_row() {
        let dir = tempdir().unwrap();
        let (pipeline, storage) = pipeline(dir.path());

        let status = pipeline
            .ingest(FileType::Xml, xml_payload(4).as_bytes())
            .unwrap();
        assert_eq!(status, UploadStatus::Uploaded { events: 4 });

        let cache = storage.read_cache().unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&cache).unwrap();
        assert_eq!(parsed[0]["Titel"], "Event 0");
    }

    #[test]
    fn too_few_events_leave_cache_untouched() {
        let dir = tempdir().unwrap();
        let (pipeline, storage) = pipeline(dir.path());

        storage.replace_cache(b"[\"old\"]").unwrap();
        let status = pipeline
            .ingest(FileType::Csv, csv_payload(3).as_bytes())
            .unwrap();
        assert_eq!(status, UploadStatus::NotEnoughEvents);
        assert_eq!(storage.read_cache().unwrap(), Some(b"[\"old\"]".to_vec()));
    }

    #[test]
    fn unparsable_xml_reports_no_events() {
        let dir = tempdir().unwrap();
        let (pipeline, _) = pipeline(dir.path());

        let status = pipeline.ingest(FileType::Xml, b"definitely not xml").unwrap();
        assert_eq!(status, UploadStatus::NoEvents);
    }

    #[test]
    fn raw_upload_is_persisted_even_when_rejected() {
        let dir = tempdir().unwrap();
        let (pipeline, _) = pipeline(dir.path());

        pipeline.ingest(FileType::Csv, b"Titel\nnur-einer").unwrap();
        let stored = std::fs::read(dir.path().join("calendar.csv")).unwrap();
        assert_eq!(stored, b"Titel\nnur-einer");
    }

    #[test]
    fn file_type_parse_accepts_known_tokens_only() {
        assert_eq!(FileType::parse("xml"), Some(FileType::Xml));
        assert_eq!(FileType::parse("csv"), Some(FileType::Csv));
        assert_eq!(FileType::parse("XML"), None);
        assert_eq!(FileType::parse("json"), None);
    }
}
