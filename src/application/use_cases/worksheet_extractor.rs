// ============================================================
// WORKSHEET EXTRACTOR
// ============================================================
// Pull header-keyed records out of a SpreadsheetML-style XML
// document (Workbook > Worksheet > Table > Row > Cell > Data).
// Parsing is lenient: a document too malformed to read, or one
// without the requested worksheet, is a normal NotFound outcome.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::domain::record::{Extraction, Record, RecordSet};

type XmlResult<T> = std::result::Result<T, quick_xml::Error>;

pub struct WorksheetExtractor {
    worksheet_name: String,
}

impl WorksheetExtractor {
    pub fn new(worksheet_name: impl Into<String>) -> Self {
        Self {
            worksheet_name: worksheet_name.into(),
        }
    }

    /// Extract records from the named worksheet.
    ///
    /// The first `Worksheet` element whose `ss:Name` matches exactly is
    /// used; within it, the first `Table`. The table's first row supplies
    /// one header label per cell position; every later row becomes a
    /// record. Cells without a `Data` child contribute nothing (sparse
    /// rows simply omit that key), and alignment is positional: a value
    /// lands under whatever label holds the same cell index.
    pub fn extract(&self, bytes: &[u8]) -> Extraction {
        match self.scan(bytes) {
            Ok(Some(set)) => Extraction::Found(set),
            Ok(None) => Extraction::NotFound,
            Err(err) => {
                debug!(error = %err, "worksheet document unparsable, treating as not found");
                Extraction::NotFound
            }
        }
    }

    fn scan(&self, bytes: &[u8]) -> XmlResult<Option<RecordSet>> {
        let mut reader = Reader::from_reader(bytes);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if local_name(e.name().as_ref()) == b"Worksheet" => {
                    if worksheet_name(&e).as_deref() == Some(self.worksheet_name.as_str()) {
                        return parse_worksheet(&mut reader);
                    }
                    // Skip the whole subtree of a non-matching worksheet.
                    let end = e.to_end().into_owned();
                    reader.read_to_end_into(end.name(), &mut Vec::new())?;
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
            buf.clear();
        }
    }
}

/// Read the `ss:Name` attribute (any prefix) of a worksheet element.
fn worksheet_name(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"Name" {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Within a matched worksheet, find the first table and extract it.
/// A worksheet without a table yields `None`.
fn parse_worksheet(reader: &mut Reader<&[u8]>) -> XmlResult<Option<RecordSet>> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"Table" => {
                return parse_table(reader);
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"Worksheet" => return Ok(None),
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_table(reader: &mut Reader<&[u8]>) -> XmlResult<Option<RecordSet>> {
    let mut headers: Option<Vec<String>> = None;
    let mut set: Option<RecordSet> = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"Row" => {
                match &headers {
                    None => {
                        let labels = parse_header_row(reader)?;
                        set = Some(RecordSet::new(labels.clone()));
                        headers = Some(labels);
                    }
                    Some(labels) => {
                        let record = parse_data_row(reader, labels)?;
                        // Rows where no cell carried data produce no record.
                        if !record.is_empty() {
                            if let Some(s) = set.as_mut() {
                                s.push(record);
                            }
                        }
                    }
                }
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"Table" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    // A table without any rows has no schema to extract.
    Ok(set)
}

/// First row of the table: one label per cell position, from the
/// cell's text content.
fn parse_header_row(reader: &mut Reader<&[u8]>) -> XmlResult<Vec<String>> {
    let mut labels = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"Cell" => {
                // Header labels are plain text, whatever the cell type.
                let value = parse_cell(reader, false)?;
                labels.push(value.unwrap_or_default());
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"Cell" => {
                labels.push(String::new());
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"Row" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(labels)
}

fn parse_data_row(reader: &mut Reader<&[u8]>, headers: &[String]) -> XmlResult<Record> {
    let mut record = Record::new();
    let mut cell_index = 0usize;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"Cell" => {
                if let Some(value) = parse_cell(reader, true)? {
                    // Position drives alignment; cells beyond the header
                    // row's width have no label and are dropped.
                    if let Some(header) = headers.get(cell_index) {
                        record.insert(header.clone(), value);
                    }
                }
                cell_index += 1;
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"Cell" => {
                cell_index += 1;
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"Row" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(record)
}

/// Consume a cell subtree and return its value, `None` when the cell
/// carried no Data child. Only the first Data child counts: with
/// `keep_markup`, a string-typed one keeps its inline markup (minus
/// Font tags); everything else contributes its plain text. Text
/// outside Data elements is layout whitespace and is ignored, as are
/// further Data children.
fn parse_cell(reader: &mut Reader<&[u8]>, keep_markup: bool) -> XmlResult<Option<String>> {
    let mut value: Option<String> = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"Data" => {
                let is_string = keep_markup && data_type(&e).as_deref() == Some("String");
                let content = if is_string {
                    capture_inline_markup(reader)?
                } else {
                    collect_text(reader, b"Data")?
                };
                if value.is_none() {
                    value = Some(content);
                }
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"Data" => {
                if value.is_none() {
                    value = Some(String::new());
                }
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"Cell" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(value)
}

/// Read the `ss:Type` attribute (any prefix) of a Data element.
fn data_type(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"Type" {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Concatenate all text inside an element subtree, dropping tags.
fn collect_text(reader: &mut Reader<&[u8]>, until: &[u8]) -> XmlResult<String> {
    let mut text = String::new();
    let mut depth = 0usize;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == until => depth += 1,
            Event::End(e) if local_name(e.name().as_ref()) == until => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Text(t) => text.push_str(&t.unescape().unwrap_or_default()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Reconstruct the inner markup of a string-typed Data element.
///
/// Data wrapper tags (including nested ones) and Font styling tags are
/// stripped; any other inline formatting tag is passed through as
/// literal text, uninterpreted. This is a raw-text policy, not an HTML
/// sanitizer.
fn capture_inline_markup(reader: &mut Reader<&[u8]>) -> XmlResult<String> {
    let mut out = String::new();
    let mut data_depth = 0usize;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if name == b"Data" {
                    data_depth += 1;
                } else if !name.eq_ignore_ascii_case(b"Font") {
                    out.push_str(&render_start_tag(&e));
                }
            }
            Event::Empty(e) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if name != b"Data" && !name.eq_ignore_ascii_case(b"Font") {
                    out.push_str(&render_empty_tag(&e));
                }
            }
            Event::End(e) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if name == b"Data" {
                    if data_depth == 0 {
                        break;
                    }
                    data_depth -= 1;
                } else if !name.eq_ignore_ascii_case(b"Font") {
                    out.push_str(&format!("</{}>", String::from_utf8_lossy(qname.as_ref())));
                }
            }
            Event::Text(t) => out.push_str(&t.unescape().unwrap_or_default()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn render_start_tag(e: &BytesStart<'_>) -> String {
    let mut tag = format!("<{}", String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes().flatten() {
        tag.push(' ');
        tag.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        tag.push_str("=\"");
        tag.push_str(&String::from_utf8_lossy(&attr.value));
        tag.push('"');
    }
    tag.push('>');
    tag
}

fn render_empty_tag(e: &BytesStart<'_>) -> String {
    let mut tag = render_start_tag(e);
    tag.truncate(tag.len() - 1);
    tag.push_str("/>");
    tag
}

fn local_name(raw: &[u8]) -> &[u8] {
    match raw.iter().rposition(|&b| b == b':') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    }
}
