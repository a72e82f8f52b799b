use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::IngestError;

use super::detect::{looks_like_json, looks_like_pdf, looks_like_xlsx, SourceFormat};
use super::types::{RenderedContent, SourcePayload, TabularDataset};

/// One parser plus the predicates that decide whether it claims a payload.
/// Registering a new handler with the reader is enough to add a format.
pub trait FormatHandler: Send + Sync {
    fn format(&self) -> SourceFormat;

    fn matches_suffix(&self, suffix: &str) -> bool {
        self.format().suffix() == suffix
    }

    fn sniff(&self, _bytes: &[u8]) -> bool {
        false
    }

    fn process(&self, payload: &SourcePayload) -> Result<RenderedContent, IngestError>;
}

/// Placeholder name for blank header cells.
fn header_name(index: usize, raw: &str) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {index}")
    } else {
        raw.to_string()
    }
}

pub struct CsvHandler;

impl FormatHandler for CsvHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn process(&self, payload: &SourcePayload) -> Result<RenderedContent, IngestError> {
        let decode = |err: csv::Error| IngestError::decode(SourceFormat::Csv, err);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(payload.bytes.as_slice());

        let header: Vec<String> = reader
            .headers()
            .map_err(decode)?
            .iter()
            .enumerate()
            .map(|(index, raw)| header_name(index, raw))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(decode)?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let table = TabularDataset::from_rows(header, rows)
            .map_err(|ragged| IngestError::decode(SourceFormat::Csv, ragged))?;
        Ok(RenderedContent::Table(table))
    }
}

/// Reads the first worksheet only.
pub struct XlsxHandler;

impl XlsxHandler {
    fn cell_text(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(value) => value.clone(),
            Data::DateTime(value) if !value.is_duration() => value
                .as_datetime()
                .map(Self::timestamp_text)
                .unwrap_or_else(|| cell.to_string()),
            Data::DateTimeIso(value) => Self::parse_iso(value)
                .map(Self::timestamp_text)
                .unwrap_or_else(|| value.clone()),
            other => other.to_string(),
        }
    }

    fn parse_iso(value: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .ok()
                    .map(|date| date.and_time(NaiveTime::MIN))
            })
    }

    /// `2024-01-01` for midnight, `2024-01-01 12:30:00` otherwise.
    fn timestamp_text(value: NaiveDateTime) -> String {
        if value.time() == NaiveTime::MIN {
            value.format("%Y-%m-%d").to_string()
        } else {
            value.format("%Y-%m-%d %H:%M:%S").to_string()
        }
    }
}

impl FormatHandler for XlsxHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Xlsx
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        looks_like_xlsx(bytes)
    }

    fn process(&self, payload: &SourcePayload) -> Result<RenderedContent, IngestError> {
        let decode = |err: calamine::XlsxError| IngestError::decode(SourceFormat::Xlsx, err);

        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(payload.bytes.as_slice())).map_err(decode)?;

        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(decode)?,
            None => return Ok(RenderedContent::Table(TabularDataset::default())),
        };

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(RenderedContent::Table(TabularDataset::default()));
        };

        let header: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(index, cell)| header_name(index, &Self::cell_text(cell)))
            .collect();
        let body = rows.map(|row| row.iter().map(Self::cell_text).collect::<Vec<_>>());

        let table = TabularDataset::from_rows(header, body)
            .map_err(|ragged| IngestError::decode(SourceFormat::Xlsx, ragged))?;
        Ok(RenderedContent::Table(table))
    }
}

/// Accepts an array of flat objects (records) or an object of scalar arrays
/// (columns). Nested values are rejected.
pub struct JsonHandler;

impl JsonHandler {
    fn scalar_text(column: &str, value: &Value) -> Result<String, IngestError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Bool(flag) => Ok(flag.to_string()),
            Value::Number(number) => Ok(number.to_string()),
            Value::String(text) => Ok(text.clone()),
            Value::Array(_) | Value::Object(_) => Err(IngestError::decode(
                SourceFormat::Json,
                format!("nested value in column '{column}'"),
            )),
        }
    }

    fn from_records(items: &[Value]) -> Result<TabularDataset, IngestError> {
        let mut header: Vec<String> = Vec::new();
        let mut records: Vec<&Map<String, Value>> = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let Value::Object(record) = item else {
                return Err(IngestError::decode(
                    SourceFormat::Json,
                    format!("element {index} is not an object"),
                ));
            };
            for key in record.keys() {
                if !header.iter().any(|known| known == key) {
                    header.push(key.clone());
                }
            }
            records.push(record);
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let row = header
                .iter()
                .map(|column| match record.get(column) {
                    Some(value) => Self::scalar_text(column, value),
                    None => Ok(String::new()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        TabularDataset::from_rows(header, rows)
            .map_err(|ragged| IngestError::decode(SourceFormat::Json, ragged))
    }

    /// Cells of an object-shaped column, ordered by `index` (the row labels of
    /// the first object-shaped column).
    fn aligned_cells<'v>(
        name: &str,
        indexed: &'v Map<String, Value>,
        index: &[&String],
    ) -> Result<Vec<&'v Value>, IngestError> {
        let mismatch = || {
            IngestError::decode(
                SourceFormat::Json,
                format!("column '{name}' row labels differ from the first column"),
            )
        };
        if indexed.len() != index.len() {
            return Err(mismatch());
        }
        index
            .iter()
            .map(|label| indexed.get(label.as_str()).ok_or_else(mismatch))
            .collect()
    }

    fn from_columns(columns: &Map<String, Value>) -> Result<TabularDataset, IngestError> {
        let index: Vec<&String> = columns
            .values()
            .find_map(|cells| match cells {
                Value::Object(indexed) => Some(indexed.keys().collect()),
                _ => None,
            })
            .unwrap_or_default();

        let mut values: Vec<Vec<String>> = Vec::with_capacity(columns.len());
        for (name, cells) in columns {
            let cells: Vec<&Value> = match cells {
                Value::Array(items) => items.iter().collect(),
                Value::Object(indexed) => Self::aligned_cells(name, indexed, &index)?,
                _ => {
                    return Err(IngestError::decode(
                        SourceFormat::Json,
                        format!("column '{name}' is a scalar, expected an array or object"),
                    ))
                }
            };
            values.push(
                cells
                    .into_iter()
                    .map(|cell| Self::scalar_text(name, cell))
                    .collect::<Result<_, _>>()?,
            );
        }

        let height = values.first().map_or(0, Vec::len);
        if let Some((name, _)) = columns
            .keys()
            .zip(&values)
            .find(|(_, column)| column.len() != height)
        {
            return Err(IngestError::decode(
                SourceFormat::Json,
                format!("column '{name}' length differs from the first column"),
            ));
        }

        let rows = (0..height).map(|row| {
            values
                .iter()
                .map(|column| column[row].clone())
                .collect::<Vec<_>>()
        });
        TabularDataset::from_rows(columns.keys().cloned(), rows)
            .map_err(|ragged| IngestError::decode(SourceFormat::Json, ragged))
    }
}

impl FormatHandler for JsonHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        looks_like_json(bytes)
    }

    fn process(&self, payload: &SourcePayload) -> Result<RenderedContent, IngestError> {
        let value: Value = serde_json::from_slice(&payload.bytes)
            .map_err(|err| IngestError::decode(SourceFormat::Json, err))?;

        let table = match &value {
            Value::Array(items) => Self::from_records(items)?,
            Value::Object(columns) => Self::from_columns(columns)?,
            _ => {
                return Err(IngestError::decode(
                    SourceFormat::Json,
                    "top-level value must be an array or object",
                ))
            }
        };
        Ok(RenderedContent::Table(table))
    }
}

pub struct TextHandler;

impl FormatHandler for TextHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Txt
    }

    fn process(&self, payload: &SourcePayload) -> Result<RenderedContent, IngestError> {
        let text = std::str::from_utf8(&payload.bytes)
            .map_err(|err| IngestError::decode(SourceFormat::Txt, err))?;
        Ok(RenderedContent::Text(text.to_string()))
    }
}

/// Page texts joined by `\n` in page order.
pub struct PdfHandler;

impl FormatHandler for PdfHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Pdf
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        looks_like_pdf(bytes)
    }

    fn process(&self, payload: &SourcePayload) -> Result<RenderedContent, IngestError> {
        // An empty upload has no pages.
        if payload.bytes.is_empty() {
            return Ok(RenderedContent::Text(String::new()));
        }

        let document = lopdf::Document::load_mem(&payload.bytes)
            .map_err(|err| IngestError::decode(SourceFormat::Pdf, err))?;

        let pages: Vec<String> = document
            .get_pages()
            .into_keys()
            .map(|page_number| match document.extract_text(&[page_number]) {
                Ok(text) => text
                    .trim_end_matches(|c: char| c == '\n' || c == '\r')
                    .to_string(),
                Err(err) => {
                    debug!(page_number, %err, "no extractable text on page");
                    String::new()
                }
            })
            .collect();

        Ok(RenderedContent::Text(pages.join("\n")))
    }
}

pub fn default_handlers() -> Vec<Box<dyn FormatHandler>> {
    vec![
        Box::new(CsvHandler),
        Box::new(XlsxHandler),
        Box::new(JsonHandler),
        Box::new(TextHandler),
        Box::new(PdfHandler),
    ]
}
