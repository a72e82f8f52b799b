use std::fmt;

use serde::{Deserialize, Serialize};

/// Formats the reader knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Json,
    Txt,
    Pdf,
}

impl SourceFormat {
    /// Compared case-sensitively: `report.CSV` is not a csv file.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Json => "json",
            Self::Txt => "txt",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Which signal picked the handler for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Suffix,
    Magic,
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Suffix => "suffix",
            Self::Magic => "magic",
        };
        f.write_str(label)
    }
}

/// Text after the last dot of a file name, if any.
pub fn file_suffix(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, suffix)| suffix)
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const XLSX_WORKBOOK_PART: &[u8] = b"xl/workbook.xml";

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// A zip container holding a spreadsheet workbook part. Entry names are
/// stored uncompressed in the local headers, so a byte scan finds them.
pub fn looks_like_xlsx(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
        && bytes
            .windows(XLSX_WORKBOOK_PART.len())
            .any(|window| window == XLSX_WORKBOOK_PART)
}

pub fn looks_like_json(bytes: &[u8]) -> bool {
    matches!(
        bytes.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'[' | b'{')
    )
}
