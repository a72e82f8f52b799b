use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw upload or fetch result awaiting rendering. Lives for a single request.
#[derive(Debug, Clone)]
pub struct SourcePayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourcePayload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn digest(&self) -> String {
        blake3::hash(&self.bytes).to_hex().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

/// Column-major table; every column holds the same number of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularDataset {
    columns: Vec<Column>,
}

impl TabularDataset {
    /// Builds a dataset from a header and row-major records. Returns the offending
    /// row index when a record's width differs from the header.
    pub fn from_rows<H, R>(header: H, rows: R) -> Result<Self, RaggedRow>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<String>>,
    {
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column {
                name: name.into(),
                values: Vec::new(),
            })
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(RaggedRow {
                    row: index,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Ok(Self { columns })
    }

    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |column| column.values.len())
    }

    pub fn row(&self, index: usize) -> Option<Vec<&str>> {
        (index < self.row_count()).then(|| {
            self.columns
                .iter()
                .map(|column| column.values[index].as_str())
                .collect()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaggedRow {
    pub row: usize,
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for RaggedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} has {} fields, header has {}",
            self.row + 1,
            self.actual,
            self.expected
        )
    }
}

/// Marker returned when no handler claims a payload. Displays as the message
/// callers have always shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFormat {
    pub name: String,
}

impl UnsupportedFormat {
    pub const MESSAGE: &'static str = "Unsupported file format";
}

impl fmt::Display for UnsupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedContent {
    Table(TabularDataset),
    Text(String),
    Unsupported(UnsupportedFormat),
}

#[cfg(test)]
impl RenderedContent {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    pub fn as_table(&self) -> Option<&TabularDataset> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}
