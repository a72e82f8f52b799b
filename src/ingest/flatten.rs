use crate::errors::IngestError;

use super::types::TabularDataset;

/// Renders a table as comma-delimited text: header first, rows in order,
/// records separated by `\n` with no trailing terminator. Fields containing a
/// comma, double quote, or line break are double-quoted with inner quotes doubled.
pub fn flatten(table: &TabularDataset) -> Result<String, IngestError> {
    if table.is_empty() {
        return Ok(String::new());
    }

    let flatten_error = |err: csv::Error| IngestError::Flatten(err.to_string());

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(flatten_error)?;
    for index in 0..table.row_count() {
        if let Some(row) = table.row(index) {
            writer.write_record(row).map_err(flatten_error)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| IngestError::Flatten(err.to_string()))?;
    let mut text =
        String::from_utf8(bytes).map_err(|err| IngestError::Flatten(err.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(header: &[&str], rows: &[&[&str]]) -> TabularDataset {
        TabularDataset::from_rows(
            header.iter().copied(),
            rows.iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect::<Vec<_>>()),
        )
        .expect("aligned rows")
    }

    #[test]
    fn header_and_rows_keep_order() {
        let text = flatten(&table(&["a", "b"], &[&["1", "2"], &["3", "4"]])).expect("flatten");
        assert_eq!(text, "a,b\n1,2\n3,4");
    }

    #[test]
    fn delimiters_quotes_and_newlines_are_quoted() {
        let text = flatten(&table(
            &["name", "note"],
            &[&["Doe, J", "said \"hi\""], &["plain", "two\nlines"]],
        ))
        .expect("flatten");
        assert_eq!(
            text,
            "name,note\n\"Doe, J\",\"said \"\"hi\"\"\"\nplain,\"two\nlines\""
        );
    }

    #[test]
    fn header_only_table_has_no_trailing_newline() {
        let text = flatten(&table(&["only"], &[])).expect("flatten");
        assert_eq!(text, "only");
    }

    #[test]
    fn empty_table_flattens_to_empty_text() {
        assert_eq!(flatten(&TabularDataset::default()).expect("flatten"), "");
    }

    #[test]
    fn quoted_output_reads_back_identically() {
        let original = table(&["k", "v"], &[&["x,y", "\"q\""], &["", "z"]]);
        let text = flatten(&original).expect("flatten");

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let header: Vec<String> = reader
            .headers()
            .expect("headers")
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|record| {
                record
                    .expect("record")
                    .iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let parsed = TabularDataset::from_rows(header, rows).expect("aligned");
        assert_eq!(parsed, original);
    }
}
