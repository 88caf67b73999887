//! CSV statements

use super::Cell;
use crate::types::ParseError;

/// Read every record as text cells; the first record is the header.
///
/// Bytes that are not valid UTF-8 become U+FFFD rather than failing the file.
pub(crate) fn read_rows(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, ParseError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(String::from_utf8_lossy(field).into_owned())
                    }
                })
                .collect(),
        );
    }

    Ok(rows)
}
