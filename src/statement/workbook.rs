//! Spreadsheet workbook statements (XLSX, XLS, ODS)

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::{excel_serial_to_datetime, Cell};
use crate::types::ParseError;

/// Read the first worksheet; the first row is the header
pub(crate) fn read_rows(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::EmptyStatement)?
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(to_cell).collect())
        .collect())
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Cell::DateTime)
            .unwrap_or(Cell::Empty),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_conversion() {
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(7)), Cell::Int(7));
        assert_eq!(
            to_cell(&Data::String("Fees".to_string())),
            Cell::Text("Fees".to_string())
        );
        assert_eq!(
            to_cell(&Data::DateTimeIso("2024-01-10T08:00:00".to_string())),
            Cell::Text("2024-01-10T08:00:00".to_string())
        );
    }

    #[test]
    fn test_garbage_is_a_workbook_error() {
        let result = read_rows(b"PK\x03\x04 not really a zip");
        assert!(matches!(result, Err(ParseError::Workbook(_))));
    }
}
