//! Bank statement parsing
//!
//! Uploaded statements arrive as CSV text or as a spreadsheet workbook. Both
//! are reduced to rows of [`Cell`]s, then the header row is used to locate the
//! date, description and amount columns.

pub mod csv;
pub mod workbook;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::config::StatementConfig;
use crate::types::{BankTransaction, ParseError};

const DATE_HEADERS: &[&str] = &[
    "date",
    "transaction date",
    "trans date",
    "txn date",
    "posting date",
    "posted date",
    "booking date",
    "value date",
];
const DESCRIPTION_HEADERS: &[&str] = &[
    "description",
    "narration",
    "details",
    "particulars",
    "remarks",
    "memo",
];
const AMOUNT_HEADERS: &[&str] = &["amount", "transaction amount", "amt"];

/// Container format of an uploaded statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Csv,
    /// XLSX, XLSM, XLSB, XLS or ODS
    Workbook,
}

impl StatementFormat {
    /// Pick the format from the file name, or from the leading bytes when the
    /// name is missing or has no extension
    pub fn detect(file_name: Option<&str>, bytes: &[u8]) -> Result<Self, ParseError> {
        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") | Some("txt") => Ok(StatementFormat::Csv),
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
                Ok(StatementFormat::Workbook)
            }
            None => Ok(Self::sniff(bytes).unwrap_or(StatementFormat::Csv)),
            // Dotted names like `jan.statement.v2` carry no real extension
            Some(other) => {
                Self::sniff(bytes).ok_or_else(|| ParseError::UnsupportedFormat(other.to_string()))
            }
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        // ZIP container (xlsx, ods) or OLE compound file (xls)
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"\xD0\xCF\x11\xE0") {
            return Some(StatementFormat::Workbook);
        }
        let head = &bytes[..bytes.len().min(512)];
        if head.is_empty() || head.starts_with(b"%PDF") || head.contains(&0) {
            return None;
        }
        Some(StatementFormat::Csv)
    }
}

/// A raw cell before interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::DateTime(dt) => dt.to_string(),
        }
    }
}

/// Positions of the columns the matcher needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    date: usize,
    description: Option<usize>,
    amount: usize,
}

impl ColumnMap {
    fn from_header(header: &[Cell]) -> Result<Self, ParseError> {
        let names: Vec<String> = header.iter().map(|c| normalize_header(&c.display())).collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| names.iter().position(|name| name == alias))
        };

        let date = find(DATE_HEADERS).ok_or_else(|| ParseError::MissingColumn("Date".to_string()))?;
        let amount =
            find(AMOUNT_HEADERS).ok_or_else(|| ParseError::MissingColumn("Amount".to_string()))?;

        Ok(Self {
            date,
            description: find(DESCRIPTION_HEADERS),
            amount,
        })
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Reads uploaded statements into bank transactions
#[derive(Debug, Clone, Default)]
pub struct StatementParser {
    config: StatementConfig,
}

impl StatementParser {
    /// Create a parser with custom date layouts
    pub fn new(config: StatementConfig) -> Self {
        Self { config }
    }

    /// Parse a statement, detecting its format from the file name or content
    pub fn parse(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<Vec<BankTransaction>, ParseError> {
        let format = StatementFormat::detect(file_name, bytes)?;
        self.parse_with_format(bytes, format)
    }

    /// Parse a statement of a known format
    #[instrument(name = "parse_statement", skip(self, bytes), fields(len = bytes.len()))]
    pub fn parse_with_format(
        &self,
        bytes: &[u8],
        format: StatementFormat,
    ) -> Result<Vec<BankTransaction>, ParseError> {
        let rows = match format {
            StatementFormat::Csv => csv::read_rows(bytes)?,
            StatementFormat::Workbook => workbook::read_rows(bytes)?,
        };
        let transactions = self.rows_to_transactions(rows)?;
        debug!(count = transactions.len(), "Parsed statement");
        Ok(transactions)
    }

    fn rows_to_transactions(&self, rows: Vec<Vec<Cell>>) -> Result<Vec<BankTransaction>, ParseError> {
        let mut rows = rows.into_iter();
        let header = rows.next().ok_or(ParseError::EmptyStatement)?;
        let columns = ColumnMap::from_header(&header)?;

        let mut transactions = Vec::new();
        for (index, row) in rows.enumerate() {
            // Header is sheet row 1
            let source_row = index + 2;
            if row.iter().all(Cell::is_blank) {
                continue;
            }

            let cell = |i: usize| row.get(i).unwrap_or(&Cell::Empty);
            let (date, time) = self.parse_date_cell(cell(columns.date), source_row)?;
            let amount = parse_amount_cell(cell(columns.amount), source_row)?;
            let description = columns
                .description
                .map(|i| cell(i).display())
                .unwrap_or_default();

            transactions.push(BankTransaction {
                date,
                time,
                description,
                amount,
                source_row,
            });
        }

        if transactions.is_empty() {
            return Err(ParseError::EmptyStatement);
        }

        Ok(transactions)
    }

    fn parse_date_cell(
        &self,
        cell: &Cell,
        row: usize,
    ) -> Result<(NaiveDate, Option<NaiveTime>), ParseError> {
        let datetime = match cell {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Float(serial) => excel_serial_to_datetime(*serial),
            Cell::Int(serial) => excel_serial_to_datetime(*serial as f64),
            Cell::Text(text) => return self.parse_date_text(text, row),
            Cell::Empty => None,
        };

        datetime.map(split_datetime).ok_or_else(|| ParseError::InvalidDate {
            row,
            value: cell.display(),
        })
    }

    fn parse_date_text(
        &self,
        text: &str,
        row: usize,
    ) -> Result<(NaiveDate, Option<NaiveTime>), ParseError> {
        let text = text.trim();

        for format in &self.config.datetime_formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(split_datetime(dt));
            }
        }
        for format in &self.config.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Ok((date, None));
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(split_datetime(dt.naive_local()));
        }

        Err(ParseError::InvalidDate {
            row,
            value: text.to_string(),
        })
    }
}

fn split_datetime(dt: NaiveDateTime) -> (NaiveDate, Option<NaiveTime>) {
    let time = dt.time();
    (dt.date(), (time != NaiveTime::MIN).then_some(time))
}

/// Convert an Excel serial day number (1899-12-30 epoch) to a timestamp
pub(crate) fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(chrono::Duration::milliseconds(millis))
}

fn parse_amount_cell(cell: &Cell, row: usize) -> Result<BigDecimal, ParseError> {
    let invalid = || ParseError::InvalidAmount {
        row,
        value: cell.display(),
    };

    match cell {
        Cell::Int(i) => Ok(BigDecimal::from(*i)),
        Cell::Float(f) => amount_from_f64(*f).ok_or_else(invalid),
        Cell::Text(text) => parse_amount_text(text).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Largest magnitude accepted from a floating point cell
const MAX_FLOAT_AMOUNT: f64 = 1e15;

/// Convert a spreadsheet number to a decimal amount, rounded to 4 places.
///
/// Non-finite values and magnitudes from `1e15` up are rejected.
pub(crate) fn amount_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() || value.abs() >= MAX_FLOAT_AMOUNT {
        return None;
    }
    // Always has a '.', so trimming zeros stops there
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    parse_amount_text(text)
}

/// Parse statement amount text such as `₦1,250.00`, `-300` or `(45.10)`.
///
/// Only plain decimal notation is accepted; exponents are rejected.
pub fn parse_amount_text(raw: &str) -> Option<BigDecimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '₦' | '$' | '£' | '€'))
        .collect();

    let (negative, digits) = match cleaned
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    let (negative, digits) = match digits.strip_prefix('-') {
        Some(rest) if !negative => (true, rest),
        Some(_) => return None,
        None => (negative, digits.strip_prefix('+').unwrap_or(digits)),
    };
    if !is_plain_decimal(digits) {
        return None;
    }

    let value = BigDecimal::from_str(digits).ok()?;
    Some(if negative { -value } else { value })
}

/// `digits[.digits]`
fn is_plain_decimal(text: &str) -> bool {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.map_or(true, all_digits)
}
