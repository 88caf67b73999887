//! Core types and data structures for statement reconciliation

use bigdecimal::BigDecimal;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::statement::{amount_from_f64, parse_amount_text};
use crate::utils::validation::{validate_identifier, validate_positive_amount};

/// A single line read from an uploaded bank statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Calendar date the bank posted the entry
    pub date: NaiveDate,
    /// Time of day, when the statement carries one (display only, never matched on)
    pub time: Option<NaiveTime>,
    /// Narration as printed on the statement
    pub description: String,
    /// Signed amount; credits are positive
    pub amount: BigDecimal,
    /// 1-based row number in the uploaded sheet (the header is row 1)
    pub source_row: usize,
}

impl BankTransaction {
    /// Create a new bank transaction without a time of day
    pub fn new(date: NaiveDate, description: String, amount: BigDecimal, source_row: usize) -> Self {
        Self {
            date,
            time: None,
            description,
            amount,
            source_row,
        }
    }

    /// Money received into the account
    pub fn is_credit(&self) -> bool {
        self.amount > BigDecimal::from(0)
    }
}

/// How a recorded fee payment was made
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Pos,
    Cheque,
    Online,
    Other(String),
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::BankTransfer => write!(f, "Bank Transfer"),
            PaymentMethod::Pos => write!(f, "POS"),
            PaymentMethod::Cheque => write!(f, "Cheque"),
            PaymentMethod::Online => write!(f, "Online"),
            PaymentMethod::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        Ok(match normalized.as_str() {
            "cash" => PaymentMethod::Cash,
            "banktransfer" | "transfer" | "bank" => PaymentMethod::BankTransfer,
            "pos" | "card" => PaymentMethod::Pos,
            "cheque" | "check" => PaymentMethod::Cheque,
            "online" | "web" => PaymentMethod::Online,
            _ => PaymentMethod::Other(s.trim().to_string()),
        })
    }
}

/// A fee payment previously recorded in the payment ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedPayment {
    /// Ledger identifier of the payment
    pub id: String,
    /// Student the payment was recorded against
    pub student_name: String,
    /// Amount recorded as paid
    pub amount_paid: BigDecimal,
    /// When the payment was recorded
    pub payment_date: NaiveDateTime,
    /// How the payment was made
    pub payment_method: PaymentMethod,
}

impl RecordedPayment {
    /// Create a new recorded payment
    pub fn new(
        id: String,
        student_name: String,
        amount_paid: BigDecimal,
        payment_date: NaiveDateTime,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            id,
            student_name,
            amount_paid,
            payment_date,
            payment_method,
        }
    }

    /// Calendar day of the payment, used for date matching
    pub fn payment_day(&self) -> NaiveDate {
        self.payment_date.date()
    }
}

/// Payment as stored by the document database, before validation.
///
/// Every field is optional because the store enforces no schema. Amounts may
/// arrive as numbers or strings; dates as ISO strings or `{seconds, nanoseconds}`
/// timestamp objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDocument {
    pub id: Option<String>,
    pub student_name: Option<String>,
    pub amount_paid: Option<serde_json::Value>,
    pub payment_date: Option<serde_json::Value>,
    pub payment_method: Option<String>,
}

impl PaymentDocument {
    fn parse_amount(value: &serde_json::Value) -> Option<BigDecimal> {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(BigDecimal::from(i)),
                None => n.as_f64().and_then(amount_from_f64),
            },
            serde_json::Value::String(s) => parse_amount_text(s),
            _ => None,
        }
    }

    fn parse_timestamp(value: &serde_json::Value) -> Option<NaiveDateTime> {
        match value {
            serde_json::Value::String(s) => {
                let s = s.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Some(dt.naive_utc());
                }
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                    return Some(dt);
                }
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                    return Some(dt);
                }
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            }
            serde_json::Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))?
                    .as_i64()?;
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0);
                DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
                    .map(|dt| dt.naive_utc())
            }
            _ => None,
        }
    }
}

impl TryFrom<PaymentDocument> for RecordedPayment {
    type Error = FetchError;

    fn try_from(doc: PaymentDocument) -> Result<Self, Self::Error> {
        let id = doc.id.unwrap_or_default();
        let invalid = |reason: String| FetchError::InvalidRecord {
            id: id.clone(),
            reason,
        };

        validate_identifier(&id).map_err(|e| invalid(e.to_string()))?;

        let amount_paid = doc
            .amount_paid
            .as_ref()
            .and_then(PaymentDocument::parse_amount)
            .ok_or_else(|| invalid("amountPaid is missing or not a number".to_string()))?;
        validate_positive_amount(&amount_paid).map_err(|e| invalid(e.to_string()))?;

        let payment_date = doc
            .payment_date
            .as_ref()
            .and_then(PaymentDocument::parse_timestamp)
            .ok_or_else(|| invalid("paymentDate is missing or not a timestamp".to_string()))?;

        let payment_method = doc
            .payment_method
            .as_deref()
            .and_then(|m| m.parse::<PaymentMethod>().ok())
            .unwrap_or(PaymentMethod::Other("Unspecified".to_string()));

        Ok(RecordedPayment {
            student_name: doc.student_name.unwrap_or_default().trim().to_string(),
            id,
            amount_paid,
            payment_date,
            payment_method,
        })
    }
}

/// One bank transaction paired with the recorded payment it settles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub bank_transaction: BankTransaction,
    pub recorded_payment: RecordedPayment,
    /// Bank date minus payment date, in calendar days
    pub day_offset: i64,
}

/// Inclusive date range used to bound the recorded-payment fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReconciliationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReconciliationWindow {
    /// Earliest transaction date to the latest plus `buffer_days`.
    ///
    /// Returns `None` when there are no transactions.
    pub fn covering(transactions: &[BankTransaction], buffer_days: u32) -> Option<Self> {
        let start = transactions.iter().map(|t| t.date).min()?;
        let latest = transactions.iter().map(|t| t.date).max()?;
        let end = latest
            .checked_add_days(Days::new(u64::from(buffer_days)))
            .unwrap_or(NaiveDate::MAX);
        Some(Self { start, end })
    }

    /// Whether a payment timestamp falls on a day inside the window
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let day = timestamp.date();
        day >= self.start && day <= self.end
    }
}

impl fmt::Display for ReconciliationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Outcome of matching one statement against the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub matched: Vec<MatchedPair>,
    pub unmatched_bank: Vec<BankTransaction>,
    pub unmatched_recorded: Vec<RecordedPayment>,
}

impl ReconciliationResult {
    /// True when nothing was matched or left over
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.unmatched_bank.is_empty() && self.unmatched_recorded.is_empty()
    }

    /// Sum of bank amounts that found a recorded payment
    pub fn total_matched(&self) -> BigDecimal {
        self.matched.iter().map(|p| &p.bank_transaction.amount).sum()
    }

    /// Sum of bank credits with no recorded payment
    pub fn total_unmatched_bank(&self) -> BigDecimal {
        self.unmatched_bank.iter().map(|t| &t.amount).sum()
    }

    /// Sum of recorded payments with no bank credit
    pub fn total_unmatched_recorded(&self) -> BigDecimal {
        self.unmatched_recorded.iter().map(|p| &p.amount_paid).sum()
    }

    /// Totals and counts for display
    pub fn summary(&self) -> ReconciliationSummary {
        ReconciliationSummary {
            matched_count: self.matched.len(),
            unmatched_bank_count: self.unmatched_bank.len(),
            unmatched_recorded_count: self.unmatched_recorded.len(),
            total_matched: self.total_matched(),
            total_unmatched_bank: self.total_unmatched_bank(),
            total_unmatched_recorded: self.total_unmatched_recorded(),
        }
    }
}

/// Derived totals of a reconciliation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub matched_count: usize,
    pub unmatched_bank_count: usize,
    pub unmatched_recorded_count: usize,
    pub total_matched: BigDecimal,
    pub total_unmatched_bank: BigDecimal,
    pub total_unmatched_recorded: BigDecimal,
}

impl ReconciliationSummary {
    /// A statement reconciles when every credit and every recorded payment was paired
    pub fn is_fully_reconciled(&self) -> bool {
        self.unmatched_bank_count == 0 && self.unmatched_recorded_count == 0
    }
}

/// Errors raised while reading an uploaded statement
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Statement is missing the required '{0}' column")]
    MissingColumn(String),
    #[error("Statement contains no transactions")]
    EmptyStatement,
    #[error("Row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },
    #[error("Row {row}: cannot parse amount '{value}'")]
    InvalidAmount { row: usize, value: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Workbook error: {0}")]
    Workbook(String),
    #[error("Unsupported statement format: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised while fetching recorded payments
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Payment source unavailable: {0}")]
    Unavailable(String),
    #[error("Payment fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid payment record '{id}': {reason}")]
    InvalidRecord { id: String, reason: String },
}

/// Errors that abort a reconciliation run
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconciliationError>;
