//! CSV and JSON export of reconciliation results

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::io::Write;

use crate::types::*;

/// One line of the flat CSV export
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    status: &'static str,
    date: Option<NaiveDate>,
    description: &'a str,
    amount: String,
    payment_id: &'a str,
    student_name: &'a str,
    payment_date: Option<NaiveDateTime>,
    payment_method: String,
    source_row: Option<usize>,
}

impl<'a> ExportRow<'a> {
    fn matched(pair: &'a MatchedPair) -> Self {
        let txn = &pair.bank_transaction;
        let payment = &pair.recorded_payment;
        Self {
            status: "matched",
            date: Some(txn.date),
            description: &txn.description,
            amount: txn.amount.to_string(),
            payment_id: &payment.id,
            student_name: &payment.student_name,
            payment_date: Some(payment.payment_date),
            payment_method: payment.payment_method.to_string(),
            source_row: Some(txn.source_row),
        }
    }

    fn unmatched_bank(txn: &'a BankTransaction) -> Self {
        Self {
            status: "unmatched_bank",
            date: Some(txn.date),
            description: &txn.description,
            amount: txn.amount.to_string(),
            payment_id: "",
            student_name: "",
            payment_date: None,
            payment_method: String::new(),
            source_row: Some(txn.source_row),
        }
    }

    fn unmatched_recorded(payment: &'a RecordedPayment) -> Self {
        Self {
            status: "unmatched_recorded",
            date: None,
            description: "",
            amount: payment.amount_paid.to_string(),
            payment_id: &payment.id,
            student_name: &payment.student_name,
            payment_date: Some(payment.payment_date),
            payment_method: payment.payment_method.to_string(),
            source_row: None,
        }
    }
}

/// Pretty-printed JSON of the three partitions; amounts are decimal strings
pub fn to_json(result: &ReconciliationResult) -> ReconcileResult<String> {
    serde_json::to_string_pretty(result).map_err(|e| ReconciliationError::Export(e.to_string()))
}

/// Write one CSV row per matched pair, unmatched credit and unmatched payment
pub fn write_csv<W: Write>(result: &ReconciliationResult, writer: W) -> ReconcileResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let rows = result
        .matched
        .iter()
        .map(ExportRow::matched)
        .chain(result.unmatched_bank.iter().map(ExportRow::unmatched_bank))
        .chain(result.unmatched_recorded.iter().map(ExportRow::unmatched_recorded));

    for row in rows {
        wtr.serialize(row)
            .map_err(|e| ReconciliationError::Export(e.to_string()))?;
    }

    wtr.flush()
        .map_err(|e| ReconciliationError::Export(e.to_string()))?;
    Ok(())
}

/// CSV export as a string
pub fn to_csv_string(result: &ReconciliationResult) -> ReconcileResult<String> {
    let mut buf = Vec::new();
    write_csv(result, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ReconciliationError::Export(e.to_string()))
}
