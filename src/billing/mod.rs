//! Per-period billing documents: student fee invoices and staff payslips
//!
//! Generation is idempotent. A document that already exists for the same
//! subject and period is skipped, so a generation can safely be re-run.

pub mod invoice;
pub mod payroll;

pub use invoice::*;
pub use payroll::*;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::validation::ValidationError;

/// A student on the school roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Class the student is enrolled in, e.g. `jss1`
    pub class_id: String,
    /// Withdrawn or graduated students are not billed
    pub active: bool,
}

impl Student {
    pub fn new(id: String, name: String, class_id: String) -> Self {
        Self {
            id,
            name,
            class_id,
            active: true,
        }
    }
}

/// A named fee line such as tuition or uniform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeItem {
    pub name: String,
    pub amount: BigDecimal,
}

impl FeeItem {
    pub fn new(name: String, amount: BigDecimal) -> Self {
        Self { name, amount }
    }
}

/// Fees charged to every student in a class each term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub class_id: String,
    pub items: Vec<FeeItem>,
}

impl FeeSchedule {
    pub fn new(class_id: String, items: Vec<FeeItem>) -> Self {
        Self { class_id, items }
    }

    /// Sum of all fee lines
    pub fn total(&self) -> BigDecimal {
        self.items.iter().map(|i| &i.amount).sum()
    }
}

/// Academic session and term, e.g. `2024/2025` term 1
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AcademicTerm {
    pub session: String,
    /// 1, 2 or 3
    pub term: u8,
}

impl AcademicTerm {
    /// Create a term, rejecting term numbers outside 1..=3
    pub fn new(session: String, term: u8) -> BillingResult<Self> {
        if session.trim().is_empty() {
            return Err(BillingError::Validation(
                "Academic session cannot be empty".to_string(),
            ));
        }
        if !(1..=3).contains(&term) {
            return Err(BillingError::Validation(format!(
                "Term must be 1, 2 or 3, got {}",
                term
            )));
        }
        Ok(Self { session, term })
    }
}

impl fmt::Display for AcademicTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Term {}", self.session, self.term)
    }
}

/// Payment state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Freshly issued
    Unpaid,
}

/// Fee invoice for one student for one term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub term: AcademicTerm,
    pub items: Vec<FeeItem>,
    pub total: BigDecimal,
    pub status: InvoiceStatus,
    pub issued_on: NaiveDate,
}

/// A named allowance or deduction on a payslip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayItem {
    pub name: String,
    pub amount: BigDecimal,
}

impl PayItem {
    pub fn new(name: String, amount: BigDecimal) -> Self {
        Self { name, amount }
    }
}

/// A member of staff on the payroll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub base_salary: BigDecimal,
    pub allowances: Vec<PayItem>,
    pub deductions: Vec<PayItem>,
    pub active: bool,
}

impl StaffMember {
    pub fn new(id: String, name: String, base_salary: BigDecimal) -> Self {
        Self {
            id,
            name,
            base_salary,
            allowances: Vec::new(),
            deductions: Vec::new(),
            active: true,
        }
    }
}

/// Calendar month a payslip covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayPeriod {
    pub year: i32,
    pub month: u32,
}

impl PayPeriod {
    /// Create a period, rejecting months outside 1..=12
    pub fn new(year: i32, month: u32) -> BillingResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(BillingError::Validation(format!(
                "Invalid pay period {}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Monthly pay statement for one staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    pub id: String,
    pub staff_id: String,
    pub staff_name: String,
    pub period: PayPeriod,
    pub base_salary: BigDecimal,
    pub allowances: Vec<PayItem>,
    pub deductions: Vec<PayItem>,
    /// Base salary plus allowances
    pub gross_pay: BigDecimal,
    pub total_deductions: BigDecimal,
    /// Gross pay minus deductions
    pub net_pay: BigDecimal,
    pub generated_on: NaiveDate,
}

/// Why a subject got no document in a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A document for the same subject and period is already on file
    AlreadyExists,
    Inactive,
    /// No fee schedule for the student's class
    NoFeeSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Student or staff id
    pub subject_id: String,
    pub reason: SkipReason,
}

/// What a generation run created and skipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Ids of the documents created
    pub created: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

impl GenerationReport {
    fn skip(&mut self, subject_id: &str, reason: SkipReason) {
        self.skipped.push(SkippedEntry {
            subject_id: subject_id.to_string(),
            reason,
        });
    }

    /// Number of subjects skipped for `reason`
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Billing-related errors
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ValidationError> for BillingError {
    fn from(e: ValidationError) -> Self {
        BillingError::Validation(e.0)
    }
}

/// Result type for billing operations
pub type BillingResult<T> = Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academic_term_rules() {
        let term = AcademicTerm::new("2024/2025".to_string(), 1).unwrap();
        assert_eq!(term.to_string(), "2024/2025 Term 1");
        assert!(AcademicTerm::new("2024/2025".to_string(), 4).is_err());
        assert!(AcademicTerm::new(" ".to_string(), 2).is_err());
    }

    #[test]
    fn test_pay_period_rules() {
        let period = PayPeriod::new(2024, 9).unwrap();
        assert_eq!(period.to_string(), "2024-09");
        assert!(PayPeriod::new(2024, 13).is_err());
    }
}
