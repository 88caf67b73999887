//! Traits for storage abstraction
//!
//! The payment ledger and the billing collections live in a hosted document
//! store. These traits let the reconciliation and billing logic run against
//! any backend (document database, SQL table, in-memory) passed in at
//! construction time.

use async_trait::async_trait;

use crate::billing::{AcademicTerm, BillingResult, Invoice, PayPeriod, Payslip};
use crate::types::*;

/// Read access to the recorded fee payments
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Payments whose payment date falls on a day inside `window`.
    ///
    /// Results are returned in the store's natural order; the matcher treats
    /// that order as the tie-break order.
    async fn find_by_date_range(
        &self,
        window: &ReconciliationWindow,
    ) -> Result<Vec<RecordedPayment>, FetchError>;
}

/// Persistence for generated invoices and payslips
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Whether an invoice already exists for the student in the term
    async fn invoice_exists(&self, student_id: &str, term: &AcademicTerm) -> BillingResult<bool>;

    /// Save a newly generated invoice
    async fn save_invoice(&mut self, invoice: &Invoice) -> BillingResult<()>;

    /// All invoices issued for a term
    async fn list_invoices(&self, term: &AcademicTerm) -> BillingResult<Vec<Invoice>>;

    /// Whether a payslip already exists for the staff member in the period
    async fn payslip_exists(&self, staff_id: &str, period: &PayPeriod) -> BillingResult<bool>;

    /// Save a newly generated payslip
    async fn save_payslip(&mut self, payslip: &Payslip) -> BillingResult<()>;

    /// All payslips for a pay period
    async fn list_payslips(&self, period: &PayPeriod) -> BillingResult<Vec<Payslip>>;
}
