//! In-memory storage implementations for testing

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::billing::*;
use crate::traits::*;
use crate::types::*;

/// In-memory payment ledger for testing and development.
///
/// Payments are returned in insertion order, standing in for the natural
/// order of a document store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPaymentRepository {
    payments: Arc<RwLock<Vec<RecordedPayment>>>,
}

impl MemoryPaymentRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from raw store documents, validating each one
    pub fn from_documents(documents: Vec<PaymentDocument>) -> Result<Self, FetchError> {
        let payments = documents
            .into_iter()
            .map(RecordedPayment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            payments: Arc::new(RwLock::new(payments)),
        })
    }

    /// Record a payment
    pub fn insert(&self, payment: RecordedPayment) {
        self.payments
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(payment);
    }

    pub fn len(&self) -> usize {
        self.payments
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all data (useful for testing), recovering a poisoned lock
    pub fn clear(&self) {
        self.payments
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.payments.clear_poison();
    }
}

#[async_trait]
impl PaymentRepository for MemoryPaymentRepository {
    async fn find_by_date_range(
        &self,
        window: &ReconciliationWindow,
    ) -> Result<Vec<RecordedPayment>, FetchError> {
        let payments = self
            .payments
            .read()
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;
        Ok(payments
            .iter()
            .filter(|p| window.contains(&p.payment_date))
            .cloned()
            .collect())
    }
}

/// In-memory invoice and payslip collections
#[derive(Debug, Clone, Default)]
pub struct MemoryBillingStore {
    invoices: Arc<RwLock<Vec<Invoice>>>,
    payslips: Arc<RwLock<Vec<Payslip>>>,
}

impl MemoryBillingStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing), recovering poisoned collections
    pub fn clear(&self) {
        self.invoices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.invoices.clear_poison();
        self.payslips
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.payslips.clear_poison();
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> BillingError {
    BillingError::Storage(e.to_string())
}

#[async_trait]
impl BillingStore for MemoryBillingStore {
    async fn invoice_exists(&self, student_id: &str, term: &AcademicTerm) -> BillingResult<bool> {
        Ok(self
            .invoices
            .read()
            .map_err(poisoned)?
            .iter()
            .any(|i| i.student_id == student_id && &i.term == term))
    }

    async fn save_invoice(&mut self, invoice: &Invoice) -> BillingResult<()> {
        self.invoices.write().map_err(poisoned)?.push(invoice.clone());
        Ok(())
    }

    async fn list_invoices(&self, term: &AcademicTerm) -> BillingResult<Vec<Invoice>> {
        Ok(self
            .invoices
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|i| &i.term == term)
            .cloned()
            .collect())
    }

    async fn payslip_exists(&self, staff_id: &str, period: &PayPeriod) -> BillingResult<bool> {
        Ok(self
            .payslips
            .read()
            .map_err(poisoned)?
            .iter()
            .any(|p| p.staff_id == staff_id && &p.period == period))
    }

    async fn save_payslip(&mut self, payslip: &Payslip) -> BillingResult<()> {
        self.payslips.write().map_err(poisoned)?.push(payslip.clone());
        Ok(())
    }

    async fn list_payslips(&self, period: &PayPeriod) -> BillingResult<Vec<Payslip>> {
        Ok(self
            .payslips
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|p| &p.period == period)
            .cloned()
            .collect())
    }
}
