//! Term fee invoice generation

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::billing::*;
use crate::traits::BillingStore;
use crate::utils::validation::{validate_identifier, validate_name, validate_positive_amount};

/// Creates one invoice per active student per term
pub struct InvoiceGenerator<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> InvoiceGenerator<S> {
    /// Create a new invoice generator
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issue invoices for `term` to every active student whose class has a
    /// fee schedule.
    ///
    /// Inputs are validated before anything is written. Students that already
    /// hold an invoice for the term are skipped, so re-running creates nothing.
    #[instrument(skip(self, students, schedules, term), fields(term = %term, students = students.len()))]
    pub async fn generate(
        &mut self,
        students: &[Student],
        schedules: &[FeeSchedule],
        term: &AcademicTerm,
        issued_on: NaiveDate,
    ) -> BillingResult<GenerationReport> {
        let schedules = index_schedules(schedules)?;
        for student in students {
            validate_identifier(&student.id)?;
            validate_name(&student.name)?;
        }

        let mut report = GenerationReport::default();
        for student in students {
            if !student.active {
                report.skip(&student.id, SkipReason::Inactive);
                continue;
            }

            let Some(schedule) = schedules.get(student.class_id.as_str()) else {
                report.skip(&student.id, SkipReason::NoFeeSchedule);
                continue;
            };

            if self.store.invoice_exists(&student.id, term).await? {
                debug!(student_id = %student.id, "Invoice already issued");
                report.skip(&student.id, SkipReason::AlreadyExists);
                continue;
            }

            let invoice = Invoice {
                id: uuid::Uuid::new_v4().to_string(),
                student_id: student.id.clone(),
                student_name: student.name.trim().to_string(),
                class_id: student.class_id.clone(),
                term: term.clone(),
                items: schedule.items.clone(),
                total: schedule.total(),
                status: InvoiceStatus::Unpaid,
                issued_on,
            };
            self.store.save_invoice(&invoice).await?;
            report.created.push(invoice.id);
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Invoice generation complete"
        );
        Ok(report)
    }
}

fn index_schedules(schedules: &[FeeSchedule]) -> BillingResult<HashMap<&str, &FeeSchedule>> {
    let mut index = HashMap::new();
    for schedule in schedules {
        validate_identifier(&schedule.class_id)?;
        if schedule.items.is_empty() {
            return Err(BillingError::Validation(format!(
                "Fee schedule for class '{}' has no items",
                schedule.class_id
            )));
        }
        for item in &schedule.items {
            validate_positive_amount(&item.amount).map_err(|e| {
                BillingError::Validation(format!(
                    "Fee '{}' for class '{}': {}",
                    item.name, schedule.class_id, e
                ))
            })?;
        }
        if index.insert(schedule.class_id.as_str(), schedule).is_some() {
            return Err(BillingError::Validation(format!(
                "Class '{}' has more than one fee schedule",
                schedule.class_id
            )));
        }
    }
    Ok(index)
}
