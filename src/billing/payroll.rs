//! Monthly payroll generation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::billing::*;
use crate::traits::BillingStore;
use crate::utils::validation::{validate_identifier, validate_name, validate_non_negative_amount};

impl Payslip {
    /// Work out the payslip for a staff member.
    ///
    /// Fails when deductions exceed gross pay.
    pub fn calculate(
        staff: &StaffMember,
        period: PayPeriod,
        generated_on: NaiveDate,
    ) -> BillingResult<Self> {
        validate_identifier(&staff.id)?;
        validate_name(&staff.name)?;
        validate_non_negative_amount(&staff.base_salary)?;
        for item in staff.allowances.iter().chain(&staff.deductions) {
            validate_non_negative_amount(&item.amount).map_err(|e| {
                BillingError::Validation(format!("'{}' for staff '{}': {}", item.name, staff.id, e))
            })?;
        }

        let total_allowances: BigDecimal = staff.allowances.iter().map(|a| &a.amount).sum();
        let total_deductions: BigDecimal = staff.deductions.iter().map(|d| &d.amount).sum();
        let gross_pay = &staff.base_salary + &total_allowances;
        let net_pay = &gross_pay - &total_deductions;

        if net_pay < BigDecimal::from(0) {
            return Err(BillingError::Validation(format!(
                "Deductions of {} exceed gross pay of {} for staff '{}' in {}",
                total_deductions, gross_pay, staff.id, period
            )));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            staff_id: staff.id.clone(),
            staff_name: staff.name.trim().to_string(),
            period,
            base_salary: staff.base_salary.clone(),
            allowances: staff.allowances.clone(),
            deductions: staff.deductions.clone(),
            gross_pay,
            total_deductions,
            net_pay,
            generated_on,
        })
    }
}

/// Creates one payslip per active staff member per month
pub struct PayrollGenerator<S: BillingStore> {
    store: S,
}

impl<S: BillingStore> PayrollGenerator<S> {
    /// Create a new payroll generator
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generate payslips for `period`.
    ///
    /// Every active staff member's pay is calculated before anything is
    /// written; one invalid payslip aborts the whole run. Staff already paid
    /// for the period are skipped.
    #[instrument(skip(self, staff, period), fields(period = %period, staff = staff.len()))]
    pub async fn generate(
        &mut self,
        staff: &[StaffMember],
        period: PayPeriod,
        generated_on: NaiveDate,
    ) -> BillingResult<GenerationReport> {
        let mut payslips = Vec::with_capacity(staff.len());
        for member in staff {
            let payslip = if member.active {
                Some(Payslip::calculate(member, period, generated_on)?)
            } else {
                None
            };
            payslips.push((member, payslip));
        }

        let mut report = GenerationReport::default();
        for (member, payslip) in payslips {
            let Some(payslip) = payslip else {
                report.skip(&member.id, SkipReason::Inactive);
                continue;
            };

            if self.store.payslip_exists(&member.id, &period).await? {
                debug!(staff_id = %member.id, "Payslip already generated");
                report.skip(&member.id, SkipReason::AlreadyExists);
                continue;
            }

            self.store.save_payslip(&payslip).await?;
            report.created.push(payslip.id);
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Payroll generation complete"
        );
        Ok(report)
    }
}
