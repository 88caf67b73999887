//! Generate term invoices and monthly payslips, then re-run both

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use fees_reconciliation::utils::MemoryBillingStore;
use fees_reconciliation::{
    AcademicTerm, FeeItem, FeeSchedule, InvoiceGenerator, PayItem, PayPeriod, PayrollGenerator,
    SkipReason, StaffMember, Student,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("🧾 Fees Reconciliation - Term Billing Example\n");

    let store = MemoryBillingStore::new();
    let term = AcademicTerm::new("2024/2025".to_string(), 1)?;
    let today = NaiveDate::from_ymd_opt(2024, 9, 9).ok_or("invalid demo date")?;

    let schedules = vec![
        FeeSchedule::new(
            "jss1".to_string(),
            vec![
                FeeItem::new("Tuition".to_string(), BigDecimal::from(45000)),
                FeeItem::new("Books".to_string(), BigDecimal::from(7500)),
            ],
        ),
        FeeSchedule::new(
            "ss1".to_string(),
            vec![
                FeeItem::new("Tuition".to_string(), BigDecimal::from(60000)),
                FeeItem::new("Laboratory".to_string(), BigDecimal::from(5000)),
            ],
        ),
    ];

    let mut graduated = Student::new("stu-900".to_string(), "Tunde Bello".to_string(), "ss3".to_string());
    graduated.active = false;
    let students = vec![
        Student::new("stu-001".to_string(), "Ada Obi".to_string(), "jss1".to_string()),
        Student::new("stu-002".to_string(), "Chidi Eze".to_string(), "ss1".to_string()),
        Student::new("stu-003".to_string(), "Ngozi Umeh".to_string(), "ss2".to_string()),
        graduated,
    ];

    let mut invoices = InvoiceGenerator::new(store.clone());
    for run in 1..=2 {
        let report = invoices.generate(&students, &schedules, &term, today).await?;
        println!(
            "📚 {} invoices, run {}: {} created, {} already issued, {} without schedule, {} inactive",
            term,
            run,
            report.created.len(),
            report.skipped_for(SkipReason::AlreadyExists),
            report.skipped_for(SkipReason::NoFeeSchedule),
            report.skipped_for(SkipReason::Inactive)
        );
    }

    let mut bursar = StaffMember::new("stf-01".to_string(), "Mrs Okafor".to_string(), BigDecimal::from(150000));
    bursar
        .allowances
        .push(PayItem::new("Housing".to_string(), BigDecimal::from(30000)));
    bursar
        .deductions
        .push(PayItem::new("Pension".to_string(), BigDecimal::from(12000)));
    let staff = vec![
        bursar,
        StaffMember::new("stf-02".to_string(), "Mr Adeyemi".to_string(), BigDecimal::from(120000)),
    ];

    let period = PayPeriod::new(2024, 9)?;
    let mut payroll = PayrollGenerator::new(store.clone());
    for run in 1..=2 {
        let report = payroll.generate(&staff, period, today).await?;
        println!(
            "💰 Payroll {}, run {}: {} created, {} already generated",
            period,
            run,
            report.created.len(),
            report.skipped_for(SkipReason::AlreadyExists)
        );
    }

    Ok(())
}
