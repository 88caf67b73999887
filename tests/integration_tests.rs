//! Integration tests for fees-reconciliation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use fees_reconciliation::{
    to_csv_string,
    utils::{MemoryBillingStore, MemoryPaymentRepository},
    AcademicTerm, BillingStore, ParseError, ReconciliationError, FeeItem, FeeSchedule, InvoiceGenerator, PayPeriod, PaymentMethod,
    PayrollGenerator, ReconciliationConfig, ReconciliationOutcome, RecordedPayment, Reconciler,
    SkipReason, StaffMember, Student, TieBreakPolicy,
};

fn jan(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn payment(id: &str, name: &str, amount: i64, d: u32) -> RecordedPayment {
    RecordedPayment::new(
        id.to_string(),
        name.to_string(),
        BigDecimal::from(amount),
        jan(d).and_hms_opt(11, 0, 0).unwrap(),
        PaymentMethod::BankTransfer,
    )
}

#[tokio::test]
async fn test_statement_with_one_match_and_one_late_payment() {
    let repository = MemoryPaymentRepository::new();
    repository.insert(payment("p1", "Ada Obi", 5000, 11));
    repository.insert(payment("p2", "Chidi Eze", 3000, 20));

    let statement = "Date,Description,Amount\n\
                     2024-01-10,Transfer from Ada Obi,5000\n\
                     2024-01-12,Transfer from C Eze,3000\n";

    let reconciler = Reconciler::new(repository);
    let outcome = reconciler
        .reconcile_statement(statement.as_bytes(), Some("january.csv"))
        .await
        .unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.result.matched.len(), 1);
    assert_eq!(report.result.matched[0].recorded_payment.id, "p1");
    assert_eq!(report.result.unmatched_bank.len(), 1);
    assert_eq!(report.result.unmatched_bank[0].amount, BigDecimal::from(3000));
    assert_eq!(report.result.unmatched_bank[0].date, jan(12));
    // Jan 20 is outside [Jan 10, Jan 13], so it was never fetched
    assert!(report.result.unmatched_recorded.is_empty());
    assert_eq!(report.summary.total_matched, BigDecimal::from(5000));
    assert_eq!(report.summary.total_unmatched_bank, BigDecimal::from(3000));
}

#[tokio::test]
async fn test_debit_only_statement_is_not_an_error() {
    let reconciler = Reconciler::new(MemoryPaymentRepository::new());
    let outcome = reconciler
        .reconcile_statement(b"Date,Description,Amount\n2024-01-05,Bank charges,-200\n", None)
        .await
        .unwrap();

    assert_eq!(outcome, ReconciliationOutcome::NothingToReconcile);
    assert!(outcome.into_result().is_empty());
}

#[tokio::test]
async fn test_exponent_amount_is_rejected_before_fetch() {
    let repository = MemoryPaymentRepository::new();
    repository.insert(payment("p1", "Ada Obi", 5000, 10));

    let statement = "Date,Description,Amount\n\
                     2024-01-10,x,1e-200000000\n\
                     2024-01-10,Fees Ada Obi,5000\n";
    let result = Reconciler::new(repository)
        .reconcile_statement(statement.as_bytes(), Some("january.csv"))
        .await;

    assert!(matches!(
        result,
        Err(ReconciliationError::Parse(ParseError::InvalidAmount { row: 2, .. }))
    ));
}

#[tokio::test]
async fn test_windows_1252_statement_reconciles() {
    let repository = MemoryPaymentRepository::new();
    repository.insert(payment("p1", "Ada Obi", 5000, 10));

    let statement = b"Date,Description,Amount\n2024-01-10,Fees \xa3 caf\xe9,5000\n";
    let result = Reconciler::new(repository)
        .reconcile_statement(statement, Some("january.csv"))
        .await
        .unwrap()
        .into_result();

    assert_eq!(result.matched.len(), 1);
    assert!(result.matched[0].bank_transaction.description.starts_with("Fees "));
}

#[tokio::test]
async fn test_duplicate_amounts_consume_the_single_payment() {
    let repository = MemoryPaymentRepository::new();
    repository.insert(payment("p1", "Ada Obi", 1000, 1));

    let statement = "Date,Description,Amount\n2024-01-01,Fees,1000\n2024-01-02,Fees,1000\n";
    let reconciler = Reconciler::new(repository);
    let result = reconciler
        .reconcile_statement(statement.as_bytes(), Some("jan.csv"))
        .await
        .unwrap()
        .into_result();

    assert_eq!(result.matched.len(), 1);
    assert_eq!(result.matched[0].bank_transaction.date, jan(1));
    assert_eq!(result.unmatched_bank.len(), 1);
    assert_eq!(result.unmatched_bank[0].date, jan(2));
    assert!(result.unmatched_recorded.is_empty());
}

#[tokio::test]
async fn test_workbook_statement() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Transaction Date").unwrap();
    sheet.write_string(0, 1, "Narration").unwrap();
    sheet.write_string(0, 2, "Amount").unwrap();
    sheet.write_string(0, 3, "Balance").unwrap();
    // Excel serial for 2024-01-10
    sheet.write_number(1, 0, 45301.0).unwrap();
    sheet.write_string(1, 1, "Fees Ada Obi").unwrap();
    sheet.write_number(1, 2, 5000.0).unwrap();
    sheet.write_number(1, 3, 25000.0).unwrap();
    sheet.write_string(2, 0, "2024-01-11").unwrap();
    sheet.write_string(2, 1, "POS charge").unwrap();
    sheet.write_number(2, 2, -50.0).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let repository = MemoryPaymentRepository::new();
    repository.insert(payment("p1", "Ada Obi", 5000, 11));

    let reconciler = Reconciler::new(repository);
    let outcome = reconciler
        .reconcile_statement(&bytes, Some("january.xlsx"))
        .await
        .unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.summary.matched_count, 1);
    assert!(report.summary.is_fully_reconciled());
    let pair = &report.result.matched[0];
    assert_eq!(pair.bank_transaction.description, "Fees Ada Obi");
    assert_eq!(pair.bank_transaction.source_row, 2);
    assert_eq!(pair.day_offset, -1);
}

#[tokio::test]
async fn test_closest_date_policy_from_config() {
    let config = ReconciliationConfig::from_toml_str(
        r#"
        tie_break = "closest_date"
        fetch_timeout_secs = 5
        "#,
    )
    .unwrap();
    assert_eq!(config.tie_break, TieBreakPolicy::ClosestDate);

    let repository = MemoryPaymentRepository::new();
    repository.insert(payment("far", "Ada Obi", 5000, 11));
    repository.insert(payment("near", "Bola Ade", 5000, 10));

    let reconciler = Reconciler::with_config(repository, config).unwrap();
    let result = reconciler
        .reconcile_statement(b"Date,Amount\n2024-01-10,5000\n", None)
        .await
        .unwrap()
        .into_result();

    assert_eq!(result.matched[0].recorded_payment.id, "near");
    assert_eq!(result.unmatched_recorded[0].id, "far");

    let csv = to_csv_string(&result).unwrap();
    assert!(csv.contains("matched,2024-01-10,,5000,near,Bola Ade"));
    assert!(csv.contains("unmatched_recorded,,,5000,far,Ada Obi"));
}

#[tokio::test]
async fn test_term_billing_and_payroll_reruns() {
    let store = MemoryBillingStore::new();
    let term = AcademicTerm::new("2024/2025".to_string(), 2).unwrap();
    let issued_on = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

    let students = vec![
        Student::new("stu-001".to_string(), "Ada Obi".to_string(), "jss2".to_string()),
        Student::new("stu-002".to_string(), "Chidi Eze".to_string(), "jss2".to_string()),
    ];
    let schedules = vec![FeeSchedule::new(
        "jss2".to_string(),
        vec![
            FeeItem::new("Tuition".to_string(), BigDecimal::from(60000)),
            FeeItem::new("PTA Levy".to_string(), BigDecimal::from(2500)),
        ],
    )];

    // Both generators share the same underlying collections
    let mut invoices = InvoiceGenerator::new(store.clone());
    let first = invoices
        .generate(&students, &schedules, &term, issued_on)
        .await
        .unwrap();
    let rerun = invoices
        .generate(&students, &schedules, &term, issued_on)
        .await
        .unwrap();
    assert_eq!(first.created.len(), 2);
    assert!(rerun.created.is_empty());
    assert_eq!(rerun.skipped_for(SkipReason::AlreadyExists), 2);

    let mut payroll = PayrollGenerator::new(store.clone());
    let period = PayPeriod::new(2025, 1).unwrap();
    let staff = vec![StaffMember::new(
        "stf-01".to_string(),
        "Mrs Okafor".to_string(),
        BigDecimal::from(150000),
    )];
    assert_eq!(
        payroll.generate(&staff, period, issued_on).await.unwrap().created.len(),
        1
    );
    assert!(payroll
        .generate(&staff, period, issued_on)
        .await
        .unwrap()
        .created
        .is_empty());

    assert_eq!(store.list_invoices(&term).await.unwrap().len(), 2);
    assert_eq!(store.list_payslips(&period).await.unwrap().len(), 1);
}
