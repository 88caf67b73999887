//! Reconcile a bank statement against recorded fee payments

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use fees_reconciliation::utils::MemoryPaymentRepository;
use fees_reconciliation::{
    to_csv_string, PaymentMethod, ReconciliationConfig, ReconciliationOutcome, RecordedPayment,
    Reconciler,
};
use tracing_subscriber::EnvFilter;

const STATEMENT: &str = "\
Date,Description,Amount,Balance
2024-01-10,TRF FROM ADA OBI SCHOOL FEES,\"50,000.00\",150000.00
2024-01-10,SMS ALERT CHARGES,-20.00,149980.00
2024-01-12,TRF FROM CHIDI EZE,\"35,000.00\",184980.00
2024-01-15,POS DEPOSIT,12500.00,197480.00
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🏦 Fees Reconciliation - Statement Example\n");

    let repository = MemoryPaymentRepository::new();
    let recorded = [
        ("pay-001", "Ada Obi", 50000, 11, PaymentMethod::BankTransfer),
        ("pay-002", "Chidi Eze", 35000, 19, PaymentMethod::BankTransfer),
        ("pay-003", "Bola Ade", 12500, 14, PaymentMethod::Pos),
        ("pay-004", "Emeka Nwosu", 20000, 13, PaymentMethod::Cash),
    ];
    for (id, name, amount, day, method) in recorded {
        repository.insert(RecordedPayment::new(
            id.to_string(),
            name.to_string(),
            BigDecimal::from(amount),
            NaiveDate::from_ymd_opt(2024, 1, day)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .ok_or("invalid demo date")?,
            method,
        ));
    }

    let config = ReconciliationConfig::from_toml_str("date_tolerance_days = 2\nwindow_buffer_days = 1\n")?;
    let reconciler = Reconciler::with_config(repository, config)?;
    let outcome = reconciler
        .reconcile_statement(STATEMENT.as_bytes(), Some("january.csv"))
        .await?;

    println!("{}\n", outcome.message());

    if let ReconciliationOutcome::Reconciled(report) = &outcome {
        println!("📅 Window: {}", report.window);
        println!("  ✓ Matched:            {} (₦{})", report.summary.matched_count, report.summary.total_matched);
        println!(
            "  ✗ Unmatched bank:     {} (₦{})",
            report.summary.unmatched_bank_count, report.summary.total_unmatched_bank
        );
        println!(
            "  ✗ Unmatched recorded: {} (₦{})\n",
            report.summary.unmatched_recorded_count, report.summary.total_unmatched_recorded
        );

        for pair in &report.result.matched {
            println!(
                "  {} | {} ↔ {} ({}, {} day offset)",
                pair.bank_transaction.date,
                pair.bank_transaction.description,
                pair.recorded_payment.student_name,
                pair.recorded_payment.payment_method,
                pair.day_offset
            );
        }

        println!("\n📄 CSV export:\n{}", to_csv_string(&report.result)?);
    }

    Ok(())
}
