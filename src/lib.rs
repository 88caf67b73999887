//! # Fees Reconciliation
//!
//! Back-office finance for a school: reconcile uploaded bank statements
//! against the fee payments recorded in the payment ledger, and generate
//! term invoices and monthly payslips without creating duplicates.
//!
//! ## Features
//!
//! - **Statement parsing**: CSV and spreadsheet workbooks with header-based column lookup
//! - **Reconciliation**: greedy exact-amount matching within a date tolerance
//! - **Summaries and export**: matched and unmatched totals, CSV and JSON output
//! - **Billing**: idempotent per-term invoices and per-month payslips
//! - **Storage abstraction**: the payment ledger and billing store are traits
//!
//! ## Quick Start
//!
//! ```rust
//! use fees_reconciliation::utils::MemoryPaymentRepository;
//! use fees_reconciliation::{PaymentMethod, RecordedPayment, Reconciler};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = MemoryPaymentRepository::new();
//! repository.insert(RecordedPayment::new(
//!     "pay-1".to_string(),
//!     "Ada Obi".to_string(),
//!     BigDecimal::from(5000),
//!     NaiveDate::from_ymd_opt(2024, 1, 11).unwrap().and_hms_opt(9, 0, 0).unwrap(),
//!     PaymentMethod::BankTransfer,
//! ));
//!
//! let statement = b"Date,Description,Amount\n2024-01-10,Fees Ada Obi,5000\n";
//! let reconciler = Reconciler::new(repository);
//! let outcome = reconciler.reconcile_statement(statement, Some("jan.csv")).await?;
//! assert_eq!(outcome.report().unwrap().summary.matched_count, 1);
//! # Ok(())
//! # }
//! ```

pub mod billing;
pub mod config;
pub mod reconciliation;
pub mod statement;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use billing::*;
pub use config::*;
pub use reconciliation::*;
pub use statement::{StatementFormat, StatementParser};
pub use traits::*;
pub use types::*;
