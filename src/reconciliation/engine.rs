//! One reconciliation run: parse, fetch, match, summarise

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::ReconciliationConfig;
use crate::reconciliation::matcher::Matcher;
use crate::statement::StatementParser;
use crate::traits::PaymentRepository;
use crate::types::*;

/// Completed reconciliation of one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Date range the payments were fetched for
    pub window: ReconciliationWindow,
    /// Number of recorded payments the repository returned
    pub fetched: usize,
    pub result: ReconciliationResult,
    pub summary: ReconciliationSummary,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationOutcome {
    /// The statement held no credits; nothing was fetched
    NothingToReconcile,
    Reconciled(ReconciliationReport),
}

impl ReconciliationOutcome {
    /// Message suitable for a notification banner
    pub fn message(&self) -> String {
        match self {
            ReconciliationOutcome::NothingToReconcile => {
                "No credit transactions found in the statement; nothing to reconcile".to_string()
            }
            ReconciliationOutcome::Reconciled(report) => format!(
                "Matched {} of {} credits; {} recorded payments unmatched",
                report.summary.matched_count,
                report.summary.matched_count + report.summary.unmatched_bank_count,
                report.summary.unmatched_recorded_count
            ),
        }
    }

    pub fn report(&self) -> Option<&ReconciliationReport> {
        match self {
            ReconciliationOutcome::NothingToReconcile => None,
            ReconciliationOutcome::Reconciled(report) => Some(report),
        }
    }

    /// The result partitions; empty when there was nothing to reconcile
    pub fn into_result(self) -> ReconciliationResult {
        match self {
            ReconciliationOutcome::NothingToReconcile => ReconciliationResult::default(),
            ReconciliationOutcome::Reconciled(report) => report.result,
        }
    }
}

/// Reconciles bank statements against a payment repository
pub struct Reconciler<R: PaymentRepository> {
    repository: R,
    config: ReconciliationConfig,
    parser: StatementParser,
    matcher: Matcher,
}

impl<R: PaymentRepository> Reconciler<R> {
    /// Create a reconciler with default settings
    pub fn new(repository: R) -> Self {
        let config = ReconciliationConfig::default();
        Self {
            repository,
            parser: StatementParser::new(config.statement.clone()),
            matcher: Matcher::from_config(&config),
            config,
        }
    }

    /// Create a reconciler with custom settings
    pub fn with_config(repository: R, config: ReconciliationConfig) -> ReconcileResult<Self> {
        config.validate()?;
        Ok(Self {
            repository,
            parser: StatementParser::new(config.statement.clone()),
            matcher: Matcher::from_config(&config),
            config,
        })
    }

    /// Parse an uploaded statement and reconcile it
    pub async fn reconcile_statement(
        &self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> ReconcileResult<ReconciliationOutcome> {
        let transactions = self.parser.parse(bytes, file_name)?;
        self.reconcile(&transactions).await
    }

    /// Reconcile already-parsed statement transactions.
    ///
    /// A fetch failure or timeout aborts the run; no partial result is returned.
    #[instrument(name = "reconcile", skip_all, fields(transactions = transactions.len()))]
    pub async fn reconcile(
        &self,
        transactions: &[BankTransaction],
    ) -> ReconcileResult<ReconciliationOutcome> {
        let credits = Matcher::credits(transactions);
        let Some(window) = ReconciliationWindow::covering(&credits, self.config.window_buffer_days)
        else {
            info!("Statement has no credits; nothing to reconcile");
            return Ok(ReconciliationOutcome::NothingToReconcile);
        };

        let payments = self.fetch(&window).await?;
        let fetched = payments.len();
        let result = self.matcher.match_payments(&credits, payments);
        let summary = result.summary();

        info!(
            %window,
            credits = credits.len(),
            fetched,
            matched = summary.matched_count,
            unmatched_bank = summary.unmatched_bank_count,
            unmatched_recorded = summary.unmatched_recorded_count,
            "Reconciliation complete"
        );

        Ok(ReconciliationOutcome::Reconciled(ReconciliationReport {
            window,
            fetched,
            result,
            summary,
        }))
    }

    async fn fetch(&self, window: &ReconciliationWindow) -> Result<Vec<RecordedPayment>, FetchError> {
        let timeout = self.config.fetch_timeout();
        match tokio::time::timeout(timeout, self.repository.find_by_date_range(window)).await {
            Ok(Ok(payments)) => Ok(payments),
            Ok(Err(e)) => {
                warn!(%window, error = %e, "Payment fetch failed");
                Err(e)
            }
            Err(_) => {
                warn!(%window, ?timeout, "Payment fetch timed out");
                Err(FetchError::Timeout(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryPaymentRepository;
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn payment(id: &str, amount: i64, d: u32) -> RecordedPayment {
        RecordedPayment::new(
            id.to_string(),
            "Ada Obi".to_string(),
            BigDecimal::from(amount),
            jan(d).and_hms_opt(8, 0, 0).unwrap(),
            PaymentMethod::Cash,
        )
    }

    struct SlowRepository;

    #[async_trait]
    impl PaymentRepository for SlowRepository {
        async fn find_by_date_range(
            &self,
            _window: &ReconciliationWindow,
        ) -> Result<Vec<RecordedPayment>, FetchError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct DownRepository;

    #[async_trait]
    impl PaymentRepository for DownRepository {
        async fn find_by_date_range(
            &self,
            _window: &ReconciliationWindow,
        ) -> Result<Vec<RecordedPayment>, FetchError> {
            Err(FetchError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_reconcile_fetches_window_only() {
        let repository = MemoryPaymentRepository::new();
        repository.insert(payment("in", 5000, 11));
        repository.insert(payment("edge", 700, 13));
        repository.insert(payment("late", 3000, 14));
        repository.insert(payment("early", 3000, 9));

        let reconciler = Reconciler::new(repository);
        let txns = vec![
            BankTransaction::new(jan(10), "a".to_string(), BigDecimal::from(5000), 2),
            BankTransaction::new(jan(12), "b".to_string(), BigDecimal::from(3000), 3),
            BankTransaction::new(jan(30), "debit".to_string(), BigDecimal::from(-100), 4),
        ];

        let outcome = reconciler.reconcile(&txns).await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.window.start, jan(10));
        assert_eq!(report.window.end, jan(13));
        assert_eq!(report.fetched, 2);
        assert_eq!(report.summary.matched_count, 1);
        assert_eq!(report.result.unmatched_recorded[0].id, "edge");
        assert_eq!(report.summary.total_unmatched_bank, BigDecimal::from(3000));
    }

    #[tokio::test]
    async fn test_nothing_to_reconcile() {
        let reconciler = Reconciler::new(DownRepository);
        let txns = vec![BankTransaction::new(jan(5), "fee refund".to_string(), BigDecimal::from(-200), 2)];

        let outcome = reconciler.reconcile(&txns).await.unwrap();
        assert_eq!(outcome, ReconciliationOutcome::NothingToReconcile);
        assert!(outcome.message().contains("nothing to reconcile"));
        assert!(outcome.into_result().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_run() {
        let reconciler = Reconciler::new(DownRepository);
        let txns = vec![BankTransaction::new(jan(5), "fees".to_string(), BigDecimal::from(200), 2)];

        match reconciler.reconcile(&txns).await {
            Err(ReconciliationError::Fetch(FetchError::Unavailable(msg))) => {
                assert_eq!(msg, "connection refused")
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout() {
        let config = ReconciliationConfig {
            fetch_timeout_secs: 5,
            ..Default::default()
        };
        let reconciler = Reconciler::with_config(SlowRepository, config).unwrap();
        let txns = vec![BankTransaction::new(jan(5), "fees".to_string(), BigDecimal::from(200), 2)];

        match reconciler.reconcile(&txns).await {
            Err(ReconciliationError::Fetch(FetchError::Timeout(d))) => {
                assert_eq!(d, Duration::from_secs(5))
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reconcile_statement_parse_error() {
        let reconciler = Reconciler::new(MemoryPaymentRepository::new());
        let result = reconciler
            .reconcile_statement(b"Description,Amount\nfees,100\n", Some("march.csv"))
            .await;
        assert!(matches!(
            result,
            Err(ReconciliationError::Parse(ParseError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ReconciliationConfig {
            fetch_timeout_secs: 0,
            ..Default::default()
        };
        assert!(Reconciler::with_config(MemoryPaymentRepository::new(), config).is_err());
    }
}
