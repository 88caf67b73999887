//! Greedy amount-and-date matching of statement credits against recorded payments

use tracing::{debug, instrument};

use crate::config::{ReconciliationConfig, TieBreakPolicy};
use crate::types::*;

/// Pairs bank credits with recorded payments.
///
/// A payment qualifies for a credit when the amounts are exactly equal and the
/// calendar days differ by no more than the tolerance. Credits are visited in
/// statement order; each payment can settle at most one credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcher {
    date_tolerance_days: u32,
    tie_break: TieBreakPolicy,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::from_config(&ReconciliationConfig::default())
    }
}

impl Matcher {
    /// Create a matcher with an explicit tolerance and tie-break policy
    pub fn new(date_tolerance_days: u32, tie_break: TieBreakPolicy) -> Self {
        Self {
            date_tolerance_days,
            tie_break,
        }
    }

    pub fn from_config(config: &ReconciliationConfig) -> Self {
        Self::new(config.date_tolerance_days, config.tie_break)
    }

    /// Credits only; debits are never reconciled
    pub fn credits(transactions: &[BankTransaction]) -> Vec<BankTransaction> {
        transactions.iter().filter(|t| t.is_credit()).cloned().collect()
    }

    /// Partition `transactions` and `payments` into matched and unmatched sets.
    ///
    /// Non-positive transactions are dropped before matching and appear in no
    /// partition. Unmatched payments keep their fetch order.
    #[instrument(
        name = "match_payments",
        skip_all,
        fields(transactions = transactions.len(), payments = payments.len())
    )]
    pub fn match_payments(
        &self,
        transactions: &[BankTransaction],
        payments: Vec<RecordedPayment>,
    ) -> ReconciliationResult {
        let mut working = payments;
        let mut result = ReconciliationResult::default();

        for transaction in transactions.iter().filter(|t| t.is_credit()) {
            match self.select(transaction, &working) {
                Some((index, day_offset)) => {
                    let payment = working.remove(index);
                    debug!(
                        row = transaction.source_row,
                        payment_id = %payment.id,
                        day_offset,
                        "Matched bank credit"
                    );
                    result.matched.push(MatchedPair {
                        bank_transaction: transaction.clone(),
                        recorded_payment: payment,
                        day_offset,
                    });
                }
                None => result.unmatched_bank.push(transaction.clone()),
            }
        }

        result.unmatched_recorded = working;
        result
    }

    /// Index into `working` of the chosen payment and its day offset
    fn select(&self, transaction: &BankTransaction, working: &[RecordedPayment]) -> Option<(usize, i64)> {
        let mut eligible = working.iter().enumerate().filter_map(|(index, payment)| {
            if payment.amount_paid != transaction.amount {
                return None;
            }
            let day_offset = (transaction.date - payment.payment_day()).num_days();
            (day_offset.unsigned_abs() <= u64::from(self.date_tolerance_days))
                .then_some((index, day_offset))
        });

        match self.tie_break {
            TieBreakPolicy::FirstEligible => eligible.next(),
            TieBreakPolicy::ClosestDate => {
                eligible.min_by_key(|(index, day_offset)| (day_offset.unsigned_abs(), *index))
            }
        }
    }
}
