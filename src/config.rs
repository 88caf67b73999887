//! Reconciliation settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{ReconcileResult, ReconciliationError};

/// How to choose between several recorded payments that all qualify for the
/// same bank transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// First eligible payment in fetch order
    #[default]
    FirstEligible,
    /// Smallest day offset; equal offsets fall back to fetch order
    ClosestDate,
}

/// Date layouts accepted when reading statement text cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// `chrono` formats for date-only cells, tried in order
    pub date_formats: Vec<String>,
    /// `chrono` formats for cells carrying a time of day, tried before `date_formats`
    pub datetime_formats: Vec<String>,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            date_formats: ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d %b %Y"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
            datetime_formats: ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// Settings for one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Maximum calendar days between a bank credit and its recorded payment
    pub date_tolerance_days: u32,
    /// Days added after the latest credit when fetching payments
    pub window_buffer_days: u32,
    /// Upper bound on the payment fetch
    pub fetch_timeout_secs: u64,
    pub tie_break: TieBreakPolicy,
    pub statement: StatementConfig,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            date_tolerance_days: 2,
            window_buffer_days: 1,
            fetch_timeout_secs: 30,
            tie_break: TieBreakPolicy::FirstEligible,
            statement: StatementConfig::default(),
        }
    }
}

impl ReconciliationConfig {
    /// Parse settings from TOML; missing keys keep their defaults
    pub fn from_toml_str(input: &str) -> ReconcileResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| ReconciliationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(ReconciliationError::Config(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.statement.date_formats.is_empty() {
            return Err(ReconciliationError::Config(
                "statement.date_formats cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
