//! Runtime settings loaded from environment variables.
//!
//! The commission rate and monthly-contribution default are external inputs to
//! the ledger core. They are read once at startup into an [`AppConfig`] and
//! threaded into the components that need them; nothing in `core` consults the
//! process environment at call time.

use crate::errors::{Error, Result};

/// Commission rate applied to total approved contributions (2%)
pub const DEFAULT_COMMISSION_RATE: f64 = 0.02;

/// Default monthly contribution for newly created groups
pub const DEFAULT_MONTHLY_CONTRIBUTION: i64 = 10;

/// Default sweep period: every 5 minutes
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Application-wide runtime settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Fraction of total approved contributions withheld as commission
    pub commission_rate: f64,
    /// Monthly contribution used when a seed group does not specify one
    pub monthly_contribution: i64,
    /// How often the recurring-contribution sweep runs
    pub sweep_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            commission_rate: DEFAULT_COMMISSION_RATE,
            monthly_contribution: DEFAULT_MONTHLY_CONTRIBUTION,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl AppConfig {
    /// Loads settings from the environment, falling back to defaults for
    /// unset variables. A present-but-malformed value is a configuration
    /// error, never a silent fallback.
    ///
    /// Recognized variables: `TAKAFUL_COMMISSION_RATE`,
    /// `TAKAFUL_MONTHLY_CONTRIBUTION`, `TAKAFUL_SWEEP_INTERVAL_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("TAKAFUL_COMMISSION_RATE") {
            config.commission_rate = raw.parse().map_err(|_| Error::Config {
                message: format!("invalid TAKAFUL_COMMISSION_RATE: '{raw}'"),
            })?;
        }
        if !(0.0..1.0).contains(&config.commission_rate) {
            return Err(Error::Config {
                message: format!(
                    "commission rate must be in [0, 1), got {}",
                    config.commission_rate
                ),
            });
        }

        if let Ok(raw) = std::env::var("TAKAFUL_MONTHLY_CONTRIBUTION") {
            config.monthly_contribution = raw.parse().map_err(|_| Error::Config {
                message: format!("invalid TAKAFUL_MONTHLY_CONTRIBUTION: '{raw}'"),
            })?;
        }
        if config.monthly_contribution <= 0 {
            return Err(Error::Config {
                message: format!(
                    "monthly contribution must be positive, got {}",
                    config.monthly_contribution
                ),
            });
        }

        if let Ok(raw) = std::env::var("TAKAFUL_SWEEP_INTERVAL_SECS") {
            config.sweep_interval_secs = raw.parse().map_err(|_| Error::Config {
                message: format!("invalid TAKAFUL_SWEEP_INTERVAL_SECS: '{raw}'"),
            })?;
        }

        Ok(config)
    }
}
