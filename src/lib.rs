//! # Ledger Forecast
//!
//! Forecasting and reconciliation over in-memory bookkeeping transactions.
//!
//! ## Core Concepts
//!
//! - **Transaction set**: typed expense or revenue records tagged with a business unit
//! - **Forecast**: trailing 3-month base level x month-over-month trend x seasonal index,
//!   with a confidence tier from the number of recent transactions
//! - **Budget recommendation**: next-month forecast plus a confidence-scaled safety margin
//! - **Duplicate detection**: strict or fuzzy pairwise matching, optionally scoped per unit
//! - **Reconciliation**: removal of the chosen side of each duplicate, totals re-derived by summation
//!
//! Business units are never pooled unless [`UnitScope::All`] is asked for.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_forecast::*;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
//! let engine = BookkeepingEngine::with_clock(EngineConfig::default(), FixedClock::new(today)).unwrap();
//!
//! let expenses = parse_expense_ledger(&std::fs::read_to_string("utgifter.json")?)?.transactions;
//! let forecast = engine.forecast(&expenses, &UnitScope::unit("Unithread"), 1, None)?;
//! println!("{:.2} ({:?})", forecast.forecast_amount, forecast.confidence_tier);
//! ```

pub mod averaging;
pub mod budget;
pub mod clock;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod forecast;
pub mod ingestion;
pub mod reconcile;
pub mod report;
pub mod repository;
pub mod schema;
pub mod seasonality;
pub mod transactions;
pub mod trend;
pub mod utils;

pub use averaging::historical_average;
pub use budget::{BudgetRecommendation, BudgetRecommender};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, MatchPolicy};
pub use duplicates::{DuplicateCandidate, DuplicateDetector, DuplicateScan};
pub use error::{EngineError, Result};
pub use forecast::{ConfidenceTier, ForecastMethod, ForecastResult, Forecaster};
pub use ingestion::*;
pub use reconcile::{
    remove_duplicate_batch, remove_transaction, resolve_candidate, KeepSide, Removal, Resolution,
};
pub use report::{monthly_report, MonthlyReport, UnitMonthSummary};
pub use repository::{InMemoryRepository, TransactionRepository};
pub use schema::*;
pub use seasonality::{detect_seasonality, SeasonalProfile};
pub use transactions::TransactionSet;
pub use trend::{calculate_trend, monthly_totals};

use log::info;
use std::collections::BTreeMap;

/// Entry point bundling a validated configuration with a clock.
///
/// Holds no transaction state between calls.
pub struct BookkeepingEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    clock: C,
}

impl BookkeepingEngine<SystemClock> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> BookkeepingEngine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn forecast(
        &self,
        set: &TransactionSet,
        scope: &UnitScope,
        months_ahead: u32,
        category: Option<&str>,
    ) -> Result<ForecastResult> {
        Forecaster::new(&self.config, self.clock.today()).forecast(set, scope, months_ahead, category)
    }

    pub fn recommend_budget<S: AsRef<str>>(
        &self,
        set: &TransactionSet,
        scope: &UnitScope,
        categories: &[S],
    ) -> Result<BTreeMap<String, BudgetRecommendation>> {
        let forecaster = Forecaster::new(&self.config, self.clock.today());
        BudgetRecommender::new(&forecaster).recommend(set, scope, categories)
    }

    pub fn find_duplicates(&self, set: &TransactionSet) -> Result<Vec<DuplicateCandidate>> {
        Ok(DuplicateDetector::new(&self.config)?.find_duplicates(set))
    }

    pub fn scan_records(
        &self,
        kind: TransactionKind,
        records: &[RawTransactionRecord],
    ) -> Result<DuplicateScan> {
        Ok(DuplicateDetector::new(&self.config)?.scan_records(kind, records))
    }

    /// Loads one kind from `repository`, removes every detected duplicate
    /// keeping `keep`, and saves the result back.
    pub fn deduplicate<R: TransactionRepository + ?Sized>(
        &self,
        repository: &mut R,
        kind: TransactionKind,
        keep: KeepSide,
    ) -> Result<Removal> {
        let mut set = repository.load_transactions(kind)?;
        let candidates = self.find_duplicates(&set)?;
        let removal = remove_duplicate_batch(&mut set, &candidates, keep)?;

        if !removal.removed.is_empty() {
            repository.save_transactions(kind, &set)?;
        }
        info!(
            "Deduplicated {} ledger: {} candidates, {} removed",
            kind,
            candidates.len(),
            removal.removed.len()
        );
        Ok(removal)
    }
}
