use crate::averaging::historical_average;
use crate::config::{validate_months_ahead, EngineConfig};
use crate::error::Result;
use crate::schema::{Transaction, UnitScope};
use crate::seasonality::detect_seasonality;
use crate::transactions::TransactionSet;
use crate::trend::calculate_trend;
use crate::utils::{cutoff_date, target_month};
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Tier for the number of transactions in the confidence window.
    pub fn from_data_points(count: usize) -> Self {
        if count > 50 {
            ConfidenceTier::High
        } else if count > 20 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Safety margin added on top of a forecast when budgeting.
    pub fn safety_margin(&self) -> f64 {
        match self {
            ConfidenceTier::High => 0.10,
            ConfidenceTier::Medium => 0.15,
            ConfidenceTier::Low => 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// The scope had no transactions at all.
    NoData,
    TrendSeasonal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastResult {
    pub forecast_amount: f64,
    pub base_amount: f64,
    pub trend_percent_per_month: f64,
    pub seasonal_factor: f64,
    pub confidence_tier: ConfidenceTier,
    pub data_point_count: usize,
    pub method: ForecastMethod,
}

impl ForecastResult {
    pub fn no_data() -> Self {
        Self {
            forecast_amount: 0.0,
            base_amount: 0.0,
            trend_percent_per_month: 0.0,
            seasonal_factor: 1.0,
            confidence_tier: ConfidenceTier::Low,
            data_point_count: 0,
            method: ForecastMethod::NoData,
        }
    }
}

/// Composes base level, trend and seasonality into a point forecast.
pub struct Forecaster<'a> {
    config: &'a EngineConfig,
    today: NaiveDate,
}

impl<'a> Forecaster<'a> {
    pub fn new(config: &'a EngineConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Forecast spend `months_ahead` months from today for `scope`.
    ///
    /// Only the base level honours `category`; trend, seasonality and the
    /// confidence count always look at every transaction in the scope.
    pub fn forecast(
        &self,
        set: &TransactionSet,
        scope: &UnitScope,
        months_ahead: u32,
        category: Option<&str>,
    ) -> Result<ForecastResult> {
        validate_months_ahead(months_ahead)?;
        self.config.validate()?;

        let unit = set.scoped(scope);
        info!(
            "Forecasting {} {} months ahead for {} ({} transactions, category: {})",
            set.kind(),
            months_ahead,
            scope,
            unit.len(),
            category.unwrap_or("any")
        );

        if unit.is_empty() {
            debug!("No transactions for {}, returning no_data forecast", scope);
            return Ok(ForecastResult::no_data());
        }

        Ok(self.compose(&unit, months_ahead, category))
    }

    fn compose(&self, unit: &[&Transaction], months_ahead: u32, category: Option<&str>) -> ForecastResult {
        let base = historical_average(
            unit.iter().copied(),
            self.config.average_window_months,
            category,
            self.today,
        );

        let trend = calculate_trend(unit.iter().copied(), self.config.trend_window_months);
        let trend_adjustment = (trend / 100.0) * f64::from(months_ahead);

        let profile = detect_seasonality(unit.iter().copied());
        let month = target_month(self.today.month(), months_ahead);
        let seasonal_factor = profile.factor_for(month);

        let forecast = base * (1.0 + trend_adjustment) * seasonal_factor;

        let confidence_cutoff = cutoff_date(self.today, u64::from(self.config.confidence_window_days));
        let data_points = unit.iter().filter(|t| t.date >= confidence_cutoff).count();
        let tier = ConfidenceTier::from_data_points(data_points);

        debug!(
            "base={:.2} trend={:.2}%/month target_month={} seasonal_factor={:.3} data_points={} -> {:.2}",
            base, trend, month, seasonal_factor, data_points, forecast
        );

        ForecastResult {
            forecast_amount: forecast,
            base_amount: base,
            trend_percent_per_month: trend,
            seasonal_factor,
            confidence_tier: tier,
            data_point_count: data_points,
            method: ForecastMethod::TrendSeasonal,
        }
    }
}
