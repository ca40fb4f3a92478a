use crate::error::{EngineError, Result};
use crate::schema::TransactionKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[schemars(
        description = "Exact match: same date, same amount and byte-identical counterparty (revenue also requires the same business unit)."
    )]
    Strict,

    #[schemars(
        description = "Tolerant match: dates within the configured day tolerance, amounts closer than the amount tolerance, counterparty equal ignoring case."
    )]
    Fuzzy,
}

impl FromStr for MatchPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" | "exact" => Ok(MatchPolicy::Strict),
            "fuzzy" | "tolerant" => Ok(MatchPolicy::Fuzzy),
            other => Err(EngineError::InvalidConfiguration(format!(
                "unknown match policy '{}', expected 'strict' or 'fuzzy'",
                other
            ))),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Strict => write!(f, "strict"),
            MatchPolicy::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// Every tunable of the engine. Nothing is read from globals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(description = "Trailing window, in 30-day months, for the base spend average.")]
    pub average_window_months: u32,

    #[schemars(description = "Number of most recent calendar months used for the month-over-month trend.")]
    pub trend_window_months: u32,

    #[schemars(description = "Trailing window in days whose transaction count drives the confidence tier.")]
    pub confidence_window_days: u32,

    pub match_policy: MatchPolicy,

    #[schemars(description = "Maximum distance in days between two fuzzy duplicates.")]
    pub date_tolerance_days: u32,

    #[schemars(description = "Fuzzy duplicates must differ by strictly less than this amount.")]
    pub amount_tolerance: f64,

    #[schemars(description = "When true, transactions from different business units are never flagged as duplicates.")]
    pub scope_by_business_unit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            average_window_months: 3,
            trend_window_months: 6,
            confidence_window_days: 180,
            match_policy: MatchPolicy::Fuzzy,
            date_tolerance_days: 2,
            amount_tolerance: 0.01,
            scope_by_business_unit: true,
        }
    }
}

impl EngineConfig {
    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    pub fn with_business_unit_scope(mut self, scoped: bool) -> Self {
        self.scope_by_business_unit = scoped;
        self
    }

    /// Scoping used by the bookkeeping app this engine replaces: expense
    /// duplicates are always unit-scoped, fuzzy revenue duplicates are
    /// searched across units.
    // TODO: drop once the owners decide whether cross-unit revenue matches are wanted.
    pub fn legacy_scope(mut self, kind: TransactionKind) -> Self {
        self.scope_by_business_unit =
            !(kind == TransactionKind::Revenue && self.match_policy == MatchPolicy::Fuzzy);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.average_window_months == 0 {
            return Err(EngineError::InvalidConfiguration(
                "average_window_months must be at least 1".to_string(),
            ));
        }
        if self.trend_window_months < 2 {
            return Err(EngineError::InvalidConfiguration(format!(
                "trend_window_months must be at least 2 (got {})",
                self.trend_window_months
            )));
        }
        if self.confidence_window_days == 0 {
            return Err(EngineError::InvalidConfiguration(
                "confidence_window_days must be at least 1".to_string(),
            ));
        }
        if !self.amount_tolerance.is_finite() || self.amount_tolerance < 0.0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "amount_tolerance must be a non-negative number (got {})",
                self.amount_tolerance
            )));
        }
        Ok(())
    }

    /// Parses a JSON configuration. The match policy goes through
    /// [`MatchPolicy::from_str`] so an unknown policy is a configuration error.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(policy) = value.get_mut("match_policy") {
            let parsed = match policy.as_str() {
                Some(name) => name.parse::<MatchPolicy>()?,
                None => {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "match_policy must be a string (got {})",
                        policy
                    )))
                }
            };
            *policy = serde_json::to_value(parsed)?;
        }
        let config: EngineConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Rejects a forecast horizon outside 1..=12 months.
pub fn validate_months_ahead(months_ahead: u32) -> Result<()> {
    if !(1..=12).contains(&months_ahead) {
        return Err(EngineError::InvalidConfiguration(format!(
            "months_ahead must be between 1 and 12 (got {})",
            months_ahead
        )));
    }
    Ok(())
}
