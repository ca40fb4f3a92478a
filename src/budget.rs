use crate::error::Result;
use crate::forecast::{ConfidenceTier, Forecaster};
use crate::schema::UnitScope;
use crate::transactions::TransactionSet;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetRecommendation {
    pub forecast: f64,
    pub recommended_budget: f64,
    pub margin_percent: f64,
    pub confidence_tier: ConfidenceTier,
}

impl BudgetRecommendation {
    pub fn from_forecast(forecast: f64, tier: ConfidenceTier) -> Self {
        let margin = tier.safety_margin();
        Self {
            forecast,
            recommended_budget: forecast * (1.0 + margin),
            margin_percent: margin * 100.0,
            confidence_tier: tier,
        }
    }
}

/// Next-month budget ceilings per category.
pub struct BudgetRecommender<'a> {
    forecaster: &'a Forecaster<'a>,
}

impl<'a> BudgetRecommender<'a> {
    pub fn new(forecaster: &'a Forecaster<'a>) -> Self {
        Self { forecaster }
    }

    pub fn recommend<S: AsRef<str>>(
        &self,
        set: &TransactionSet,
        scope: &UnitScope,
        categories: &[S],
    ) -> Result<BTreeMap<String, BudgetRecommendation>> {
        info!(
            "Recommending budgets for {} categories in {}",
            categories.len(),
            scope
        );

        let mut recommendations = BTreeMap::new();
        for category in categories {
            let category = category.as_ref();
            let forecast = self.forecaster.forecast(set, scope, 1, Some(category))?;
            let recommendation =
                BudgetRecommendation::from_forecast(forecast.forecast_amount, forecast.confidence_tier);

            debug!(
                "{}: forecast {:.2}, budget {:.2} ({:.0}% margin)",
                category,
                recommendation.forecast,
                recommendation.recommended_budget,
                recommendation.margin_percent
            );
            recommendations.insert(category.to_string(), recommendation);
        }

        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::schema::{Transaction, TransactionKind, EXPENSE_CATEGORIES};
    use chrono::NaiveDate;

    #[test]
    fn test_margin_is_monotonic_with_confidence() {
        let low = BudgetRecommendation::from_forecast(1000.0, ConfidenceTier::Low);
        let medium = BudgetRecommendation::from_forecast(1000.0, ConfidenceTier::Medium);
        let high = BudgetRecommendation::from_forecast(1000.0, ConfidenceTier::High);

        assert!(low.margin_percent >= medium.margin_percent);
        assert!(medium.margin_percent >= high.margin_percent);
        assert!(low.recommended_budget >= medium.recommended_budget);
        assert!(medium.recommended_budget >= high.recommended_budget);

        assert!((low.recommended_budget - 1200.0).abs() < 1e-9);
        assert!((medium.recommended_budget - 1150.0).abs() < 1e-9);
        assert!((high.recommended_budget - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommend_per_category() {
        let config = EngineConfig::default();
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let forecaster = Forecaster::new(&config, today);
        let recommender = BudgetRecommender::new(&forecaster);

        let rent = |m: u32| {
            Transaction::new(
                NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                300.0,
                "Lokalhyra",
                "Hyresvärd AB",
            )
            .with_business_unit("Unithread")
        };
        let set = TransactionSet::from_transactions(
            TransactionKind::Expense,
            vec![rent(1), rent(2), rent(3)],
        );

        let budgets = recommender
            .recommend(&set, &UnitScope::unit("Unithread"), EXPENSE_CATEGORIES)
            .unwrap();
        assert_eq!(budgets.len(), EXPENSE_CATEGORIES.len());

        let lokal = &budgets["Lokalhyra"];
        assert!((lokal.forecast - 300.0).abs() < 1e-9);
        assert!((lokal.recommended_budget - 360.0).abs() < 1e-9);
        assert_eq!(lokal.confidence_tier, ConfidenceTier::Low);

        let marketing = &budgets["Marknadsföring"];
        assert_eq!(marketing.forecast, 0.0);
        assert_eq!(marketing.recommended_budget, 0.0);
        assert!((marketing.margin_percent - 20.0).abs() < 1e-9);
    }
}
