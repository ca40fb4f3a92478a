use crate::schema::Transaction;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seasonal index per calendar month (1..=12), in percent deviation from
/// the overall per-transaction average. Months without data are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalProfile {
    indices: BTreeMap<u32, f64>,
}

impl SeasonalProfile {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Index for `month`, `0.0` when the month has no data.
    pub fn index_for(&self, month: u32) -> f64 {
        self.indices.get(&month).copied().unwrap_or(0.0)
    }

    /// Multiplier applied to a forecast landing in `month`.
    pub fn factor_for(&self, month: u32) -> f64 {
        1.0 + self.index_for(month) / 100.0
    }

    pub fn indices(&self) -> &BTreeMap<u32, f64> {
        &self.indices
    }
}

/// Builds the seasonal profile from the full history, ignoring the year.
pub fn detect_seasonality<'a, I>(transactions: I) -> SeasonalProfile
where
    I: IntoIterator<Item = &'a Transaction>,
{
    // month -> (sum, count)
    let mut stats: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for t in transactions {
        let entry = stats.entry(t.date.month()).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    if stats.is_empty() {
        return SeasonalProfile::default();
    }

    let total: f64 = stats.values().map(|(sum, _)| sum).sum();
    let count: usize = stats.values().map(|(_, n)| n).sum();
    let overall_avg = total / count as f64;

    let indices = stats
        .into_iter()
        .map(|(month, (sum, n))| {
            let month_avg = sum / n as f64;
            let index = if overall_avg > 0.0 {
                (month_avg - overall_avg) / overall_avg * 100.0
            } else {
                0.0
            };
            (month, index)
        })
        .collect();

    SeasonalProfile { indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(y: i32, m: u32, amount: f64) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(y, m, 10).unwrap(),
            amount,
            "Lokalhyra",
            "Hyresvärd",
        )
    }

    #[test]
    fn test_empty_profile() {
        let none: Vec<Transaction> = Vec::new();
        let profile = detect_seasonality(&none);
        assert!(profile.is_empty());
        assert_eq!(profile.index_for(7), 0.0);
        assert_eq!(profile.factor_for(7), 1.0);
    }

    #[test]
    fn test_july_peak() {
        let data: Vec<Transaction> = (1..=12)
            .map(|m| tx(2023, m, if m == 7 { 110.0 } else { 70.0 }))
            .collect();
        let profile = detect_seasonality(&data);

        assert_eq!(profile.len(), 12);
        assert!((profile.index_for(7) - 50.0).abs() < 1e-9);
        assert!((profile.factor_for(7) - 1.5).abs() < 1e-9);
        assert!(profile.index_for(1) < 0.0);
    }

    #[test]
    fn test_years_are_pooled_and_missing_months_absent() {
        let data = vec![tx(2022, 3, 100.0), tx(2023, 3, 300.0), tx(2023, 4, 200.0)];
        let profile = detect_seasonality(&data);

        // overall average 200, March average 200, April average 200
        assert!(profile.index_for(3).abs() < 1e-9);
        assert!(profile.index_for(4).abs() < 1e-9);
        assert!(!profile.indices().contains_key(&5));
        assert_eq!(profile.index_for(5), 0.0);
    }

    #[test]
    fn test_zero_overall_average_is_guarded() {
        let data = vec![tx(2023, 1, 0.0), tx(2023, 2, 0.0)];
        let profile = detect_seasonality(&data);
        assert_eq!(profile.index_for(1), 0.0);
        assert_eq!(profile.index_for(2), 0.0);
        assert_eq!(profile.len(), 2);
    }
}
