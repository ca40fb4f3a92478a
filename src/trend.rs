use crate::schema::Transaction;
use crate::utils::month_key;
use std::collections::BTreeMap;

/// Sums amounts per `(year, month)`, ordered chronologically.
pub fn monthly_totals<'a, I>(transactions: I) -> BTreeMap<(i32, u32), f64>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for t in transactions {
        *totals.entry(month_key(t.date)).or_default() += t.amount;
    }
    totals
}

/// Average month-over-month change in percent over the last `window_months`
/// months that have transactions.
///
/// Steps whose previous month total is zero contribute no data point.
/// Returns `0.0` with fewer than two months or no usable step.
pub fn calculate_trend<'a, I>(transactions: I, window_months: u32) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let totals = monthly_totals(transactions);
    if totals.len() < 2 {
        return 0.0;
    }

    let skip = totals.len().saturating_sub(window_months as usize);
    let values: Vec<f64> = totals.values().skip(skip).copied().collect();

    let changes: Vec<f64> = values
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0] * 100.0)
        .collect();

    if changes.is_empty() {
        return 0.0;
    }

    changes.iter().sum::<f64>() / changes.len() as f64
}
