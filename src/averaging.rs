use crate::schema::Transaction;
use crate::utils::window_start;
use chrono::NaiveDate;

/// Average spend per month over the trailing `window_months` (30-day months).
///
/// The sum of matching amounts is divided by the window length, not by the
/// number of matching transactions, so the result is an amount per month.
/// Returns `0.0` when nothing matches or the window is empty.
pub fn historical_average<'a, I>(
    transactions: I,
    window_months: u32,
    category: Option<&str>,
    today: NaiveDate,
) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    if window_months == 0 {
        return 0.0;
    }

    let cutoff = window_start(today, window_months);

    let total: f64 = transactions
        .into_iter()
        .filter(|t| t.date >= cutoff)
        .filter(|t| category.map_or(true, |c| t.category == c))
        .map(|t| t.amount)
        .sum();

    total / f64::from(window_months)
}
