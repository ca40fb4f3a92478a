use crate::error::Result;
use crate::schema::Transaction;
use crate::transactions::TransactionSet;
use crate::utils::{month_bounds, parse_month};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMonthSummary {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub profit: f64,
    /// Profit as a percentage of revenue, `0` without revenue.
    pub margin_percent: f64,
    /// Expense totals per category, only categories with spend.
    pub category_breakdown: BTreeMap<String, f64>,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    /// `YYYY-MM`
    pub period: String,
    pub units: BTreeMap<String, UnitMonthSummary>,
}

/// Per-unit income statement for one calendar month (`YYYY-MM`).
pub fn monthly_report<S: AsRef<str>>(
    expenses: &TransactionSet,
    revenue: &TransactionSet,
    month: &str,
    units: &[S],
) -> Result<MonthlyReport> {
    let (year, month_number) = parse_month(month)?;
    let (start, end) = month_bounds(year, month_number)?;
    let in_month = |t: &&Transaction| t.date >= start && t.date <= end;

    let mut summaries = BTreeMap::new();
    for unit in units {
        let unit = unit.as_ref();
        let belongs = |t: &&Transaction| t.business_unit.as_deref() == Some(unit);

        let month_expenses: Vec<&Transaction> =
            expenses.iter().filter(in_month).filter(belongs).collect();
        let month_revenue: Vec<&Transaction> =
            revenue.iter().filter(in_month).filter(belongs).collect();

        let total_expenses: f64 = month_expenses.iter().map(|t| t.amount).sum();
        let total_revenue: f64 = month_revenue.iter().map(|t| t.amount).sum();
        let profit = total_revenue - total_expenses;
        let margin_percent = if total_revenue > 0.0 {
            profit / total_revenue * 100.0
        } else {
            0.0
        };

        let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();
        for t in &month_expenses {
            *category_breakdown.entry(t.category.clone()).or_default() += t.amount;
        }
        category_breakdown.retain(|_, total| *total > 0.0);

        debug!(
            "{} {}: revenue {:.2}, expenses {:.2}",
            unit, month, total_revenue, total_expenses
        );

        summaries.insert(
            unit.to_string(),
            UnitMonthSummary {
                total_revenue,
                total_expenses,
                profit,
                margin_percent,
                category_breakdown,
                transaction_count: month_expenses.len() + month_revenue.len(),
            },
        );
    }

    Ok(MonthlyReport {
        period: format!("{:04}-{:02}", year, month_number),
        units: summaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::schema::TransactionKind;
    use chrono::NaiveDate;

    fn tx(m: u32, d: u32, amount: f64, category: &str, unit: &str) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, m, d).unwrap(),
            amount,
            category,
            "Motpart",
        )
        .with_business_unit(unit)
    }

    #[test]
    fn test_monthly_report() {
        let expenses = TransactionSet::from_transactions(
            TransactionKind::Expense,
            vec![
                tx(2, 1, 300.0, "Lokalhyra", "Unithread"),
                tx(2, 29, 100.0, "Marknadsföring", "Unithread"),
                tx(2, 10, 0.0, "Övrigt", "Unithread"),
                tx(3, 1, 999.0, "Lokalhyra", "Unithread"),
                tx(2, 5, 50.0, "Lokalhyra", "Merchoteket"),
            ],
        );
        let revenue = TransactionSet::from_transactions(
            TransactionKind::Revenue,
            vec![
                tx(2, 15, 1000.0, "Tjänster", "Unithread"),
                tx(2, 16, 500.0, "Tjänster", "Merchoteket"),
            ],
        );

        let report =
            monthly_report(&expenses, &revenue, "2024-02", &["Unithread", "Merchoteket"]).unwrap();
        assert_eq!(report.period, "2024-02");

        let unithread = &report.units["Unithread"];
        assert!((unithread.total_expenses - 400.0).abs() < 1e-9);
        assert!((unithread.total_revenue - 1000.0).abs() < 1e-9);
        assert!((unithread.profit - 600.0).abs() < 1e-9);
        assert!((unithread.margin_percent - 60.0).abs() < 1e-9);
        assert_eq!(unithread.category_breakdown.len(), 2);
        assert_eq!(unithread.transaction_count, 4);

        let merch = &report.units["Merchoteket"];
        assert!((merch.profit - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_without_revenue_has_zero_margin() {
        let expenses = TransactionSet::from_transactions(
            TransactionKind::Expense,
            vec![tx(1, 3, 80.0, "Bank & Avgifter", "Unithread")],
        );
        let revenue = TransactionSet::new(TransactionKind::Revenue);

        let report = monthly_report(&expenses, &revenue, "2024-01", &["Unithread"]).unwrap();
        let summary = &report.units["Unithread"];
        assert!((summary.profit + 80.0).abs() < 1e-9);
        assert_eq!(summary.margin_percent, 0.0);
    }

    #[test]
    fn test_bad_month() {
        let empty = TransactionSet::new(TransactionKind::Expense);
        let err = monthly_report(&empty, &empty, "januari", &["Unithread"]).unwrap_err();
        assert!(matches!(err, EngineError::DateError(_)));
    }
}
