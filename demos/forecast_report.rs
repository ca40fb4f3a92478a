use anyhow::Result;
use chrono::NaiveDate;
use ledger_forecast::*;

const EXPENSES: &str = r#"{
    "Unithread": {
        "utgifter": [
            {"datum": "2024-01-08", "belopp": 4200, "kategori": "Varuinköp", "leverantor": "Tygfabriken"},
            {"datum": "2024-01-15", "belopp": 650, "kategori": "Marknadsföring", "leverantor": "Meta"},
            {"datum": "2024-02-08", "belopp": 4500, "kategori": "Varuinköp", "leverantor": "Tygfabriken"},
            {"datum": "2024-02-09", "belopp": 4500, "kategori": "Varuinköp", "leverantor": "tygfabriken"},
            {"datum": "2024-02-15", "belopp": 700, "kategori": "Marknadsföring", "leverantor": "Meta"},
            {"datum": "2024-03-08", "belopp": 4900, "kategori": "Varuinköp", "leverantor": "Tygfabriken"},
            {"datum": "2024-03-15", "belopp": 720, "kategori": "Marknadsföring", "leverantor": "Meta"},
            {"datum": "2024-03-31", "belopp": 8000, "kategori": "Lokalhyra", "leverantor": "Hyresvärd AB"}
        ],
        "total": 0
    },
    "Merchoteket": {
        "utgifter": [
            {"datum": "2024-02-20", "belopp": 1200, "kategori": "IT & Programvara", "leverantor": "Shopify"},
            {"datum": "2024-03-20", "belopp": "tolvhundra", "kategori": "IT & Programvara", "leverantor": "Shopify"}
        ],
        "total": 0
    }
}"#;

const REVENUE: &str = r#"{
    "intakter": [
        {"datum": "2024-03-05", "belopp": 18000, "kategori": "Produktförsäljning", "kund": "Webbshop", "verksamhet": "Unithread"},
        {"datum": "2024-03-22", "belopp": 3500, "kategori": "Tjänster", "kund": "Kund AB", "verksamhet": "Merchoteket"}
    ],
    "total": 0
}"#;

fn main() -> Result<()> {
    println!("📒 Ledger forecast demo\n");

    let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    let engine = BookkeepingEngine::with_clock(EngineConfig::default(), FixedClock::new(today))?;

    let report = parse_expense_ledger(EXPENSES)?;
    for problem in &report.rejected {
        println!("⚠️  {}", problem);
    }
    let mut expenses = report.transactions;
    let revenue = parse_revenue_ledger(REVENUE)?.transactions;

    let units: Vec<String> = expenses.business_units().into_iter().collect();
    println!("Units: {}\n", units.join(", "));

    let unit = UnitScope::unit("Unithread");
    let forecast = engine.forecast(&expenses, &unit, 1, None)?;
    println!("Next month for Unithread:");
    println!("  forecast:        {:>10.2}", forecast.forecast_amount);
    println!("  base (3 months): {:>10.2}", forecast.base_amount);
    println!("  trend:           {:>+9.1}%/month", forecast.trend_percent_per_month);
    println!("  seasonal factor: {:>10.2}", forecast.seasonal_factor);
    println!(
        "  confidence:      {:?} ({} data points)\n",
        forecast.confidence_tier, forecast.data_point_count
    );

    println!("Budget recommendations:");
    for (category, budget) in engine.recommend_budget(&expenses, &unit, EXPENSE_CATEGORIES)? {
        if budget.forecast > 0.0 {
            println!(
                "  {:<22} {:>10.2} -> {:>10.2} (+{:.0}%)",
                category, budget.forecast, budget.recommended_budget, budget.margin_percent
            );
        }
    }

    let candidates = engine.find_duplicates(&expenses)?;
    println!("\nDuplicate candidates: {}", candidates.len());
    for candidate in &candidates {
        println!(
            "  #{} {}  ~  #{} {}",
            candidate.original_index,
            candidate.original.label(),
            candidate.duplicate_index,
            candidate.duplicate.label()
        );
    }

    let removal = remove_duplicate_batch(&mut expenses, &candidates, KeepSide::Original)?;
    println!(
        "Removed {} duplicates, expense total now {:.2}\n",
        removal.removed.len(),
        removal.total
    );

    let month = monthly_report(&expenses, &revenue, "2024-03", units.as_slice())?;
    println!("Report {}:", month.period);
    for (name, summary) in &month.units {
        println!(
            "  {:<12} revenue {:>10.2}  expenses {:>10.2}  profit {:>10.2}  margin {:>6.1}%",
            name,
            summary.total_revenue,
            summary.total_expenses,
            summary.profit,
            summary.margin_percent
        );
    }

    println!("\n{}", render_expense_ledger(&expenses, &["Unithread", "Merchoteket"])?);

    Ok(())
}
