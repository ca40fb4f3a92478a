use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Varuinköp",
    "Marknadsföring",
    "IT & Programvara",
    "Lokalhyra",
    "Transport & Logistik",
    "Design & Produktion",
    "Juridik & Konsulter",
    "Bank & Avgifter",
    "Övrigt",
];

pub const REVENUE_CATEGORIES: &[&str] = &["Produktförsäljning", "Tjänster", "Konsultarvode", "Övrigt"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[schemars(description = "Money paid to a supplier. The counterparty is the supplier name.")]
    Expense,

    #[schemars(description = "Money received from a customer. The counterparty is the customer name.")]
    Revenue,
}

impl TransactionKind {
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            TransactionKind::Expense => EXPENSE_CATEGORIES,
            TransactionKind::Revenue => REVENUE_CATEGORIES,
        }
    }

    /// Whether `category` belongs to the fixed set for this kind.
    /// Free-text categories are tolerated elsewhere; this is only a helper.
    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories().contains(&category)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Expense => write!(f, "expense"),
            TransactionKind::Revenue => write!(f, "revenue"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Transaction {
    #[schemars(description = "Booking date, day resolution (YYYY-MM-DD).")]
    pub date: NaiveDate,

    #[schemars(description = "Non-negative monetary amount. No currency is attached.")]
    pub amount: f64,

    #[schemars(description = "Category label, normally one of the fixed expense or revenue categories.")]
    pub category: String,

    #[schemars(description = "Supplier (expenses) or customer (revenue) name.")]
    pub counterparty: String,

    #[serde(default)]
    #[schemars(description = "Business unit the transaction belongs to. Units are never pooled unless all units are requested.")]
    pub business_unit: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Amounts are finite and non-negative; the kind carries the sign.
pub fn check_amount(amount: f64) -> std::result::Result<f64, String> {
    if !amount.is_finite() {
        return Err(format!("amount {} is not finite", amount));
    }
    if amount < 0.0 {
        return Err(format!("amount {} is negative", amount));
    }
    Ok(amount)
}

impl Transaction {
    /// Builds a transaction without validating `amount`. Use
    /// [`Transaction::try_new`] for values that did not come from a
    /// validated source.
    pub fn new(
        date: NaiveDate,
        amount: f64,
        category: impl Into<String>,
        counterparty: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
            counterparty: counterparty.into(),
            business_unit: None,
            description: None,
        }
    }

    /// Like [`Transaction::new`], but rejects negative and non-finite amounts.
    pub fn try_new(
        date: NaiveDate,
        amount: f64,
        category: impl Into<String>,
        counterparty: impl Into<String>,
    ) -> Result<Self> {
        let transaction = Self::new(date, amount, category, counterparty);
        check_amount(amount).map_err(|reason| EngineError::MalformedRecord {
            record: transaction.label(),
            reason,
        })?;
        Ok(transaction)
    }

    pub fn with_business_unit(mut self, unit: impl Into<String>) -> Self {
        self.business_unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Short human readable identity used in logs and error messages.
    pub fn label(&self) -> String {
        format!(
            "{} {:.2} {} ({})",
            self.date,
            self.amount,
            self.counterparty,
            self.business_unit.as_deref().unwrap_or("no unit")
        )
    }
}

/// Which business units a computation covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitScope {
    /// Pool every unit. Only used when explicitly requested.
    All,
    Unit(String),
}

impl UnitScope {
    pub fn unit(name: impl Into<String>) -> Self {
        UnitScope::Unit(name.into())
    }

    pub fn includes(&self, transaction: &Transaction) -> bool {
        match self {
            UnitScope::All => true,
            UnitScope::Unit(name) => transaction.business_unit.as_deref() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for UnitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitScope::All => write!(f, "all units"),
            UnitScope::Unit(name) => write!(f, "{}", name),
        }
    }
}
