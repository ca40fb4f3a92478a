//! Boundary between stored ledger documents and typed [`Transaction`]s.
//!
//! The bookkeeping app keeps expenses as `{ "<unit>": { "utgifter": [..], "total": n } }`
//! and revenue as `{ "intakter": [..], "total": n }`. Stored totals are never
//! trusted; they are re-derived by summation when a document is rendered.

use crate::error::{EngineError, Result};
use crate::schema::{check_amount, Transaction, TransactionKind};
use crate::transactions::TransactionSet;
use crate::utils::parse_transaction_date;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A record as stored, before validation. Field names follow the stored
/// documents (`datum`, `belopp`, ...) and the English names are accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransactionRecord {
    #[serde(rename = "datum", alias = "date", default)]
    pub date: Option<String>,

    #[serde(rename = "belopp", alias = "amount", default)]
    pub amount: Value,

    #[serde(rename = "kategori", alias = "category", default)]
    pub category: String,

    #[serde(rename = "leverantor", alias = "kund", alias = "counterparty", default)]
    pub counterparty: String,

    #[serde(rename = "verksamhet", alias = "business_unit", default)]
    pub business_unit: Option<String>,

    #[serde(rename = "beskrivning", alias = "description", default)]
    pub description: Option<String>,
}

impl RawTransactionRecord {
    pub fn new(date: &str, amount: impl Into<Value>, category: &str, counterparty: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            amount: amount.into(),
            category: category.to_string(),
            counterparty: counterparty.to_string(),
            business_unit: None,
            description: None,
        }
    }

    pub fn with_business_unit(mut self, unit: &str) -> Self {
        self.business_unit = Some(unit.to_string());
        self
    }

    fn identity(&self, position: usize) -> String {
        format!(
            "#{} ({}, {})",
            position,
            self.date.as_deref().unwrap_or("no date"),
            if self.counterparty.is_empty() {
                "no counterparty"
            } else {
                self.counterparty.as_str()
            }
        )
    }

    /// Validates the record. `position` identifies it in the error.
    pub fn to_transaction(&self, position: usize) -> Result<Transaction> {
        let malformed = |reason: String| EngineError::MalformedRecord {
            record: self.identity(position),
            reason,
        };

        let raw_date = self
            .date
            .as_deref()
            .ok_or_else(|| malformed("missing date".to_string()))?;
        let date = parse_transaction_date(raw_date).map_err(malformed)?;
        let amount = parse_amount(&self.amount).map_err(malformed)?;

        Ok(Transaction {
            date,
            amount,
            category: self.category.clone(),
            counterparty: self.counterparty.clone(),
            business_unit: self.business_unit.clone(),
            description: self.description.clone(),
        })
    }
}

fn parse_amount(value: &Value) -> std::result::Result<f64, String> {
    let amount = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("amount {} is not representable", n))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("amount '{}' is not numeric", s))?,
        Value::Null => return Err("missing amount".to_string()),
        other => return Err(format!("amount {} is not numeric", other)),
    };

    check_amount(amount)
}

/// Typed transactions plus every record that failed validation.
#[derive(Debug)]
pub struct IngestReport {
    pub transactions: TransactionSet,
    pub rejected: Vec<EngineError>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Converts raw records, quarantining malformed ones instead of failing.
pub fn ingest_records(kind: TransactionKind, records: &[RawTransactionRecord]) -> IngestReport {
    let mut set = TransactionSet::new(kind);
    let mut rejected = Vec::new();

    for (position, record) in records.iter().enumerate() {
        match record.to_transaction(position) {
            Ok(transaction) => set.push(transaction),
            Err(e) => {
                warn!("Skipping {} record: {}", kind, e);
                rejected.push(e);
            }
        }
    }

    debug!(
        "Ingested {} {} records ({} rejected)",
        set.len(),
        kind,
        rejected.len()
    );

    IngestReport {
        transactions: set,
        rejected,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExpenseLedgerEntry {
    #[serde(default)]
    utgifter: Vec<RawTransactionRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct RevenueLedger {
    #[serde(default)]
    intakter: Vec<RawTransactionRecord>,
}

/// Parses an expense document keyed by business unit. Each record takes the
/// unit of the section it is stored under.
pub fn parse_expense_ledger(json: &str) -> Result<IngestReport> {
    let ledger: BTreeMap<String, ExpenseLedgerEntry> = serde_json::from_str(json)?;

    let records: Vec<RawTransactionRecord> = ledger
        .into_iter()
        .flat_map(|(unit, entry)| {
            entry.utgifter.into_iter().map(move |mut record| {
                record.business_unit = Some(unit.clone());
                record
            })
        })
        .collect();

    Ok(ingest_records(TransactionKind::Expense, &records))
}

pub fn parse_revenue_ledger(json: &str) -> Result<IngestReport> {
    let ledger: RevenueLedger = serde_json::from_str(json)?;
    Ok(ingest_records(TransactionKind::Revenue, &ledger.intakter))
}

fn stored_record(transaction: &Transaction, kind: TransactionKind) -> Value {
    let counterparty_key = match kind {
        TransactionKind::Expense => "leverantor",
        TransactionKind::Revenue => "kund",
    };

    let mut record = json!({
        "datum": transaction.date.format("%Y-%m-%d").to_string(),
        "belopp": transaction.amount,
        "kategori": transaction.category
    });
    record[counterparty_key] = json!(transaction.counterparty);
    if let Some(description) = &transaction.description {
        record["beskrivning"] = json!(description);
    }
    if kind == TransactionKind::Revenue {
        if let Some(unit) = &transaction.business_unit {
            record["verksamhet"] = json!(unit);
        }
    }
    record
}

/// Renders expenses back into the stored layout, with each unit's `total`
/// recomputed from its records. `units` are always present, even when empty.
pub fn render_expense_ledger(set: &TransactionSet, units: &[&str]) -> Result<String> {
    let mut sections: BTreeMap<String, Vec<&Transaction>> = units
        .iter()
        .map(|u| (u.to_string(), Vec::new()))
        .collect();
    for transaction in set {
        let unit = transaction.business_unit.clone().unwrap_or_default();
        sections.entry(unit).or_default().push(transaction);
    }

    let document: serde_json::Map<String, Value> = sections
        .into_iter()
        .map(|(unit, transactions)| {
            let total: f64 = transactions.iter().map(|t| t.amount).sum();
            let records: Vec<Value> = transactions
                .iter()
                .map(|t| stored_record(t, TransactionKind::Expense))
                .collect();
            (unit, json!({ "utgifter": records, "total": total }))
        })
        .collect();

    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn render_revenue_ledger(set: &TransactionSet) -> Result<String> {
    let records: Vec<Value> = set
        .iter()
        .map(|t| stored_record(t, TransactionKind::Revenue))
        .collect();
    let document = json!({ "intakter": records, "total": set.total() });
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EXPENSES: &str = r#"{
        "Unithread": {
            "utgifter": [
                {"datum": "2024-01-05", "belopp": 120.0, "kategori": "Varuinköp", "leverantor": "Grossist AB", "beskrivning": "Tyg"},
                {"datum": "2024-13-05", "belopp": 50, "kategori": "Övrigt", "leverantor": "Okänd"}
            ],
            "total": 999
        },
        "Merchoteket": {
            "utgifter": [
                {"datum": "2024-02-01", "belopp": "80.50", "kategori": "Lokalhyra", "leverantor": "Hyresvärd"},
                {"datum": "2024-02-02", "belopp": "gratis", "kategori": "Övrigt", "leverantor": "Ica"}
            ],
            "total": 0
        }
    }"#;

    #[test]
    fn test_parse_expense_ledger_quarantines_bad_records() {
        let report = parse_expense_ledger(EXPENSES).unwrap();
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert!(!report.is_clean());

        for err in &report.rejected {
            assert!(matches!(err, EngineError::MalformedRecord { .. }));
        }

        let units = report.transactions.business_units();
        assert!(units.contains("Unithread"));
        assert!(units.contains("Merchoteket"));
        assert!((report.transactions.total() - 200.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_revenue_ledger() {
        let json = r#"{"intakter": [
            {"datum": "2024-03-01", "belopp": 1000, "kategori": "Tjänster", "kund": "Kund AB", "verksamhet": "Unithread"},
            {"datum": "2024-03-02", "belopp": 500, "kategori": "Övrigt", "kund": "Privat"}
        ], "total": 1500}"#;

        let report = parse_revenue_ledger(json).unwrap();
        assert!(report.is_clean());
        let set = report.transactions;
        assert_eq!(set.kind(), TransactionKind::Revenue);
        assert_eq!(set.get(0).unwrap().counterparty, "Kund AB");
        assert_eq!(set.get(0).unwrap().business_unit.as_deref(), Some("Unithread"));
        assert_eq!(set.get(1).unwrap().business_unit, None);
    }

    #[test]
    fn test_malformed_record_identity() {
        let record = RawTransactionRecord::new("2024/01/01", 10.0, "Övrigt", "Ica");
        let err = record.to_transaction(7).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("#7"));
        assert!(message.contains("Ica"));

        let negative = RawTransactionRecord::new("2024-01-01", -5.0, "Övrigt", "Ica");
        assert!(negative.to_transaction(0).is_err());

        let missing = RawTransactionRecord {
            date: None,
            ..RawTransactionRecord::new("2024-01-01", 1.0, "Övrigt", "Ica")
        };
        assert!(missing.to_transaction(0).is_err());
    }

    #[test]
    fn test_invalid_document_is_a_serialization_error() {
        let err = parse_revenue_ledger("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::SerializationError(_)));
    }

    #[test]
    fn test_rendered_totals_are_recomputed() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let set = TransactionSet::from_transactions(
            TransactionKind::Expense,
            vec![
                Transaction::new(date, 10.0, "Övrigt", "Ica").with_business_unit("Unithread"),
                Transaction::new(date, 15.0, "Övrigt", "Coop").with_business_unit("Unithread"),
            ],
        );

        let rendered = render_expense_ledger(&set, &["Unithread", "Merchoteket"]).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["Unithread"]["total"], json!(25.0));
        assert_eq!(value["Merchoteket"]["total"], json!(0.0));
        assert_eq!(value["Unithread"]["utgifter"][1]["leverantor"], json!("Coop"));
    }

    #[test]
    fn test_revenue_uses_customer_key() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let set = TransactionSet::from_transactions(
            TransactionKind::Revenue,
            vec![Transaction::new(date, 700.0, "Tjänster", "Kund AB").with_business_unit("Merchoteket")],
        );

        let rendered = render_revenue_ledger(&set).unwrap();
        let report = parse_revenue_ledger(&rendered).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.transactions, set);
    }
}
