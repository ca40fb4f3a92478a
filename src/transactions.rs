use crate::error::{EngineError, Result};
use crate::schema::{Transaction, TransactionKind, UnitScope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ordered, typed collection of transactions of a single kind.
///
/// Positions are meaningful: duplicate candidates refer to them, so the set
/// never reorders its records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionSet {
    kind: TransactionKind,
    transactions: Vec<Transaction>,
}

impl TransactionSet {
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            transactions: Vec::new(),
        }
    }

    pub fn from_transactions(kind: TransactionKind, transactions: Vec<Transaction>) -> Self {
        Self { kind, transactions }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// Sum of all amounts, recomputed on every call.
    pub fn total(&self) -> f64 {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Transactions belonging to `scope`, in set order.
    pub fn scoped(&self, scope: &UnitScope) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| scope.includes(t))
            .collect()
    }

    pub fn business_units(&self) -> BTreeSet<String> {
        self.transactions
            .iter()
            .filter_map(|t| t.business_unit.clone())
            .collect()
    }

    pub fn remove(&mut self, index: usize) -> Result<Transaction> {
        if index >= self.transactions.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.transactions.len(),
            });
        }
        Ok(self.transactions.remove(index))
    }

    pub fn into_inner(self) -> Vec<Transaction> {
        self.transactions
    }
}

impl<'a> IntoIterator for &'a TransactionSet {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}
