//! Pairwise duplicate detection.
//!
//! Every unordered pair is compared once, so a scan is O(n²). That is fine
//! for bookkeeping volumes (thousands of rows); bucketing on rounded amount
//! and lowercased counterparty before comparing would be the next step if
//! volumes grow.

use crate::config::{EngineConfig, MatchPolicy};
use crate::error::{EngineError, Result};
use crate::ingestion::RawTransactionRecord;
use crate::schema::{Transaction, TransactionKind};
use crate::transactions::TransactionSet;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// A pair of transactions believed to be the same real-world event.
///
/// Indices refer to the exact snapshot that was scanned and are invalidated
/// by any removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub original_index: usize,
    pub duplicate_index: usize,
    pub original: Transaction,
    pub duplicate: Transaction,
    /// Shared unit of both sides, `None` when they differ or are untagged.
    pub business_unit: Option<String>,
}

/// Result of scanning raw records: candidates over the valid records, plus
/// the records that could not be compared.
#[derive(Debug)]
pub struct DuplicateScan {
    pub candidates: Vec<DuplicateCandidate>,
    pub skipped: Vec<EngineError>,
}

pub struct DuplicateDetector<'a> {
    config: &'a EngineConfig,
}

struct Entry<'t> {
    index: usize,
    transaction: &'t Transaction,
    counterparty_lower: String,
}

impl<'t> Entry<'t> {
    fn new(index: usize, transaction: &'t Transaction) -> Self {
        Self {
            index,
            transaction,
            counterparty_lower: transaction.counterparty.to_lowercase(),
        }
    }
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(config: &'a EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn policy(&self) -> MatchPolicy {
        self.config.match_policy
    }

    /// Whether `a` and `b` are duplicates under the configured policy and scoping.
    pub fn is_match(&self, kind: TransactionKind, a: &Transaction, b: &Transaction) -> bool {
        self.entry_match(kind, &Entry::new(0, a), &Entry::new(1, b))
    }

    fn strict_match(&self, kind: TransactionKind, a: &Transaction, b: &Transaction) -> bool {
        a.date == b.date
            && a.amount == b.amount
            && a.counterparty == b.counterparty
            && (kind != TransactionKind::Revenue || a.business_unit == b.business_unit)
    }

    fn fuzzy_match(&self, a: &Transaction, b: &Transaction, a_lower: &str, b_lower: &str) -> bool {
        (a.date - b.date).num_days().abs() <= i64::from(self.config.date_tolerance_days)
            && (a.amount - b.amount).abs() < self.config.amount_tolerance
            && a_lower == b_lower
    }

    fn entry_match(&self, kind: TransactionKind, a: &Entry<'_>, b: &Entry<'_>) -> bool {
        if self.config.scope_by_business_unit
            && a.transaction.business_unit != b.transaction.business_unit
        {
            return false;
        }
        match self.config.match_policy {
            MatchPolicy::Strict => self.strict_match(kind, a.transaction, b.transaction),
            MatchPolicy::Fuzzy => self.fuzzy_match(
                a.transaction,
                b.transaction,
                &a.counterparty_lower,
                &b.counterparty_lower,
            ),
        }
    }

    /// All duplicate pairs in `set`, ordered by `(original_index, duplicate_index)`.
    pub fn find_duplicates(&self, set: &TransactionSet) -> Vec<DuplicateCandidate> {
        info!(
            "Scanning {} {} transactions for duplicates ({} policy, unit scoped: {})",
            set.len(),
            set.kind(),
            self.config.match_policy,
            self.config.scope_by_business_unit
        );
        let entries: Vec<Entry<'_>> = set
            .iter()
            .enumerate()
            .map(|(index, transaction)| Entry::new(index, transaction))
            .collect();
        self.scan_entries(set.kind(), &entries)
    }

    /// Scans raw records, skipping (and reporting) the ones that fail
    /// validation. Candidate indices are positions in `records`.
    pub fn scan_records(&self, kind: TransactionKind, records: &[RawTransactionRecord]) -> DuplicateScan {
        let mut skipped = Vec::new();
        let mut parsed = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            match record.to_transaction(index) {
                Ok(transaction) => parsed.push((index, transaction)),
                Err(e) => {
                    warn!("Duplicate scan skipping {} record: {}", kind, e);
                    skipped.push(e);
                }
            }
        }

        let entries: Vec<Entry<'_>> = parsed
            .iter()
            .map(|(index, transaction)| Entry::new(*index, transaction))
            .collect();

        DuplicateScan {
            candidates: self.scan_entries(kind, &entries),
            skipped,
        }
    }

    fn scan_entries(&self, kind: TransactionKind, entries: &[Entry<'_>]) -> Vec<DuplicateCandidate> {
        let mut candidates = Vec::new();

        for (i, original) in entries.iter().enumerate() {
            for duplicate in &entries[i + 1..] {
                if !self.entry_match(kind, original, duplicate) {
                    continue;
                }

                let business_unit = if original.transaction.business_unit
                    == duplicate.transaction.business_unit
                {
                    original.transaction.business_unit.clone()
                } else {
                    None
                };

                debug!(
                    "Duplicate candidate {} / {}: {}",
                    original.index,
                    duplicate.index,
                    duplicate.transaction.label()
                );
                candidates.push(DuplicateCandidate {
                    original_index: original.index,
                    duplicate_index: duplicate.index,
                    original: original.transaction.clone(),
                    duplicate: duplicate.transaction.clone(),
                    business_unit,
                });
            }
        }

        debug!("Found {} duplicate candidates", candidates.len());
        candidates
    }
}
