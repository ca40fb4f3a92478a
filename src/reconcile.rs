use crate::duplicates::DuplicateCandidate;
use crate::error::{EngineError, Result};
use crate::schema::Transaction;
use crate::transactions::TransactionSet;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Which side of each candidate pair survives a batch removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepSide {
    Original,
    Duplicate,
    Both,
}

/// A user decision on a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    DropDuplicate,
    DropOriginal,
    DropBoth,
    KeepBoth,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: Vec<Transaction>,
    /// Sum of the remaining amounts after removal.
    pub total: f64,
}

/// Removes the record at `index` and returns it with the fresh total.
pub fn remove_transaction(set: &mut TransactionSet, index: usize) -> Result<Removal> {
    let removed = set.remove(index)?;
    Ok(Removal {
        removed: vec![removed],
        total: set.total(),
    })
}

/// Removes the side of every candidate that is not kept.
///
/// Indices are checked against the current set before anything is removed,
/// then deleted in descending order so earlier positions stay valid. A
/// record named by several candidates is removed once.
pub fn remove_duplicate_batch(
    set: &mut TransactionSet,
    candidates: &[DuplicateCandidate],
    keep: KeepSide,
) -> Result<Removal> {
    let mut indices: Vec<usize> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match keep {
            KeepSide::Original => indices.push(checked(set, candidate, Side::Duplicate)?),
            KeepSide::Duplicate => indices.push(checked(set, candidate, Side::Original)?),
            KeepSide::Both => {}
        }
    }

    let removal = remove_indices(set, indices)?;
    info!(
        "Removed {} duplicate {} transactions, new total {:.2}",
        removal.removed.len(),
        set.kind(),
        removal.total
    );
    Ok(removal)
}

/// Applies one decision to one candidate.
pub fn resolve_candidate(
    set: &mut TransactionSet,
    candidate: &DuplicateCandidate,
    resolution: Resolution,
) -> Result<Removal> {
    let indices = match resolution {
        Resolution::DropDuplicate => vec![checked(set, candidate, Side::Duplicate)?],
        Resolution::DropOriginal => vec![checked(set, candidate, Side::Original)?],
        Resolution::DropBoth => vec![
            checked(set, candidate, Side::Original)?,
            checked(set, candidate, Side::Duplicate)?,
        ],
        Resolution::KeepBoth => Vec::new(),
    };
    remove_indices(set, indices)
}

#[derive(Clone, Copy)]
enum Side {
    Original,
    Duplicate,
}

/// Index of `side`, provided the set still holds that exact record there.
fn checked(set: &TransactionSet, candidate: &DuplicateCandidate, side: Side) -> Result<usize> {
    let (index, expected) = match side {
        Side::Original => (candidate.original_index, &candidate.original),
        Side::Duplicate => (candidate.duplicate_index, &candidate.duplicate),
    };

    match set.get(index) {
        None => Err(EngineError::IndexOutOfRange {
            index,
            len: set.len(),
        }),
        Some(current) if current != expected => {
            warn!(
                "Candidate index {} now holds {}, expected {}",
                index,
                current.label(),
                expected.label()
            );
            Err(EngineError::StaleCandidate { index })
        }
        Some(_) => Ok(index),
    }
}

fn remove_indices(set: &mut TransactionSet, mut indices: Vec<usize>) -> Result<Removal> {
    indices.sort_unstable_by(|a, b| b.cmp(a));
    indices.dedup();

    let mut removed = Vec::with_capacity(indices.len());
    for index in indices {
        removed.push(set.remove(index)?);
    }
    removed.reverse();

    Ok(Removal {
        removed,
        total: set.total(),
    })
}
