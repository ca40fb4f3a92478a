use crate::error::Result;
use crate::schema::TransactionKind;
use crate::transactions::TransactionSet;
use std::collections::HashMap;

/// Storage seam. Implementations own retries and caching; the engine only
/// ever sees the loaded sets.
pub trait TransactionRepository {
    fn load_transactions(&self, kind: TransactionKind) -> Result<TransactionSet>;

    fn save_transactions(&mut self, kind: TransactionKind, set: &TransactionSet) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    sets: HashMap<TransactionKind, TransactionSet>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(mut self, set: TransactionSet) -> Self {
        self.sets.insert(set.kind(), set);
        self
    }
}

impl TransactionRepository for InMemoryRepository {
    fn load_transactions(&self, kind: TransactionKind) -> Result<TransactionSet> {
        Ok(self
            .sets
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| TransactionSet::new(kind)))
    }

    fn save_transactions(&mut self, kind: TransactionKind, set: &TransactionSet) -> Result<()> {
        self.sets.insert(kind, set.clone());
        Ok(())
    }
}
