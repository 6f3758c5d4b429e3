use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use fieldmap_model::TransformationRule;

use crate::document::StoredRule;
use crate::error::{Result, StoreError};
use crate::{RuleStore, RuleSummary};

/// In-process rule store, keyed by endpoint id.
///
/// Documents are kept in their persisted form, so a save followed by a load
/// goes through the same flattening and join as [`crate::JsonFileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    rules: Mutex<BTreeMap<String, StoredRule>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, StoredRule>> {
        // A panic while holding the lock cannot leave a half-written entry:
        // every mutation is a single insert or remove.
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RuleStore for MemoryStore {
    fn load(&self, endpoint_id: &str) -> Result<TransformationRule> {
        let stored = self
            .lock()
            .get(endpoint_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                endpoint_id: endpoint_id.to_string(),
            })?;
        stored.into_rule()
    }

    fn save(&self, rule: &TransformationRule) -> Result<()> {
        let stored = StoredRule::new(rule)?;
        self.lock().insert(rule.endpoint_id.clone(), stored);
        Ok(())
    }

    fn delete(&self, endpoint_id: &str) -> Result<bool> {
        Ok(self.lock().remove(endpoint_id).is_some())
    }

    fn list(&self) -> Result<Vec<RuleSummary>> {
        Ok(self
            .lock()
            .values()
            .map(|stored| RuleSummary::from_stored(stored, None))
            .collect())
    }

    fn load_all(&self) -> Result<Vec<TransformationRule>> {
        let documents: Vec<StoredRule> = self.lock().values().cloned().collect();
        documents.into_iter().map(StoredRule::into_rule).collect()
    }
}
