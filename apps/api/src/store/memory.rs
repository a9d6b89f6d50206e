use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RoutineStore, StoreError};
use crate::models::routine::RoutineEntry;

/// Process-local store: one ordered map per user, keyed by timestamp.
#[derive(Debug, Default)]
pub struct InMemoryRoutineStore {
    partitions: RwLock<HashMap<String, BTreeMap<i64, RoutineEntry>>>,
}

impl InMemoryRoutineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoutineStore for InMemoryRoutineStore {
    async fn put(&self, entry: &RoutineEntry) -> Result<(), StoreError> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(entry.user_id.clone())
            .or_default()
            .insert(entry.timestamp, entry.clone());
        Ok(())
    }

    async fn query_by_user(
        &self,
        user_id: &str,
        descending: bool,
    ) -> Result<Vec<RoutineEntry>, StoreError> {
        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(user_id) else {
            return Ok(Vec::new());
        };
        let entries = if descending {
            partition.values().rev().cloned().collect()
        } else {
            partition.values().cloned().collect()
        };
        Ok(entries)
    }
}
