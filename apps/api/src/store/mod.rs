// Routine persistence behind a single ordered key-value seam.
// Partition key: userId. Sort key: timestamp (seconds). Put is an unconditional upsert.

pub mod dynamodb;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::models::routine::RoutineEntry;

pub use dynamodb::DynamoRoutineStore;
pub use memory::InMemoryRoutineStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the call.
    #[error("{0}")]
    Unavailable(String),

    /// A stored item could not be read back as a routine.
    #[error("Malformed routine item: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RoutineStore: Send + Sync {
    /// Writes `entry` under `(user_id, timestamp)`, replacing whatever was there.
    async fn put(&self, entry: &RoutineEntry) -> Result<(), StoreError>;

    /// Returns every entry for `user_id`, ordered by timestamp.
    async fn query_by_user(
        &self,
        user_id: &str,
        descending: bool,
    ) -> Result<Vec<RoutineEntry>, StoreError>;
}

/// Builds the configured store once at startup.
pub async fn connect(config: &Config) -> Arc<dyn RoutineStore> {
    match config.store_backend {
        StoreBackend::DynamoDb => {
            let client = dynamodb::build_client(config).await;
            info!("DynamoDB client initialized (table: {})", config.table_name);
            Arc::new(DynamoRoutineStore::new(client, config.table_name.clone()))
        }
        StoreBackend::Memory => {
            info!("Using in-memory routine store; entries are lost on restart");
            Arc::new(InMemoryRoutineStore::new())
        }
    }
}
