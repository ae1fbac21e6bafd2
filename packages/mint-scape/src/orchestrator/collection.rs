//! Best-effort "make sure the target collection exists" step.

use crate::contract::ContractClient;
use crate::metrics::METRICS;
use alloy::primitives::U256;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// The existence check said yes; nothing submitted.
    Existing,
    /// A creation transaction was confirmed.
    Created,
    /// Creation was rejected because the collection is already there.
    AlreadyExists,
}

/// When the existence check itself fails, creation is attempted anyway.
/// A creation rejected with "already exists" counts as success.
pub async fn ensure_collection(
    contract: &dyn ContractClient,
    name: &str,
    symbol: &str,
    price: U256,
) -> Result<CollectionStatus, crate::Error> {
    match contract.collection_exists(name).await {
        Ok(true) => {
            debug!(collection = name, "Collection exists");
            return Ok(CollectionStatus::Existing);
        }
        Ok(false) => info!(collection = name, "Collection missing, creating"),
        Err(e) => warn!(
            collection = name,
            error = %e,
            "Existence check failed, attempting creation"
        ),
    }

    let created = match contract.create_collection(name, symbol, price).await {
        Ok(tx) => contract.await_tx(&tx).await,
        Err(e) => Err(e),
    };

    match created {
        Ok(receipt) => {
            METRICS.collections_created.fetch_add(1, Ordering::Relaxed);
            info!(collection = name, tx_hash = %receipt.tx_hash, "Collection created");
            Ok(CollectionStatus::Created)
        }
        Err(e) if e.is_already_exists() => {
            info!(collection = name, "Collection already exists, continuing");
            Ok(CollectionStatus::AlreadyExists)
        }
        Err(e) => Err(e),
    }
}
