//! # Per-Shipment Recalculation Lock
//!
//! Serializes recalculations of the same shipment.
//!
//! ## Why
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Persisting allocations is delete-then-insert. Two overlapping          │
//! │  recalculations of one shipment could interleave:                       │
//! │                                                                         │
//! │    tx A: DELETE allocations                                             │
//! │    tx B: DELETE allocations                                             │
//! │    tx A: INSERT rows, COMMIT                                            │
//! │    tx B: INSERT rows, COMMIT   ← duplicate allocation rows              │
//! │                                                                         │
//! │  The registry hands out one async mutex per shipment id, so the         │
//! │  second recalculation waits for the first to commit or roll back.       │
//! │  Different shipments share no state and proceed concurrently.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Process-wide registry of per-shipment recalculation locks.
///
/// Clones share the same underlying registry.
#[derive(Debug, Clone, Default)]
pub struct ShipmentLockRegistry {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ShipmentLockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one shipment, waiting if another
    /// recalculation of the same shipment holds it.
    ///
    /// The returned guard is owned, so it can be held across the whole
    /// transaction without borrowing the registry.
    pub async fn acquire(&self, shipment_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            map.entry(shipment_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
