//! # Engine Error Types
//!
//! Orchestration-level errors. Only genuinely fatal conditions live here:
//! data-quality problems degrade into warnings on the returned breakdown
//! instead (see the propagation policy in `landed_core::error`).

use thiserror::Error;

use landed_db::DbError;

/// Errors from the landed cost orchestrator.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested shipment does not exist.
    ///
    /// Raised before any write; the caller's previous allocations are
    /// untouched.
    #[error("shipment not found: {0}")]
    ShipmentNotFound(String),

    /// Neither the carton join nor the consolidation link yielded any
    /// purchase items to allocate against.
    #[error("no purchase items found for shipment: {0}")]
    NoItemsFound(String),

    /// A database operation failed. The transaction rolls back; no
    /// partial allocations survive.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
