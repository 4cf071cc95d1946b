//! # Error Types
//!
//! Domain-specific error types for landed-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  landed-core errors (this file)                                        │
//! │  └── CoreError        - Pure calculation failures (FX, inputs)         │
//! │                                                                         │
//! │  landed-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  landed-engine errors (separate crate)                                 │
//! │  └── EngineError      - Orchestration failures (not found, rollback)   │
//! │                                                                         │
//! │  Flow: CoreError → EngineError → caller                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (currency, cost type, item id)
//! 3. Errors are enum variants, never String
//! 4. Geometry and fallback helpers never error - they degrade and warn;
//!    only genuinely unrecoverable conditions become `CoreError`

use thiserror::Error;

/// Core calculation errors.
///
/// These are deliberately few: most bad inputs degrade into warnings
/// rather than errors, so a single defective cost line cannot block an
/// entire shipment recalculation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cost line in a foreign currency has no usable exchange rate.
    ///
    /// ## When This Occurs
    /// - `fx_rate_used` is NULL on a non-base-currency cost line
    /// - `fx_rate_used` is zero or negative
    ///
    /// The orchestrator catches this, falls back to the stored base
    /// amount, and records a warning on the breakdown.
    #[error("cannot convert {currency} to {base}: invalid or missing FX rate")]
    InvalidFxRate { currency: String, base: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
