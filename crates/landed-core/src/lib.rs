//! # landed-core: Pure Calculation Logic for Landed Costing
//!
//! This crate is the **heart** of the landed cost engine. It contains all
//! allocation math as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Landed Cost Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 landed-engine (Orchestrator)                    │   │
//! │  │   validate ─► derive weights ─► normalize FX ─► allocate ─►     │   │
//! │  │   reconcile ─► persist  (one DB transaction per shipment)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ landed-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐ │   │
//! │  │   │ geometry  │  │    fx     │  │ allocation │  │ fallback  │ │   │
//! │  │   │ volumetric│  │  to_base  │  │ strategies │  │ default   │ │   │
//! │  │   │ chargeable│  │  identity │  │ reconcile  │  │ dims      │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  landed-db (Database Layer)                     │   │
//! │  │           SQLite queries, migrations, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Shipment, ShipmentCost, PurchaseItem, ...)
//! - [`geometry`] - Volumetric and chargeable weight calculations
//! - [`fx`] - Currency normalization into the base currency
//! - [`fallback`] - Conservative defaults for missing dimensions/weight
//! - [`allocation`] - Proportional allocation strategies + rounding reconciliation
//! - [`validation`] - Cost-input validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Decimal Money**: All money and weight values are `rust_decimal::Decimal`,
//!    never IEEE floats
//! 4. **Degrade, Don't Panic**: helpers never panic on bad input - they return
//!    zero/defaults and push a warning the caller must surface

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod fallback;
pub mod fx;
pub mod geometry;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{allocate, reconcile_rounding, AllocationShare, ItemMeasure};
pub use error::{CoreError, CoreResult};
pub use fx::CurrencyNormalizer;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places monetary allocations are rounded to at reconciliation.
///
/// Four places (not two) so that per-unit division downstream does not
/// amplify rounding error across large quantities.
pub const MONEY_SCALE: u32 = 4;

/// Decimal places volumetric weights are rounded to.
pub const WEIGHT_SCALE: u32 = 3;
