//! # landed-engine: Landed Cost Orchestration
//!
//! The service layer of the landed cost engine: loads a shipment's data,
//! runs the pure allocation math from `landed-core`, and persists the
//! results through `landed-db` inside one transaction per shipment.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   landed-engine (THIS CRATE)                             │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌──────────────────────┐                    │
//! │  │  LandingCostService  │   │  ValidationService   │                    │
//! │  │  calculate /         │   │  validate (read-only │                    │
//! │  │  recalculate /       │   │  pre-flight checks)  │                    │
//! │  │  summary             │   │                      │                    │
//! │  └──────────┬───────────┘   └──────────┬───────────┘                    │
//! │             │                          │                                │
//! │  ┌──────────▼──────────────────────────▼───────────┐                    │
//! │  │  ShipmentLockRegistry - one mutex per shipment  │                    │
//! │  └──────────┬──────────────────────────────────────┘                    │
//! │             │                                                           │
//! │     landed-core (math)  +  landed-db (persistence)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## API Surface
//!
//! - [`LandingCostService::calculate_landing_costs`] - compute and persist
//! - [`LandingCostService::recalculate_landing_costs`] - explicit redo
//! - [`LandingCostService::get_landing_cost_summary`] - read-only aggregate
//! - [`ValidationService::validate`] - read-only pre-flight check

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod lock;
pub mod service;
pub mod telemetry;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use lock::ShipmentLockRegistry;
pub use service::LandingCostService;
pub use telemetry::init_tracing;
pub use validation::ValidationService;
