//! # landed-db: Database Layer for the Landed Cost Engine
//!
//! This crate provides database access for the landed cost engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Landed Cost Data Flow                                 │
//! │                                                                         │
//! │  LandingCostService (landed-engine)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     landed-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (shipment.rs) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ ShipmentRepo  │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ AllocationRepo│    │ ...          │  │   │
//! │  │   │ Management    │    │ ProductRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: for tests)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (shipment, allocation, product)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use landed_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/landed.db");
//! let db = Database::new(config).await?;
//!
//! let shipment = db.shipments().get_by_id("shp-1").await?;
//! let summary = db.allocations().summary_for_shipment("shp-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::allocation::AllocationRepository;
pub use repository::product::ProductRepository;
pub use repository::shipment::ShipmentRepository;
