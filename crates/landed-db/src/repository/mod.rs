//! # Repository Layer
//!
//! Repository implementations for database access.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Repository Pattern                                 │
//! │                                                                         │
//! │  Engine Layer (landed-engine)                                           │
//! │       │                                                                 │
//! │       │ Calls typed methods, receives domain types                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────┐                        │
//! │  │           Repositories (THIS MODULE)         │                        │
//! │  │                                             │                        │
//! │  │  ShipmentRepository    - shipments, costs,  │                        │
//! │  │                          cartons, items     │                        │
//! │  │  AllocationRepository  - cost_allocations   │                        │
//! │  │  ProductRepository     - products, history  │                        │
//! │  └─────────────────────────────────────────────┘                        │
//! │       │                                                                 │
//! │       │ SQL via sqlx, decimal TEXT parsing                              │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Support
//! Each repository exposes pool-based methods for standalone use plus
//! `*_with(conn, ...)` associated functions taking a `&mut SqliteConnection`,
//! so the engine can run an entire recalculation inside one transaction
//! (`&mut *tx` dereferences to the connection).
//!
//! ## Decimal Columns
//! Money and weight columns are TEXT decimal literals. Repositories are
//! the ONLY place they are parsed; a parse failure surfaces as
//! [`DbError::Decode`] naming the column.

pub mod allocation;
pub mod product;
pub mod shipment;

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// Parses a required decimal TEXT column.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| DbError::decode(column, e.to_string()))
}

/// Parses an optional decimal TEXT column.
pub(crate) fn parse_opt_decimal(column: &str, raw: Option<&str>) -> DbResult<Option<Decimal>> {
    match raw {
        Some(s) => parse_decimal(column, s).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("amount", "12.3456").unwrap(), dec!(12.3456));
        assert_eq!(parse_decimal("amount", " 5 ").unwrap(), dec!(5));
        assert!(parse_decimal("amount", "not-a-number").is_err());
    }

    #[test]
    fn test_parse_opt_decimal() {
        assert_eq!(parse_opt_decimal("w", None).unwrap(), None);
        assert_eq!(parse_opt_decimal("w", Some("1.5")).unwrap(), Some(dec!(1.5)));
    }
}
