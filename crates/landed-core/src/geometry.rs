//! # Geometry Calculations
//!
//! Volumetric and chargeable weight math.
//!
//! ## Why Volumetric Weight?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Carriers bill the GREATER of actual and volumetric weight.            │
//! │                                                                         │
//! │  A carton of pillows: 60×40×40 cm, 2 kg actual                         │
//! │    volumetric (air) = 60*40*40 / 6000 = 16 kg                          │
//! │    chargeable       = max(2, 16)      = 16 kg  ← what freight costs    │
//! │                                                                         │
//! │  A carton of bolts: 20×15×10 cm, 25 kg actual                          │
//! │    volumetric (air) = 20*15*10 / 6000 = 0.5 kg                         │
//! │    chargeable       = max(25, 0.5)    = 25 kg                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! These functions never panic and never error. Invalid inputs produce a
//! zero weight plus a warning the caller must surface.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::WEIGHT_SCALE;

// =============================================================================
// Volumetric Divisors (cm³ per kg)
// =============================================================================

/// Air freight divisor.
pub const DIVISOR_AIR: i64 = 6000;

/// Sea freight divisor: 1 m³ ≡ 1000 kg.
pub const DIVISOR_SEA: i64 = 1_000_000;

/// Courier/express divisor.
pub const DIVISOR_COURIER: i64 = 5000;

// =============================================================================
// Weight Calculations
// =============================================================================

/// Computes volumetric weight from dimensions in cm and a divisor.
///
/// Returns `(length * width * height) / divisor`, rounded half-up to 3
/// decimal places. If any dimension or the divisor is non-positive, the
/// result is zero and a warning is pushed - never an error.
pub fn volumetric_weight(
    length_cm: Decimal,
    width_cm: Decimal,
    height_cm: Decimal,
    divisor: Decimal,
    warnings: &mut Vec<String>,
) -> Decimal {
    if length_cm <= Decimal::ZERO
        || width_cm <= Decimal::ZERO
        || height_cm <= Decimal::ZERO
        || divisor <= Decimal::ZERO
    {
        warnings.push(format!(
            "invalid dimensions or divisor for volumetric weight \
             ({length_cm} x {width_cm} x {height_cm} cm / {divisor}); using 0"
        ));
        return Decimal::ZERO;
    }

    let volume_cm3 = length_cm * width_cm * height_cm;
    (volume_cm3 / divisor)
        .round_dp_with_strategy(WEIGHT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Chargeable weight: the greater of actual and volumetric weight,
/// with negative inputs clamped to zero first.
pub fn chargeable_weight(actual_kg: Decimal, volumetric_kg: Decimal) -> Decimal {
    let actual = actual_kg.max(Decimal::ZERO);
    let volumetric = volumetric_kg.max(Decimal::ZERO);
    actual.max(volumetric)
}

// =============================================================================
// Unit Tests
// =============================================================================
