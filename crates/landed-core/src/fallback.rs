//! # Dimension Fallback Resolver
//!
//! Supplies conservative defaults when a purchase item is missing
//! physical data, so a shipment with patchy source data still gets a
//! landed cost - a degraded one, with every substitution surfaced as a
//! warning naming the item.
//!
//! This resolver never fails; it only ever degrades precision and says why.

use rust_decimal::Decimal;

/// Default parcel length when the item carries no usable dimensions, in cm.
pub const DEFAULT_LENGTH_CM: i64 = 20;
/// Default parcel width, in cm.
pub const DEFAULT_WIDTH_CM: i64 = 15;
/// Default parcel height, in cm.
pub const DEFAULT_HEIGHT_CM: i64 = 10;

/// Assumed density for weight estimation, in kg/m³.
pub const FALLBACK_DENSITY_KG_PER_M3: i64 = 200;

const CM3_PER_M3: i64 = 1_000_000;

/// Physical data for one unit of an item after gap-filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDimensions {
    pub length_cm: Decimal,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
    pub weight_kg: Decimal,
}

/// Fills missing or non-positive dimensions/weight for one item.
///
/// - Any missing spatial dimension is replaced individually by its
///   default (20 x 15 x 10 cm), with one warning per item.
/// - A missing weight is estimated from the (possibly substituted)
///   volume at 200 kg/m³, with a second warning.
///
/// `item_id` only labels the warnings; the math does not depend on it.
pub fn resolve_dimensions(
    item_id: &str,
    length_cm: Option<Decimal>,
    width_cm: Option<Decimal>,
    height_cm: Option<Decimal>,
    weight_kg: Option<Decimal>,
    warnings: &mut Vec<String>,
) -> ResolvedDimensions {
    let positive = |v: Option<Decimal>| v.filter(|d| *d > Decimal::ZERO);

    let mut length = positive(length_cm).unwrap_or_default();
    let mut width = positive(width_cm).unwrap_or_default();
    let mut height = positive(height_cm).unwrap_or_default();
    let mut weight = positive(weight_kg).unwrap_or_default();

    if length.is_zero() || width.is_zero() || height.is_zero() {
        if length.is_zero() {
            length = Decimal::from(DEFAULT_LENGTH_CM);
        }
        if width.is_zero() {
            width = Decimal::from(DEFAULT_WIDTH_CM);
        }
        if height.is_zero() {
            height = Decimal::from(DEFAULT_HEIGHT_CM);
        }
        warnings.push(format!(
            "item {item_id}: missing dimensions, using fallback {length} x {width} x {height} cm"
        ));
    }

    if weight.is_zero() {
        let volume_m3 = (length * width * height) / Decimal::from(CM3_PER_M3);
        weight = volume_m3 * Decimal::from(FALLBACK_DENSITY_KG_PER_M3);
        warnings.push(format!(
            "item {item_id}: missing weight, estimated {weight} kg from volume"
        ));
    }

    ResolvedDimensions {
        length_cm: length,
        width_cm: width,
        height_cm: height,
        weight_kg: weight,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_complete_data_passes_through() {
        let mut warnings = Vec::new();
        let resolved = resolve_dimensions(
            "item-1",
            Some(dec!(30)),
            Some(dec!(20)),
            Some(dec!(10)),
            Some(dec!(2.5)),
            &mut warnings,
        );
        assert_eq!(resolved.length_cm, dec!(30));
        assert_eq!(resolved.weight_kg, dec!(2.5));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_all_missing_uses_defaults_and_density() {
        let mut warnings = Vec::new();
        let resolved = resolve_dimensions("item-7", None, None, None, None, &mut warnings);

        assert_eq!(resolved.length_cm, dec!(20));
        assert_eq!(resolved.width_cm, dec!(15));
        assert_eq!(resolved.height_cm, dec!(10));
        // 20*15*10 = 3000 cm³ = 0.003 m³ * 200 kg/m³ = 0.6 kg
        assert_eq!(resolved.weight_kg, dec!(0.6));

        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.contains("item-7")));
    }

    #[test]
    fn test_partial_dimensions_substituted_individually() {
        let mut warnings = Vec::new();
        let resolved = resolve_dimensions(
            "item-2",
            Some(dec!(50)),
            None,
            Some(dec!(-4)),
            Some(dec!(1)),
            &mut warnings,
        );
        assert_eq!(resolved.length_cm, dec!(50));
        assert_eq!(resolved.width_cm, dec!(15));
        assert_eq!(resolved.height_cm, dec!(10));
        assert_eq!(resolved.weight_kg, dec!(1));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_zero_weight_estimated_from_given_volume() {
        let mut warnings = Vec::new();
        let resolved = resolve_dimensions(
            "item-3",
            Some(dec!(100)),
            Some(dec!(50)),
            Some(dec!(40)),
            Some(dec!(0)),
            &mut warnings,
        );
        // 100*50*40 = 200000 cm³ = 0.2 m³ * 200 = 40 kg
        assert_eq!(resolved.weight_kg, dec!(40));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("missing weight"));
    }

    #[test]
    fn test_never_fails() {
        let mut warnings = Vec::new();
        let resolved = resolve_dimensions(
            "item-4",
            Some(dec!(-1)),
            Some(dec!(0)),
            None,
            Some(dec!(-9)),
            &mut warnings,
        );
        assert!(resolved.weight_kg > Decimal::ZERO);
        assert_eq!(warnings.len(), 2);
    }
}
