//! # Currency Normalization
//!
//! Converts cost amounts from their invoice currency into the base
//! currency using the exchange rate stored on the cost line.
//!
//! ## Rules
//! - Base currency amounts pass through untouched, rate or no rate.
//! - Foreign amounts require a positive rate; a missing or non-positive
//!   rate is a typed error. The orchestrator degrades that error into a
//!   warning and falls back to the base amount ingestion stored.
//! - The base currency is an explicit constructor argument, fixed for
//!   the process lifetime - never a hidden module-level global.
//!
//! Rates are supplied with the data, not fetched: nothing here performs
//! I/O, so a conversion is reproducible on demand.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};

/// Converts amounts into one fixed base currency.
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    base_currency: String,
}

impl CurrencyNormalizer {
    /// Creates a normalizer for the given base currency code.
    pub fn new(base_currency: impl Into<String>) -> Self {
        CurrencyNormalizer {
            base_currency: base_currency.into(),
        }
    }

    /// The base currency all conversions target.
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Converts `amount` from `currency` into the base currency.
    ///
    /// ## Identity
    /// `to_base(x, base, anything)` returns `x` regardless of the rate.
    ///
    /// ## Errors
    /// [`CoreError::InvalidFxRate`] when `currency` is foreign and
    /// `fx_rate` is absent, zero, or negative.
    pub fn to_base(
        &self,
        amount: Decimal,
        currency: &str,
        fx_rate: Option<Decimal>,
    ) -> CoreResult<Decimal> {
        if currency == self.base_currency {
            return Ok(amount);
        }

        match fx_rate {
            Some(rate) if rate > Decimal::ZERO => Ok(amount * rate),
            _ => Err(CoreError::InvalidFxRate {
                currency: currency.to_string(),
                base: self.base_currency.clone(),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
