//! Resale and trade-in valuation bands.
//!
//! The undamaged base value starts from a reference new price and is
//! depreciated by age and excess mileage. Condition and body damage then pull
//! the estimate down from that base, so the low end of the band can never
//! exceed it.

use super::error::{QuoteError, ensure_non_negative};
use super::rates::{RateTables, ValuationCurve};
use super::types::{ValuationPurpose, ValuationRequest, ValuationResult};

const EARLIEST_MODEL_YEAR: u32 = 1900;

/// Fraction of the reference price left after `age_years` of depreciation.
pub fn age_factor(curve: &ValuationCurve, age_years: u32) -> f64 {
    if age_years == 0 {
        return 1.0;
    }
    let later_years = (1.0 - curve.annual_depreciation).powf(f64::from(age_years - 1));
    (1.0 - curve.first_year_depreciation) * later_years
}

/// Multiplier for kilometres driven beyond the expected annual allowance.
pub fn mileage_factor(curve: &ValuationCurve, age_years: u32, mileage: f64) -> f64 {
    let allowance = curve.expected_annual_mileage * age_years.max(1) as f64;
    let excess = (mileage - allowance).max(0.0);
    let penalty =
        (excess / 10_000.0 * curve.mileage_penalty_per_10k).min(curve.max_mileage_penalty);
    1.0 - penalty
}

/// Combined age and mileage depreciation, floored at the residual value.
pub fn depreciation_factor(curve: &ValuationCurve, age_years: u32, mileage: f64) -> f64 {
    (age_factor(curve, age_years) * mileage_factor(curve, age_years, mileage))
        .max(curve.residual_floor)
}

fn validate(request: &ValuationRequest, as_of_year: u32) -> Result<(), QuoteError> {
    if request.list_price.is_none() && request.make.trim().is_empty() {
        return Err(QuoteError::invalid("make", "must not be empty"));
    }
    if request.model.trim().is_empty() {
        return Err(QuoteError::invalid("model", "must not be empty"));
    }
    if request.year < EARLIEST_MODEL_YEAR {
        return Err(QuoteError::invalid(
            "year",
            format!("must be >= {EARLIEST_MODEL_YEAR}, got {}", request.year),
        ));
    }
    if request.year > as_of_year {
        return Err(QuoteError::invalid(
            "year",
            format!("must not be after {as_of_year}, got {}", request.year),
        ));
    }
    ensure_non_negative("mileage", request.mileage)?;
    if let Some(price) = request.list_price {
        ensure_non_negative("listPrice", price)?;
    }
    Ok(())
}

pub fn estimate_value(
    request: &ValuationRequest,
    tables: &RateTables,
) -> Result<ValuationResult, QuoteError> {
    let curve = &tables.valuation;
    let as_of_year = request.as_of_year.unwrap_or(curve.reference_year);
    validate(request, as_of_year)?;

    let age_years = as_of_year - request.year;
    let reference = request
        .list_price
        .unwrap_or_else(|| tables.reference_price(&request.make));
    let base = reference * depreciation_factor(curve, age_years, request.mileage);

    let damage_fraction = (request.damage_area_count as f64 * curve.damage_deduction_per_area)
        .min(curve.max_damage_deduction);
    let mut estimate =
        (base * tables.condition_multiplier(request.condition) - base * damage_fraction).max(0.0);
    if request.purpose == ValuationPurpose::TradeIn {
        estimate *= curve.trade_in_multiplier;
    }

    let result = ValuationResult {
        purpose: request.purpose,
        base_value: base.round(),
        low: estimate.round(),
        high: (estimate * curve.band_spread).round(),
    };
    tracing::debug!(
        make = %request.make,
        model = %request.model,
        year = request.year,
        condition = %request.condition,
        damage_areas = request.damage_area_count,
        low = result.low,
        high = result.high,
        "estimated vehicle value"
    );
    Ok(result)
}
