use super::error::{QuoteError, ensure_non_negative};
use super::rates::RateTables;
use super::types::{InsuranceQuoteRequest, InsuranceQuoteResult};

/// Annual rate as a fraction of vehicle value after every risk multiplier.
pub fn composed_rate(request: &InsuranceQuoteRequest, tables: &RateTables) -> f64 {
    tables.base_comprehensive_rate
        * tables.coverage_multiplier(request.coverage)
        * tables.vehicle_age_multiplier(request.vehicle_age_band)
        * tables.driver_age_multiplier(request.driver_age_band)
        * tables.claims_multiplier(request.claims_band)
}

pub fn estimate_premium(
    request: &InsuranceQuoteRequest,
    tables: &RateTables,
) -> Result<InsuranceQuoteResult, QuoteError> {
    ensure_non_negative("vehicleValue", request.vehicle_value)?;

    let rate = composed_rate(request, tables);
    let base_premium = (request.vehicle_value * rate).round();
    let add_on_total: f64 = request
        .add_ons
        .iter()
        .map(|id| tables.add_on_price(*id))
        .sum();
    let total_premium = base_premium + add_on_total;

    let result = InsuranceQuoteResult {
        composed_rate: rate,
        base_premium,
        add_on_total,
        total_premium,
        monthly_equivalent: (total_premium / 12.0).round(),
    };
    tracing::debug!(
        coverage = %request.coverage,
        vehicle_age = %request.vehicle_age_band,
        driver_age = %request.driver_age_band,
        claims = %request.claims_band,
        add_ons = request.add_ons.len(),
        total = result.total_premium,
        "estimated insurance premium"
    );
    Ok(result)
}
