mod amortization;
mod error;
mod insurance;
mod loan;
mod rates;
mod types;
mod valuation;

pub use amortization::{MAX_TERM_MONTHS, amortization_schedule, compute_amortization};
pub use error::{ConfigError, QuoteError};
pub use insurance::{composed_rate, estimate_premium};
pub use loan::{assess_affordability, compare_bank_offers, structure_loan};
pub use rates::{
    AddOnPrices, BankRate, ClaimsMultipliers, ConditionMultipliers, CoverageMultipliers,
    DriverAgeMultipliers, EligibilityLimits, RateTables, ValuationCurve, VehicleAgeMultipliers,
};
pub use types::{
    AddOnId, AffordabilityRequest, AffordabilityResult, Amortization, BankOffer, ClaimsBand,
    Condition, Coverage, DownPayment, DownPaymentMode, DriverAgeBand, InsuranceQuoteRequest,
    InsuranceQuoteResult, LoanQuoteRequest, LoanQuoteResult, ScheduleRow, ValuationPurpose,
    ValuationRequest, ValuationResult, VehicleAgeBand,
};
pub use valuation::{age_factor, depreciation_factor, estimate_value, mileage_factor};

/// Round a currency amount to its minor unit (fils/cents).
pub(crate) fn round_minor(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn round_minor_keeps_two_decimals() {
        assert_eq!(round_minor(1_104.720_578), 1_104.72);
        assert_eq!(round_minor(0.005), 0.01);
        assert_eq!(round_minor(-0.0), 0.0);
    }

    // A bundled insurance premium flows through the same tables into the loan.
    #[test]
    fn insured_financing_bundles_premium_into_principal() {
        let tables = RateTables::default();
        let insurance = estimate_premium(
            &InsuranceQuoteRequest {
                vehicle_value: 75_000.0,
                vehicle_age_band: VehicleAgeBand::TwoToFiveYears,
                driver_age_band: DriverAgeBand::Over35,
                claims_band: ClaimsBand::NoClaims,
                coverage: Coverage::Comprehensive,
                add_ons: BTreeSet::from([AddOnId::AgencyRepair]),
            },
            &tables,
        )
        .expect("valid insurance request");
        // 75,000 * 0.025 * 1.1 * 0.9
        assert_eq!(insurance.base_premium, 1_856.0);
        assert_eq!(insurance.total_premium, 2_356.0);

        let loan = structure_loan(&LoanQuoteRequest {
            vehicle_price: 75_000.0,
            down_payment: DownPayment::percent(20.0),
            term_months: 60,
            annual_rate_percent: 3.99,
            bundled_premium: insurance.total_premium,
        })
        .expect("valid loan request");
        assert_eq!(loan.principal, 62_356.0);
        assert!(loan.periodic_payment > 1_104.72);
    }
}
