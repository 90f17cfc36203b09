use std::cmp::Ordering;

use super::amortization::compute_amortization;
use super::error::{QuoteError, ensure_non_negative};
use super::rates::RateTables;
use super::round_minor;
use super::types::{
    AffordabilityRequest, AffordabilityResult, BankOffer, DownPaymentMode, LoanQuoteRequest,
    LoanQuoteResult,
};

fn resolve_down_payment(request: &LoanQuoteRequest) -> f64 {
    let requested = match request.down_payment.mode {
        DownPaymentMode::Percent => {
            if request.down_payment.value > 100.0 {
                tracing::warn!(
                    percent = request.down_payment.value,
                    "down payment percent above 100, clamping to vehicle price"
                );
            }
            request.vehicle_price * request.down_payment.value / 100.0
        }
        DownPaymentMode::Amount => request.down_payment.value,
    };
    if requested > request.vehicle_price {
        tracing::warn!(
            down_payment = requested,
            vehicle_price = request.vehicle_price,
            "down payment exceeds vehicle price, clamping"
        );
    }
    requested.min(request.vehicle_price)
}

/// Turn a financing request into a quoted loan.
///
/// A down payment larger than the vehicle price is clamped rather than
/// rejected so a form recalculating on every keystroke keeps producing a
/// quote.
pub fn structure_loan(request: &LoanQuoteRequest) -> Result<LoanQuoteResult, QuoteError> {
    ensure_non_negative("vehiclePrice", request.vehicle_price)?;
    ensure_non_negative("downPayment.value", request.down_payment.value)?;
    ensure_non_negative("bundledPremium", request.bundled_premium)?;

    let down_payment_amount = resolve_down_payment(request);
    let principal =
        (request.vehicle_price - down_payment_amount).max(0.0) + request.bundled_premium;

    let amortization =
        compute_amortization(principal, request.annual_rate_percent, request.term_months)?;

    // Interest share is derived from the principal share so the two always sum to 100.
    let principal_share_percent = if amortization.total_payable > 0.0 {
        (principal / amortization.total_payable * 100.0)
            .round()
            .clamp(0.0, 100.0) as u32
    } else {
        100
    };

    let result = LoanQuoteResult {
        down_payment_amount: round_minor(down_payment_amount),
        principal: round_minor(principal),
        periodic_payment: round_minor(amortization.payment),
        total_interest: round_minor(amortization.total_interest),
        total_payable: round_minor(amortization.total_payable),
        principal_share_percent,
        interest_share_percent: 100 - principal_share_percent,
    };
    tracing::debug!(
        principal = result.principal,
        payment = result.periodic_payment,
        term_months = request.term_months,
        rate = request.annual_rate_percent,
        "structured loan quote"
    );
    Ok(result)
}

/// Quote the same loan at every bank's reference rate, cheapest first.
///
/// The request's own rate is ignored.
pub fn compare_bank_offers(
    request: &LoanQuoteRequest,
    tables: &RateTables,
) -> Result<Vec<BankOffer>, QuoteError> {
    let mut offers = tables
        .banks
        .iter()
        .map(|bank| {
            let at_bank_rate = LoanQuoteRequest {
                annual_rate_percent: bank.annual_rate_percent,
                ..request.clone()
            };
            structure_loan(&at_bank_rate).map(|quote| BankOffer {
                bank: bank.name.clone(),
                annual_rate_percent: bank.annual_rate_percent,
                quote,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    offers.sort_by(|a, b| {
        a.quote
            .periodic_payment
            .partial_cmp(&b.quote.periodic_payment)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.bank.cmp(&b.bank))
    });
    Ok(offers)
}

/// Debt-burden check used by the finance eligibility flow.
pub fn assess_affordability(
    request: &AffordabilityRequest,
    tables: &RateTables,
) -> Result<AffordabilityResult, QuoteError> {
    ensure_non_negative("monthlyIncome", request.monthly_income)?;
    if request.monthly_income == 0.0 {
        return Err(QuoteError::invalid("monthlyIncome", "must be > 0"));
    }
    ensure_non_negative("monthlyObligations", request.monthly_obligations)?;
    ensure_non_negative("proposedPayment", request.proposed_payment)?;

    let cap = tables.eligibility.max_debt_burden_percent;
    let debt_burden_percent =
        (request.monthly_obligations + request.proposed_payment) / request.monthly_income * 100.0;
    let max_affordable_payment =
        (request.monthly_income * cap / 100.0 - request.monthly_obligations).max(0.0);

    Ok(AffordabilityResult {
        debt_burden_percent: round_minor(debt_burden_percent),
        max_debt_burden_percent: cap,
        eligible: debt_burden_percent <= cap,
        max_affordable_payment: round_minor(max_affordable_payment),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DownPayment;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_request() -> LoanQuoteRequest {
        LoanQuoteRequest {
            vehicle_price: 75_000.0,
            down_payment: DownPayment::percent(20.0),
            term_months: 60,
            annual_rate_percent: 3.99,
            bundled_premium: 0.0,
        }
    }

    #[test]
    fn percent_down_payment_resolves_against_price() {
        let quote = structure_loan(&sample_request()).expect("valid request");
        assert_eq!(quote.down_payment_amount, 15_000.0);
        assert_eq!(quote.principal, 60_000.0);
        assert_eq!(quote.periodic_payment, 1_104.72);
        assert_approx_tol(quote.total_payable, 66_283.23, 0.011);
        assert_approx_tol(
            quote.total_payable,
            quote.principal + quote.total_interest,
            0.011,
        );
        assert_eq!(quote.principal_share_percent, 91);
        assert_eq!(quote.interest_share_percent, 9);
    }

    #[test]
    fn amount_down_payment_is_used_as_is() {
        let mut request = sample_request();
        request.down_payment = DownPayment::amount(25_000.0);
        let quote = structure_loan(&request).expect("valid request");
        assert_eq!(quote.principal, 50_000.0);
    }

    #[test]
    fn bundled_premium_is_financed() {
        let mut request = sample_request();
        request.bundled_premium = 2_650.0;
        let quote = structure_loan(&request).expect("valid request");
        assert_eq!(quote.principal, 62_650.0);
    }

    #[test]
    fn oversized_down_payment_clamps_to_bundled_premium() {
        let mut request = sample_request();
        request.down_payment = DownPayment::amount(90_000.0);
        request.bundled_premium = 1_200.0;
        let quote = structure_loan(&request).expect("clamped, not rejected");
        assert_eq!(quote.down_payment_amount, 75_000.0);
        assert_eq!(quote.principal, 1_200.0);

        request.down_payment = DownPayment::percent(150.0);
        request.bundled_premium = 0.0;
        let quote = structure_loan(&request).expect("clamped, not rejected");
        assert_eq!(quote.principal, 0.0);
        assert_eq!(quote.periodic_payment, 0.0);
        assert_eq!(quote.principal_share_percent, 100);
        assert_eq!(quote.interest_share_percent, 0);
    }

    #[test]
    fn zero_rate_loan_has_no_interest_share() {
        let mut request = sample_request();
        request.annual_rate_percent = 0.0;
        let quote = structure_loan(&request).expect("valid request");
        assert_eq!(quote.periodic_payment, 1_000.0);
        assert_eq!(quote.total_interest, 0.0);
        assert_eq!(quote.principal_share_percent, 100);
    }

    #[test]
    fn long_term_loan_quotes_finite_figures() {
        let mut request = sample_request();
        request.annual_rate_percent = 12.0;
        request.term_months = 1_200;
        let quote = structure_loan(&request).expect("valid request");
        assert_eq!(quote.periodic_payment, 600.0);
        assert!(quote.total_interest > 600_000.0);
        assert_approx_tol(
            quote.total_payable,
            quote.principal + quote.total_interest,
            0.011,
        );
        assert_eq!(quote.principal_share_percent, 8);
        assert_eq!(quote.interest_share_percent, 92);

        request.term_months = 100_000;
        let err = structure_loan(&request).expect_err("term beyond limit");
        assert_eq!(err.field(), "termMonths");
    }

    #[test]
    fn rejects_negative_inputs() {
        let mut request = sample_request();
        request.vehicle_price = -1.0;
        assert_eq!(
            structure_loan(&request).expect_err("negative price").field(),
            "vehiclePrice"
        );

        let mut request = sample_request();
        request.down_payment = DownPayment::amount(-5.0);
        assert_eq!(
            structure_loan(&request).expect_err("negative down payment").field(),
            "downPayment.value"
        );

        let mut request = sample_request();
        request.bundled_premium = -100.0;
        assert!(structure_loan(&request).is_err());

        let mut request = sample_request();
        request.term_months = 0;
        assert_eq!(
            structure_loan(&request).expect_err("zero term").field(),
            "termMonths"
        );
    }

    #[test]
    fn loan_result_serializes_camel_case_fields() {
        let quote = structure_loan(&sample_request()).expect("valid request");
        let json = serde_json::to_string(&quote).expect("result should serialize");
        assert!(json.contains("\"periodicPayment\""));
        assert!(json.contains("\"totalInterest\""));
        assert!(json.contains("\"principalSharePercent\""));
        assert!(json.contains("\"interestSharePercent\""));
    }

    #[test]
    fn bank_offers_are_sorted_cheapest_first() {
        let tables = RateTables::default();
        let mut request = sample_request();
        request.annual_rate_percent = 99.0;
        let offers = compare_bank_offers(&request, &tables).expect("valid request");

        assert_eq!(offers.len(), tables.banks.len());
        assert_eq!(offers[0].bank, "Emirates NBD");
        assert_eq!(offers[0].quote.periodic_payment, 1_104.72);
        for pair in offers.windows(2) {
            assert!(pair[0].quote.periodic_payment <= pair[1].quote.periodic_payment);
            assert!(pair[0].annual_rate_percent <= pair[1].annual_rate_percent);
        }

        let json = serde_json::to_string(&offers[0]).expect("offer should serialize");
        assert!(json.contains("\"bank\""));
        assert!(json.contains("\"periodicPayment\""));
    }

    #[test]
    fn bank_offers_propagate_validation_errors() {
        let mut request = sample_request();
        request.term_months = 0;
        assert!(compare_bank_offers(&request, &RateTables::default()).is_err());
    }

    #[test]
    fn affordability_applies_debt_burden_cap() {
        let tables = RateTables::default();
        let request = AffordabilityRequest {
            monthly_income: 20_000.0,
            monthly_obligations: 6_000.0,
            proposed_payment: 3_000.0,
        };
        let result = assess_affordability(&request, &tables).expect("valid request");
        assert_eq!(result.debt_burden_percent, 45.0);
        assert!(result.eligible);
        assert_eq!(result.max_affordable_payment, 4_000.0);

        let request = AffordabilityRequest {
            proposed_payment: 4_500.0,
            ..request
        };
        let result = assess_affordability(&request, &tables).expect("valid request");
        assert!(!result.eligible);
        assert_eq!(result.debt_burden_percent, 52.5);
    }

    #[test]
    fn affordability_never_reports_negative_headroom() {
        let request = AffordabilityRequest {
            monthly_income: 8_000.0,
            monthly_obligations: 5_000.0,
            proposed_payment: 0.0,
        };
        let result = assess_affordability(&request, &RateTables::default()).expect("valid");
        assert_eq!(result.max_affordable_payment, 0.0);
        assert!(!result.eligible);
    }

    #[test]
    fn affordability_rejects_zero_income() {
        let request = AffordabilityRequest {
            monthly_income: 0.0,
            monthly_obligations: 0.0,
            proposed_payment: 1_000.0,
        };
        let err = assess_affordability(&request, &RateTables::default()).expect_err("zero income");
        assert_eq!(err.field(), "monthlyIncome");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(200))]

        #[test]
        fn prop_larger_down_payment_never_raises_payment(
            price in 0u32..1_000_000,
            low_down in 0u32..1_200_000,
            extra_down in 0u32..500_000,
            rate_bp in 0u32..2_500,
            term in 1u32..97,
            premium in 0u32..10_000
        ) {
            let base = LoanQuoteRequest {
                vehicle_price: price as f64,
                down_payment: DownPayment::amount(low_down as f64),
                term_months: term,
                annual_rate_percent: rate_bp as f64 / 100.0,
                bundled_premium: premium as f64,
            };
            let larger = LoanQuoteRequest {
                down_payment: DownPayment::amount((low_down + extra_down) as f64),
                ..base.clone()
            };
            let a = structure_loan(&base).expect("valid request");
            let b = structure_loan(&larger).expect("valid request");
            prop_assert!(b.periodic_payment <= a.periodic_payment);
        }

        #[test]
        fn prop_principal_is_never_below_bundled_premium(
            price in 0u32..1_000_000,
            down_pct in 0u32..300,
            premium in 0u32..10_000,
            term in 1u32..97
        ) {
            let request = LoanQuoteRequest {
                vehicle_price: price as f64,
                down_payment: DownPayment::percent(down_pct as f64),
                term_months: term,
                annual_rate_percent: 4.5,
                bundled_premium: premium as f64,
            };
            let quote = structure_loan(&request).expect("valid request");
            prop_assert!(quote.principal >= premium as f64);
            prop_assert_eq!(quote.principal_share_percent + quote.interest_share_percent, 100);
            prop_assert!(
                (quote.total_payable - (quote.principal + quote.total_interest)).abs() <= 0.011
            );
        }

        #[test]
        fn prop_structuring_is_deterministic(
            price in 0u32..1_000_000,
            down_pct in 0u32..100,
            rate_bp in 0u32..2_500,
            term in 1u32..97
        ) {
            let request = LoanQuoteRequest {
                vehicle_price: price as f64,
                down_payment: DownPayment::percent(down_pct as f64),
                term_months: term,
                annual_rate_percent: rate_bp as f64 / 100.0,
                bundled_premium: 0.0,
            };
            prop_assert_eq!(structure_loan(&request), structure_loan(&request));
        }
    }
}
