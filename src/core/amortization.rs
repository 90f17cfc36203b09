use super::error::{QuoteError, ensure_non_negative};
use super::types::{Amortization, ScheduleRow};

/// Longest financing term accepted, in months (100 years).
pub const MAX_TERM_MONTHS: u32 = 1_200;

pub(crate) fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 12.0 / 100.0
}

fn validate(principal: f64, annual_rate_percent: f64, term_months: u32) -> Result<(), QuoteError> {
    ensure_non_negative("principal", principal)?;
    ensure_non_negative("annualRatePercent", annual_rate_percent)?;
    if term_months == 0 {
        return Err(QuoteError::invalid("termMonths", "must be > 0"));
    }
    if term_months > MAX_TERM_MONTHS {
        return Err(QuoteError::invalid(
            "termMonths",
            format!("must be <= {MAX_TERM_MONTHS}, got {term_months}"),
        ));
    }
    Ok(())
}

// P * r / (1 - (1+r)^-n), evaluated through ln_1p/exp_m1. The discount term
// underflows to zero on long terms or steep rates instead of overflowing, so
// the payment tends to P * r.
fn level_payment(principal: f64, annual_rate_percent: f64, term_months: u32) -> f64 {
    let r = monthly_rate(annual_rate_percent);
    if r == 0.0 {
        return principal / term_months as f64;
    }
    let annuity_factor = -(-(term_months as f64) * r.ln_1p()).exp_m1();
    principal * r / annuity_factor
}

fn ensure_finite(field: &'static str, value: f64) -> Result<f64, QuoteError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QuoteError::invalid(
            field,
            "produces a payment outside the representable range",
        ))
    }
}

/// Reducing-balance payment for a fully amortizing loan. Figures are left
/// unrounded; callers round once when presenting them.
pub fn compute_amortization(
    principal: f64,
    annual_rate_percent: f64,
    term_months: u32,
) -> Result<Amortization, QuoteError> {
    validate(principal, annual_rate_percent, term_months)?;

    let payment = ensure_finite(
        "annualRatePercent",
        level_payment(principal, annual_rate_percent, term_months),
    )?;
    let total_payable = ensure_finite("annualRatePercent", payment * term_months as f64)?;
    // Guards against the last ulp of float error on tiny rates.
    let total_interest = (total_payable - principal).max(0.0);

    Ok(Amortization {
        payment,
        total_interest,
        total_payable: principal + total_interest,
    })
}

/// Period-by-period breakdown of a level-payment loan.
///
/// The last row pays off whatever balance remains so the schedule always
/// closes at exactly zero.
pub fn amortization_schedule(
    principal: f64,
    annual_rate_percent: f64,
    term_months: u32,
) -> Result<Vec<ScheduleRow>, QuoteError> {
    validate(principal, annual_rate_percent, term_months)?;

    let payment = ensure_finite(
        "annualRatePercent",
        level_payment(principal, annual_rate_percent, term_months),
    )?;
    let r = monthly_rate(annual_rate_percent);

    let mut rows = Vec::with_capacity(term_months as usize);
    let mut balance = principal;
    for period in 1..=term_months {
        let interest = balance * r;
        let (principal_part, row_payment) = if period == term_months {
            (balance, balance + interest)
        } else {
            let part = (payment - interest).min(balance);
            (part, payment)
        };
        balance = (balance - principal_part).max(0.0);
        rows.push(ScheduleRow {
            period,
            payment: row_payment,
            interest,
            principal: principal_part,
            balance,
        });
    }

    Ok(rows)
}
