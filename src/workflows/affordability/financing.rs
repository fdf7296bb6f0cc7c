//! Loan and lease payment math. All methods are pure given the calculator
//! configuration; the caller mutates the fields between computations (term
//! selection, lease toggle, down-payment slider).

use serde::{Deserialize, Serialize};

/// Residual value after a 36-month lease, as a fraction of MSRP.
const LEASE_RESIDUAL_FRACTION: f64 = 0.55;
/// Money-factor stand-in for the simplified lease model (~5% APR equivalent).
const LEASE_FINANCE_FACTOR: f64 = 0.002;

/// Financing terms used for payment estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingCalculator {
    pub down_payment_percentage: f64,
    pub lease_mode: bool,
    pub loan_term_months: u32,
    pub lease_term_months: u32,
}

impl Default for FinancingCalculator {
    fn default() -> Self {
        Self {
            down_payment_percentage: 10.0,
            lease_mode: false,
            loan_term_months: 60,
            lease_term_months: 36,
        }
    }
}

impl FinancingCalculator {
    /// Tiered APR lookup by credit score.
    pub fn apr_for(credit_score: u16) -> f64 {
        if credit_score >= 750 {
            3.99
        } else if credit_score >= 700 {
            5.49
        } else if credit_score >= 650 {
            7.99
        } else {
            11.99
        }
    }

    pub fn credit_tier(credit_score: u16) -> &'static str {
        if credit_score >= 750 {
            "Excellent"
        } else if credit_score >= 700 {
            "Very Good"
        } else if credit_score >= 650 {
            "Good"
        } else {
            "Poor"
        }
    }

    /// Estimated monthly payment for the configured mode and terms.
    pub fn monthly_payment(&self, msrp: f64, credit_score: u16, tax_rate: f64) -> f64 {
        let msrp = sanitize(msrp);
        let tax_rate = sanitize(tax_rate);

        if self.lease_mode {
            return self.lease_payment(msrp, tax_rate);
        }

        let total_price = self.total_price(msrp, tax_rate);
        let principal = total_price - self.down_payment_amount(msrp, tax_rate);
        amortized_payment(principal, Self::apr_for(credit_score), self.loan_term_months)
    }

    /// Simplified lease model: straight-line depreciation to a 55% residual,
    /// a flat finance factor on (cap cost + residual), and tax on both
    /// monthly charges.
    fn lease_payment(&self, msrp: f64, tax_rate: f64) -> f64 {
        let residual_value = msrp * LEASE_RESIDUAL_FRACTION;
        let depreciation = msrp - residual_value;
        let down_payment = self.down_payment_amount(msrp, tax_rate);

        let monthly_depreciation = (depreciation - down_payment) / f64::from(self.lease_term_months);
        let monthly_finance_charge = (msrp + residual_value) * LEASE_FINANCE_FACTOR;
        let monthly_tax = (monthly_depreciation + monthly_finance_charge) * (tax_rate / 100.0);

        monthly_depreciation + monthly_finance_charge + monthly_tax
    }

    pub fn down_payment_amount(&self, msrp: f64, tax_rate: f64) -> f64 {
        self.total_price(msrp, tax_rate) * (self.down_payment_percentage / 100.0)
    }

    pub fn total_price(&self, msrp: f64, tax_rate: f64) -> f64 {
        sanitize(msrp) * (1.0 + sanitize(tax_rate) / 100.0)
    }
}

/// Standard amortization formula `P*r*(1+r)^n / ((1+r)^n - 1)` with a
/// straight division when the monthly rate is zero.
pub fn amortized_payment(principal: f64, apr: f64, term_months: u32) -> f64 {
    let monthly_rate = apr / 100.0 / 12.0;
    let n = f64::from(term_months);

    if monthly_rate == 0.0 {
        return principal / n;
    }

    let growth = (1.0 + monthly_rate).powf(n);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Payment inputs arrive from sliders and parsed AI output; treat anything
/// non-finite or negative as zero rather than letting it poison the math.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apr_tiers_follow_credit_score() {
        assert_eq!(FinancingCalculator::apr_for(800), 3.99);
        assert_eq!(FinancingCalculator::apr_for(750), 3.99);
        assert_eq!(FinancingCalculator::apr_for(749), 5.49);
        assert_eq!(FinancingCalculator::apr_for(700), 5.49);
        assert_eq!(FinancingCalculator::apr_for(650), 7.99);
        assert_eq!(FinancingCalculator::apr_for(649), 11.99);
        assert_eq!(FinancingCalculator::apr_for(300), 11.99);
    }

    #[test]
    fn zero_rate_amortization_is_straight_division() {
        assert_eq!(amortized_payment(36_000.0, 0.0, 60), 600.0);
    }

    #[test]
    fn sanitize_clamps_hostile_inputs() {
        let calc = FinancingCalculator::default();
        assert_eq!(calc.total_price(-30_000.0, 8.25), 0.0);
        assert_eq!(calc.total_price(30_000.0, f64::NAN), 30_000.0);
        assert_eq!(calc.monthly_payment(f64::INFINITY, 720, 8.25), 0.0);
    }
}
