//! Value types collected while a customer walks the onboarding steps. These
//! mirror what the simulated account-aggregation and credit-bureau links
//! hand back; everything downstream is derived on demand.

use serde::{Deserialize, Serialize};

/// Fraction of monthly income earmarked for savings before spending.
const SAVINGS_RATE: f64 = 0.20;

/// Income and spending summary from the linked bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccountSummary {
    pub annual_income: f64,
    pub average_monthly_spending: f64,
}

impl BankAccountSummary {
    /// Monthly budget left for a car payment: income after the savings
    /// allocation, minus observed spending, floored at zero.
    pub fn spending_capacity(&self) -> f64 {
        let monthly_income = self.annual_income / 12.0;
        let after_savings = monthly_income * (1.0 - SAVINGS_RATE);
        (after_savings - self.average_monthly_spending).max(0.0)
    }

    /// The fixed savings allocation itself.
    pub fn monthly_savings(&self) -> f64 {
        self.annual_income / 12.0 * SAVINGS_RATE
    }
}

/// Credit report summary from the linked bureau.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditReportSummary {
    pub score: u16,
    pub band: String,
    pub top_factors: Vec<String>,
    pub open_accounts: u32,
    pub utilization_percentage: f64,
}

impl CreditReportSummary {
    pub fn rating(&self) -> &'static str {
        if self.score >= 800 {
            "Exceptional"
        } else if self.score >= 740 {
            "Very Good"
        } else if self.score >= 670 {
            "Good"
        } else if self.score >= 580 {
            "Fair"
        } else {
            "Poor"
        }
    }
}

/// Sandbox fixture standing in for the account-aggregation link.
pub fn sandbox_bank_link() -> BankAccountSummary {
    BankAccountSummary {
        annual_income: 134_217.0,
        average_monthly_spending: 7_614.0,
    }
}

/// Sandbox fixture standing in for the credit-bureau link.
pub fn sandbox_credit_report() -> CreditReportSummary {
    CreditReportSummary {
        score: 742,
        band: "Good to Very Good".to_string(),
        top_factors: vec![
            "Low credit utilization (18%)".to_string(),
            "No recent delinquencies".to_string(),
            "Good payment history".to_string(),
            "Established credit age (8+ years)".to_string(),
        ],
        open_accounts: 7,
        utilization_percentage: 18.3,
    }
}
