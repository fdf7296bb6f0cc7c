//! Linear onboarding flow: location, bank-account link, credit-bureau link,
//! done. The session accumulates whatever the customer granted and derives
//! the financial profile (with documented fallbacks) on demand.

mod domain;

pub use domain::{
    sandbox_bank_link, sandbox_credit_report, BankAccountSummary, CreditReportSummary,
};

use serde::{Deserialize, Serialize};

use crate::workflows::affordability::{self, FinancialProfile, FinancingCalculator};
use crate::workflows::recommendation::Vehicle;
use crate::workflows::tax::TaxInfo;

// Fallbacks for customers who skipped a link step.
const FALLBACK_ANNUAL_INCOME: f64 = 100_000.0;
const FALLBACK_CREDIT_SCORE: u16 = 650;
const FALLBACK_AVAILABLE_MONTHLY: f64 = 1_000.0;
const FALLBACK_MONTHLY_SAVINGS: f64 = 500.0;

// Pre-approval uses its own, slightly more generous fallbacks.
const PREAPPROVAL_FALLBACK_TAX: f64 = 8.25;
const PREAPPROVAL_FALLBACK_CREDIT: u16 = 700;
const PREAPPROVAL_FALLBACK_AVAILABLE: f64 = 1_400.0;
const PREAPPROVAL_MAX_RATIO: f64 = 0.75;
const PREAPPROVAL_MIN_SCORE: u8 = 80;

/// Steps of the onboarding flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Welcome,
    Location,
    BankLink,
    CreditCheck,
    Complete,
}

impl OnboardingStep {
    const ALL: [OnboardingStep; 5] = [
        OnboardingStep::Welcome,
        OnboardingStep::Location,
        OnboardingStep::BankLink,
        OnboardingStep::CreditCheck,
        OnboardingStep::Complete,
    ];

    fn index(&self) -> usize {
        Self::ALL.iter().position(|step| step == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Fraction of the flow completed, 0.0 at welcome, 1.0 at completion.
    pub fn progress(&self) -> f64 {
        self.index() as f64 / (Self::ALL.len() - 1) as f64
    }

    pub fn label(&self) -> &'static str {
        match self {
            OnboardingStep::Welcome => "Welcome",
            OnboardingStep::Location => "Location",
            OnboardingStep::BankLink => "Bank Link",
            OnboardingStep::CreditCheck => "Credit Check",
            OnboardingStep::Complete => "Complete",
        }
    }
}

/// Per-customer onboarding state. Plain mutable value type; the caller owns
/// serialization of concurrent access (one session, one flow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingSession {
    pub step: OnboardingStep,
    pub tax: Option<TaxInfo>,
    pub bank: Option<BankAccountSummary>,
    pub credit: Option<CreditReportSummary>,
}

impl Default for OnboardingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingSession {
    pub fn new() -> Self {
        Self {
            step: OnboardingStep::Welcome,
            tax: None,
            bank: None,
            credit: None,
        }
    }

    /// Move to the next step; completion is terminal.
    pub fn advance(&mut self) {
        if let Some(next) = self.step.next() {
            self.step = next;
        }
    }

    /// Skipping and completing a step both just advance; the session keeps
    /// whatever data was (not) collected.
    pub fn skip_current(&mut self) {
        self.advance();
    }

    pub fn record_tax(&mut self, tax: TaxInfo) {
        self.tax = Some(tax);
    }

    pub fn link_bank(&mut self, summary: BankAccountSummary) {
        self.bank = Some(summary);
    }

    pub fn link_credit(&mut self, report: CreditReportSummary) {
        self.credit = Some(report);
    }

    /// Financial profile for scoring and ranking, with fallbacks for every
    /// step the customer skipped. Recomputed on every call so upstream
    /// changes are always reflected.
    pub fn financial_profile(&self) -> FinancialProfile {
        let (annual_income, available_monthly, monthly_savings) = match &self.bank {
            Some(bank) => (
                bank.annual_income,
                bank.spending_capacity(),
                bank.monthly_savings(),
            ),
            None => (
                FALLBACK_ANNUAL_INCOME,
                FALLBACK_AVAILABLE_MONTHLY,
                FALLBACK_MONTHLY_SAVINGS,
            ),
        };

        FinancialProfile {
            annual_income,
            credit_score: self
                .credit
                .as_ref()
                .map(|credit| credit.score)
                .unwrap_or(FALLBACK_CREDIT_SCORE),
            available_monthly,
            monthly_savings,
        }
    }

    pub fn score(&self) -> u8 {
        affordability::calculate_score(&self.financial_profile())
    }

    /// Pre-approval: the estimated payment stays under 75% of the available
    /// budget and the composite score reaches 80.
    pub fn is_pre_approved(&self, vehicle: &Vehicle, calculator: &FinancingCalculator) -> bool {
        let tax_rate = self
            .tax
            .as_ref()
            .map(|tax| tax.sales_tax_percentage)
            .unwrap_or(PREAPPROVAL_FALLBACK_TAX);
        let credit_score = self
            .credit
            .as_ref()
            .map(|credit| credit.score)
            .unwrap_or(PREAPPROVAL_FALLBACK_CREDIT);
        let available_monthly = self
            .bank
            .as_ref()
            .map(|bank| bank.spending_capacity())
            .unwrap_or(PREAPPROVAL_FALLBACK_AVAILABLE);

        if available_monthly <= 0.0 {
            return false;
        }

        let payment = calculator.monthly_payment(vehicle.msrp_usd(), credit_score, tax_rate);
        let ratio = payment / available_monthly;

        ratio < PREAPPROVAL_MAX_RATIO && self.score() >= PREAPPROVAL_MIN_SCORE
    }
}
