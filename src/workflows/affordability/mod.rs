//! Composite affordability scoring: four banded factors combined with fixed
//! weights into a 0-100 readiness rating, plus the financing payment math
//! the rating and the recommendation workflow both lean on.

mod financing;
mod rules;

pub use financing::{amortized_payment, FinancingCalculator};

use serde::{Deserialize, Serialize};

const CREDIT_WEIGHT: f64 = 0.40;
const INCOME_WEIGHT: f64 = 0.25;
const PAYMENT_CAPACITY_WEIGHT: f64 = 0.20;
const SAVINGS_WEIGHT: f64 = 0.15;

/// Financial snapshot the scoring engine consumes. Derived from upstream
/// account/credit links, never persisted; plain value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub annual_income: f64,
    pub credit_score: u16,
    pub available_monthly: f64,
    pub monthly_savings: f64,
}

/// Traffic-light banding over the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Green,
    Yellow,
    Red,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        if score >= 75 {
            ScoreBand::Green
        } else if score >= 50 {
            ScoreBand::Yellow
        } else {
            ScoreBand::Red
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Green => "green",
            ScoreBand::Yellow => "yellow",
            ScoreBand::Red => "red",
        }
    }
}

/// The factors feeding the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    CreditScore,
    Income,
    PaymentCapacity,
    Savings,
}

/// Discrete contribution to the composite score, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub value: f64,
    pub weight: f64,
    pub notes: String,
}

/// Weighted composite score, rounded and clamped to [0,100].
pub fn calculate_score(profile: &FinancialProfile) -> u8 {
    let total: f64 = score_breakdown(profile)
        .iter()
        .map(|component| component.value * component.weight)
        .sum();

    total.round().clamp(0.0, 100.0) as u8
}

/// Per-factor components behind [`calculate_score`], in weight order.
pub fn score_breakdown(profile: &FinancialProfile) -> Vec<ScoreComponent> {
    let credit = rules::credit_component(profile.credit_score);
    let income = rules::income_component(profile.annual_income);
    let payment =
        rules::payment_capacity_component(profile.available_monthly, profile.annual_income);
    let savings = rules::savings_component(profile.monthly_savings, profile.annual_income);

    vec![
        ScoreComponent {
            factor: ScoreFactor::CreditScore,
            value: credit,
            weight: CREDIT_WEIGHT,
            notes: format!(
                "credit score {} ({})",
                profile.credit_score,
                FinancingCalculator::credit_tier(profile.credit_score)
            ),
        },
        ScoreComponent {
            factor: ScoreFactor::Income,
            value: income,
            weight: INCOME_WEIGHT,
            notes: format!("annual income ${:.0}", profile.annual_income),
        },
        ScoreComponent {
            factor: ScoreFactor::PaymentCapacity,
            value: payment,
            weight: PAYMENT_CAPACITY_WEIGHT,
            notes: format!("available monthly budget ${:.0}", profile.available_monthly),
        },
        ScoreComponent {
            factor: ScoreFactor::Savings,
            value: savings,
            weight: SAVINGS_WEIGHT,
            notes: format!("monthly savings ${:.0}", profile.monthly_savings),
        },
    ]
}

/// Human-readable rating for a composite score.
pub fn score_description(score: u8) -> &'static str {
    match score {
        90..=100 => "Exceptional",
        75..=89 => "Excellent",
        60..=74 => "Very Good",
        50..=59 => "Good",
        35..=49 => "Fair",
        _ => "Needs Improvement",
    }
}
