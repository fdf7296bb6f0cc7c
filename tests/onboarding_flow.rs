//! Specifications for the onboarding session: step progression, derived
//! profiles with fallbacks, and the pre-approval rule.

use drivematch::workflows::affordability::{FinancingCalculator, ScoreBand};
use drivematch::workflows::onboarding::{
    sandbox_bank_link, sandbox_credit_report, OnboardingSession, OnboardingStep,
};
use drivematch::workflows::recommendation::Vehicle;
use drivematch::workflows::tax::TaxInfo;

fn vehicle_priced(msrp: f64) -> Vehicle {
    Vehicle {
        year: 2025,
        make: "Toyota".to_string(),
        model: "Camry".to_string(),
        trim: "LE".to_string(),
        msrp_usd_est: msrp,
        horsepower_hp: Some(225),
        drivetrain: "FWD".to_string(),
        powertrain: "Hybrid".to_string(),
        body_style: "Sedan".to_string(),
        image_url: "https://img.example.com/camry-le.jpg".to_string(),
    }
}

fn completed_session() -> OnboardingSession {
    let mut session = OnboardingSession::new();
    session.advance();
    session.record_tax(TaxInfo {
        county: "Travis County".to_string(),
        sales_tax_percentage: 8.25,
        zip_code: "78701".to_string(),
    });
    session.advance();
    session.link_bank(sandbox_bank_link());
    session.advance();
    session.link_credit(sandbox_credit_report());
    session.advance();
    session
}

#[test]
fn full_walkthrough_ends_complete_with_sandbox_score() {
    let session = completed_session();
    assert_eq!(session.step, OnboardingStep::Complete);
    assert_eq!(session.step.progress(), 1.0);
    assert_eq!(session.score(), 86);
}

#[test]
fn progress_is_quartered_across_steps() {
    let mut session = OnboardingSession::new();
    let mut seen = vec![session.step.progress()];
    while session.step != OnboardingStep::Complete {
        session.advance();
        seen.push(session.step.progress());
    }
    assert_eq!(seen, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn skipping_every_link_still_produces_a_score() {
    let mut session = OnboardingSession::new();
    while session.step != OnboardingStep::Complete {
        session.skip_current();
    }

    // Fallback profile: 100K income, 650 credit, $1,000 available, $500 saved.
    let profile = session.financial_profile();
    assert_eq!(profile.annual_income, 100_000.0);
    assert_eq!(profile.credit_score, 650);

    let score = session.score();
    assert_eq!(ScoreBand::for_score(score), ScoreBand::Yellow);
    assert!(score < 80, "fallback profile must not clear pre-approval");
}

#[test]
fn sandbox_links_are_pre_approved_for_midrange_vehicles() {
    let session = completed_session();
    let calculator = FinancingCalculator::default();

    assert!(session.is_pre_approved(&vehicle_priced(28_700.0), &calculator));
}

#[test]
fn expensive_vehicles_fail_the_payment_ratio_gate() {
    let session = completed_session();
    let calculator = FinancingCalculator::default();

    assert!(!session.is_pre_approved(&vehicle_priced(75_000.0), &calculator));
}

#[test]
fn skipped_links_fail_the_score_gate() {
    let mut session = OnboardingSession::new();
    while session.step != OnboardingStep::Complete {
        session.skip_current();
    }
    let calculator = FinancingCalculator::default();

    // Payment fits the fallback budget, but the fallback score lands in the
    // yellow band, below the pre-approval floor of 80.
    assert!(!session.is_pre_approved(&vehicle_priced(22_325.0), &calculator));
}
