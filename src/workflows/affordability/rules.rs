//! Piecewise-linear banding for the four score factors. Each component maps
//! its input onto [0,100]; `normalized` interpolates within the band to hit
//! the documented sub-range.

/// Credit score component.
/// Excellent (750+): 95-100, Very Good (700-749): 80-94, Good (650-699):
/// 65-79, Fair (600-649): 50-64, Poor (<600): 0-49.
pub(crate) fn credit_component(credit_score: u16) -> f64 {
    let score = f64::from(credit_score);
    match credit_score {
        750.. => {
            let normalized = ((score - 750.0) / 100.0).min(1.0);
            95.0 + normalized * 5.0
        }
        700..=749 => {
            let normalized = (score - 700.0) / 50.0;
            80.0 + normalized * 14.0
        }
        650..=699 => {
            let normalized = (score - 650.0) / 50.0;
            65.0 + normalized * 14.0
        }
        600..=649 => {
            let normalized = (score - 600.0) / 50.0;
            50.0 + normalized * 14.0
        }
        _ => {
            let normalized = ((score - 300.0).max(0.0)) / 300.0;
            normalized * 49.0
        }
    }
}

/// Annual income component.
/// $180K+: 90-100, $140K-$179K: 75-89, $100K-$139K: 60-74, $70K-$99K: 40-59,
/// below $70K: 20-39.
pub(crate) fn income_component(income: f64) -> f64 {
    if income >= 180_000.0 {
        let normalized = ((income - 180_000.0) / 120_000.0).min(1.0);
        90.0 + normalized * 10.0
    } else if income >= 140_000.0 {
        let normalized = (income - 140_000.0) / 40_000.0;
        75.0 + normalized * 14.0
    } else if income >= 100_000.0 {
        let normalized = (income - 100_000.0) / 40_000.0;
        60.0 + normalized * 14.0
    } else if income >= 70_000.0 {
        let normalized = (income - 70_000.0) / 30_000.0;
        40.0 + normalized * 19.0
    } else {
        let normalized = (income / 70_000.0).clamp(0.0, 1.0);
        20.0 + normalized * 19.0
    }
}

/// Payment-capacity component, driven by available monthly budget as a
/// percentage of monthly income. 12%+: 90-100, 9-11%: 75-89, 6-8%: 60-74,
/// 3-5%: 40-59, below 3%: 20-39. Zero monthly income scores 0.
pub(crate) fn payment_capacity_component(available_monthly: f64, income: f64) -> f64 {
    let monthly_income = income / 12.0;
    if monthly_income <= 0.0 {
        return 0.0;
    }

    let payment_ratio = (available_monthly / monthly_income) * 100.0;
    ratio_band(payment_ratio, 12.0, 8.0, 3.0)
}

/// Savings component, driven by monthly savings as a percentage of monthly
/// income. 20%+: 90-100, 15-19%: 75-89, 10-14%: 60-74, 5-9%: 40-59, below
/// 5%: 20-39. Zero monthly income scores 0.
pub(crate) fn savings_component(monthly_savings: f64, income: f64) -> f64 {
    let monthly_income = income / 12.0;
    if monthly_income <= 0.0 {
        return 0.0;
    }

    let savings_ratio = (monthly_savings / monthly_income) * 100.0;
    ratio_band(savings_ratio, 20.0, 10.0, 5.0)
}

/// Shared five-band ladder for ratio-based factors. `top` starts the
/// excellent band, `top_span` is its interpolation width, and `step` is the
/// width of each band below it.
fn ratio_band(ratio: f64, top: f64, top_span: f64, step: f64) -> f64 {
    if ratio >= top {
        let normalized = ((ratio - top) / top_span).min(1.0);
        90.0 + normalized * 10.0
    } else if ratio >= top - step {
        let normalized = (ratio - (top - step)) / step;
        75.0 + normalized * 14.0
    } else if ratio >= top - 2.0 * step {
        let normalized = (ratio - (top - 2.0 * step)) / step;
        60.0 + normalized * 14.0
    } else if ratio >= top - 3.0 * step {
        let normalized = (ratio - (top - 3.0 * step)) / step;
        40.0 + normalized * 19.0
    } else {
        let normalized = (ratio / (top - 3.0 * step)).clamp(0.0, 1.0);
        20.0 + normalized * 19.0
    }
}
