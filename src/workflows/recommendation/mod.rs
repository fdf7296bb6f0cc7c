//! AI-assisted vehicle ranking. The catalog and the customer's financial
//! profile are serialized into a prompt, the model's JSON reply is decoded
//! strictly, and the catalog is reordered to match. Malformed replies drive
//! a bounded retry loop with a fixed delay between attempts.

mod catalog;
mod parser;
mod prompt;

pub use catalog::{CatalogError, Vehicle, VehicleCatalog};
pub use parser::{AffordabilityCategory, RankedEntry};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::gemini::{GeminiError, GenerationConfig, TextModel};
use crate::workflows::affordability::{FinancialProfile, FinancingCalculator};

/// How many leading vehicles the advisory mix validation inspects.
const VALIDATION_WINDOW: usize = 9;
/// Expected affordable count in the window for a 2:1 pattern, with slack.
const EXPECTED_AFFORDABLE: i32 = 6;
const AFFORDABLE_TOLERANCE: i32 = 2;
/// Payment-to-budget ratio at or under which a vehicle counts as affordable.
const AFFORDABLE_RATIO: f64 = 0.7;

#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("ranking call failed: {0}")]
    Gemini(#[from] GeminiError),

    #[error("invalid JSON format: {0}")]
    InvalidJsonFormat(String),

    #[error("failed to serialize vehicle payload: {0}")]
    PromptSerialization(#[from] serde_json::Error),

    #[error("maximum retry attempts exceeded")]
    MaxRetriesExceeded,
}

/// Retry and sampling knobs for the ranking call.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub generation: GenerationConfig,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            generation: GenerationConfig {
                temperature: Some(0.3),
                top_k: Some(40),
                top_p: Some(0.95),
                max_output_tokens: Some(8192),
            },
        }
    }
}

/// A catalog vehicle in ranked order. The annotation is present only when
/// the model actually mentioned the vehicle; catalog entries appended after
/// the fact carry no advisory metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedVehicle {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<AffordabilityCategory>,
}

/// Ranking client over the generative model seam.
pub struct VehicleRankingService<M> {
    model: Arc<M>,
    config: RankingConfig,
}

impl<M> VehicleRankingService<M>
where
    M: TextModel,
{
    pub fn new(model: Arc<M>) -> Self {
        Self::with_config(model, RankingConfig::default())
    }

    pub fn with_config(model: Arc<M>, config: RankingConfig) -> Self {
        Self { model, config }
    }

    /// Rank the catalog for the given profile. Retries sequentially on any
    /// failure except a missing credential, which cannot succeed on retry.
    pub async fn rank(
        &self,
        vehicles: &[Vehicle],
        profile: &FinancialProfile,
        tax_rate: f64,
    ) -> Result<Vec<RankedVehicle>, RankingError> {
        for attempt in 1..=self.config.max_retries {
            match self.attempt_ranking(vehicles, profile, tax_rate, attempt).await {
                Ok(ranked) => {
                    info!(attempt, count = ranked.len(), "ranked vehicle catalog");
                    return Ok(ranked);
                }
                Err(RankingError::Gemini(GeminiError::MissingApiKey)) => {
                    return Err(RankingError::Gemini(GeminiError::MissingApiKey));
                }
                Err(err) if attempt == self.config.max_retries => {
                    warn!(attempt, error = %err, "ranking attempt failed; giving up");
                    return Err(match err {
                        RankingError::InvalidJsonFormat(_) => RankingError::MaxRetriesExceeded,
                        other => other,
                    });
                }
                Err(err) => {
                    warn!(attempt, error = %err, "ranking attempt failed; retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }

        Err(RankingError::MaxRetriesExceeded)
    }

    async fn attempt_ranking(
        &self,
        vehicles: &[Vehicle],
        profile: &FinancialProfile,
        tax_rate: f64,
        attempt: u32,
    ) -> Result<Vec<RankedVehicle>, RankingError> {
        let prompt = prompt::build_ranking_prompt(vehicles, profile, tax_rate, attempt > 1)?;
        let reply = self
            .model
            .generate(&prompt, Some(&self.config.generation))
            .await?;

        let entries = parser::parse_ranked(&reply)?;
        let ranked = reorder_catalog(vehicles, entries)?;
        validate_affordability_mix(&ranked, profile, tax_rate);

        Ok(ranked)
    }
}

/// Reorder the catalog to match the model's ranking. Entries that match no
/// catalog vehicle are dropped with a warning; catalog vehicles the model
/// never mentioned are appended at the end in original order. The result
/// must cover the catalog exactly once.
fn reorder_catalog(
    vehicles: &[Vehicle],
    entries: Vec<RankedEntry>,
) -> Result<Vec<RankedVehicle>, RankingError> {
    let mut ranked: Vec<RankedVehicle> = Vec::with_capacity(vehicles.len());
    let mut taken = vec![false; vehicles.len()];

    for entry in entries {
        let matched = vehicles.iter().enumerate().find(|(index, vehicle)| {
            !taken[*index] && vehicle.matches(entry.year, &entry.make, &entry.model, &entry.trim)
        });

        match matched {
            Some((index, vehicle)) => {
                taken[index] = true;
                ranked.push(RankedVehicle {
                    vehicle: vehicle.clone(),
                    reason: Some(entry.reason),
                    category: Some(entry.category),
                });
            }
            None => {
                warn!(
                    year = entry.year,
                    make = %entry.make,
                    model = %entry.model,
                    trim = %entry.trim,
                    "ranked entry matches no catalog vehicle; dropping"
                );
            }
        }
    }

    for (index, vehicle) in vehicles.iter().enumerate() {
        if !taken[index] {
            ranked.push(RankedVehicle {
                vehicle: vehicle.clone(),
                reason: None,
                category: None,
            });
        }
    }

    if ranked.len() != vehicles.len() {
        return Err(RankingError::InvalidJsonFormat(
            "ranked list does not match input vehicle count".to_string(),
        ));
    }

    Ok(ranked)
}

/// Advisory check of the 2:1 affordable/stretch pattern over the leading
/// vehicles, recomputed with default financing terms. Deviations are logged,
/// never rejected.
fn validate_affordability_mix(ranked: &[RankedVehicle], profile: &FinancialProfile, tax_rate: f64) {
    if profile.available_monthly <= 0.0 {
        return;
    }

    let calculator = FinancingCalculator::default();
    let mut affordable = 0i32;
    let mut stretch = 0i32;

    for entry in ranked.iter().take(VALIDATION_WINDOW) {
        let payment =
            calculator.monthly_payment(entry.vehicle.msrp_usd(), profile.credit_score, tax_rate);
        if payment / profile.available_monthly <= AFFORDABLE_RATIO {
            affordable += 1;
        } else {
            stretch += 1;
        }
    }

    info!(affordable, stretch, "affordability mix over leading vehicles");

    if (affordable - EXPECTED_AFFORDABLE).abs() > AFFORDABLE_TOLERANCE {
        warn!(
            affordable,
            expected = EXPECTED_AFFORDABLE,
            "ranking does not follow the 2:1 affordable/stretch pattern"
        );
    }
}
