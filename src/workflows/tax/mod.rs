//! County and sales-tax lookup. A coordinate is reverse-geocoded to a ZIP
//! through the [`PostalCodeResolver`] seam, then the generative model is
//! asked for a two-line `County:`/`Tax:` answer which is parsed leniently.

mod parser;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gemini::{GeminiError, TextModel};

/// Geographic point handed over by the client device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// County and local sales-tax answer for a resolved ZIP code. The tax value
/// is always percentage points (8.25 means 8.25%), never a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxInfo {
    pub county: String,
    pub sales_tax_percentage: f64,
    pub zip_code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TaxLookupError {
    #[error("unable to determine location information")]
    LocationNotFound,

    #[error("tax lookup call failed: {0}")]
    Gemini(#[from] GeminiError),
}

/// Geocoding collaborator: coordinate in, postal code out. The platform
/// geocoder lives outside this service; tests and the demo CLI supply table
/// implementations.
pub trait PostalCodeResolver: Send + Sync {
    fn resolve(&self, location: Coordinates) -> Result<String, TaxLookupError>;
}

/// Offline resolver mapping coordinates to the nearest seeded metro ZIP.
/// Good enough for demos; anything farther than the cutoff is treated as
/// unresolvable.
pub struct MetroTableResolver {
    entries: Vec<(Coordinates, &'static str)>,
    max_distance_degrees: f64,
}

impl MetroTableResolver {
    pub fn with_default_metros() -> Self {
        Self {
            entries: vec![
                (Coordinates { latitude: 30.2672, longitude: -97.7431 }, "78701"),
                (Coordinates { latitude: 32.7767, longitude: -96.7970 }, "75201"),
                (Coordinates { latitude: 29.7604, longitude: -95.3698 }, "77002"),
                (Coordinates { latitude: 41.5868, longitude: -93.6250 }, "50309"),
                (Coordinates { latitude: 34.0522, longitude: -118.2437 }, "90012"),
                (Coordinates { latitude: 40.7128, longitude: -74.0060 }, "10007"),
            ],
            max_distance_degrees: 1.5,
        }
    }
}

impl PostalCodeResolver for MetroTableResolver {
    fn resolve(&self, location: Coordinates) -> Result<String, TaxLookupError> {
        let mut best: Option<(f64, &'static str)> = None;

        for (point, zip) in &self.entries {
            let d_lat = point.latitude - location.latitude;
            let d_lon = point.longitude - location.longitude;
            let distance = (d_lat * d_lat + d_lon * d_lon).sqrt();
            if best.map(|(current, _)| distance < current).unwrap_or(true) {
                best = Some((distance, zip));
            }
        }

        match best {
            Some((distance, zip)) if distance <= self.max_distance_degrees => Ok(zip.to_string()),
            _ => Err(TaxLookupError::LocationNotFound),
        }
    }
}

/// Service composing the geocoding seam and the generative model.
pub struct TaxLookupService<M, P> {
    model: Arc<M>,
    resolver: Arc<P>,
}

impl<M, P> TaxLookupService<M, P>
where
    M: TextModel,
    P: PostalCodeResolver,
{
    pub fn new(model: Arc<M>, resolver: Arc<P>) -> Self {
        Self { model, resolver }
    }

    pub async fn lookup(&self, location: Coordinates) -> Result<TaxInfo, TaxLookupError> {
        let zip = self.resolver.resolve(location)?;
        self.lookup_by_zip(&zip).await
    }

    pub async fn lookup_by_zip(&self, zip: &str) -> Result<TaxInfo, TaxLookupError> {
        let prompt = tax_prompt(zip);
        let reply = self.model.generate(&prompt, None).await?;

        let (county, sales_tax_percentage) = parser::parse_county_tax(&reply);
        if county == parser::UNKNOWN_COUNTY && sales_tax_percentage == 0.0 {
            warn!(%zip, "tax reply did not contain a usable county or tax line");
        }

        info!(%zip, %county, sales_tax_percentage, "resolved county tax");

        Ok(TaxInfo {
            county,
            sales_tax_percentage,
            zip_code: zip.to_string(),
        })
    }
}

fn tax_prompt(zip: &str) -> String {
    format!(
        "For ZIP code {zip} in the United States, provide ONLY the following information in this exact format:\n\
         County: [county name]\n\
         Tax: [sales tax percentage as a number, for example 8.25 for 8.25%, not 0.0825]\n\
         \n\
         Respond with only these two lines, nothing else. The tax should be the percentage value like 8.25, not the decimal 0.0825."
    )
}
