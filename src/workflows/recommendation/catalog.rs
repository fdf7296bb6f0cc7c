//! Static vehicle catalog. The catalog is a JSON array of vehicle records
//! loaded once at startup; records are immutable afterwards and identified
//! by (year, make, model, trim) for matching purposes.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read vehicle catalog: {}", err),
            CatalogError::Json(err) => write!(f, "invalid vehicle catalog data: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// A single catalog record. `msrp_usd_est` carries the sticker estimate the
/// payment math runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub year: u16,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub msrp_usd_est: f64,
    pub horsepower_hp: Option<u32>,
    pub drivetrain: String,
    pub powertrain: String,
    pub body_style: String,
    pub image_url: String,
}

impl Vehicle {
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    pub fn full_name(&self) -> String {
        format!("{} {} {} {}", self.year, self.make, self.model, self.trim)
    }

    pub fn msrp_usd(&self) -> f64 {
        self.msrp_usd_est
    }

    /// Identity comparison used when reconciling model output against the
    /// catalog: exact year plus case-insensitive make/model/trim.
    pub(crate) fn matches(&self, year: u16, make: &str, model: &str, trim: &str) -> bool {
        self.year == year
            && self.make.eq_ignore_ascii_case(make)
            && self.model.eq_ignore_ascii_case(model)
            && self.trim.eq_ignore_ascii_case(trim)
    }
}

const BUILTIN_CATALOG: &str = include_str!("../../../data/vehicles.json");

#[derive(Debug, Clone)]
pub struct VehicleCatalog {
    vehicles: Vec<Vehicle>,
}

impl VehicleCatalog {
    /// The catalog bundled with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        let vehicles = serde_json::from_str(BUILTIN_CATALOG)?;
        Ok(Self { vehicles })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let vehicles = serde_json::from_reader(reader)?;
        Ok(Self { vehicles })
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
