//! Strict decoding of the model's ranking reply. Unlike the tax parser this
//! path fails loudly: a malformed shape drives the caller's retry loop.

use serde::{Deserialize, Serialize};

use super::RankingError;

/// Advisory affordability classification attached by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffordabilityCategory {
    Affordable,
    Stretch,
}

impl AffordabilityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AffordabilityCategory::Affordable => "affordable",
            AffordabilityCategory::Stretch => "stretch",
        }
    }
}

/// One entry of the model's `ranked_vehicles` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedEntry {
    pub year: u16,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub reason: String,
    pub category: AffordabilityCategory,
}

#[derive(Debug, Deserialize)]
struct RankedVehiclesResponse {
    ranked_vehicles: Vec<RankedEntry>,
}

/// Drop the markdown code-fence wrapper models like to add despite the
/// JSON-only instruction.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }

    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }

    cleaned.trim()
}

/// Decode the reply into ranked entries. An empty array is treated the same
/// as a shape mismatch so the retry loop can ask again.
pub(crate) fn parse_ranked(text: &str) -> Result<Vec<RankedEntry>, RankingError> {
    let cleaned = strip_code_fences(text);

    let response: RankedVehiclesResponse = serde_json::from_str(cleaned)
        .map_err(|err| RankingError::InvalidJsonFormat(format!("decoding error: {err}")))?;

    if response.ranked_vehicles.is_empty() {
        return Err(RankingError::InvalidJsonFormat(
            "empty ranked_vehicles array".to_string(),
        ));
    }

    Ok(response.ranked_vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "ranked_vehicles": [
            {"year": 2025, "make": "Toyota", "model": "Corolla", "trim": "LE",
             "reason": "Efficient commuter well within budget", "category": "affordable"},
            {"year": 2025, "make": "Toyota", "model": "Highlander", "trim": "XLE",
             "reason": "Premium three-row, stretch but achievable", "category": "stretch"}
        ]
    }"#;

    #[test]
    fn parses_plain_json() {
        let entries = parse_ranked(WELL_FORMED).expect("parses");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].model, "Corolla");
        assert_eq!(entries[0].category, AffordabilityCategory::Affordable);
        assert_eq!(entries[1].category, AffordabilityCategory::Stretch);
    }

    #[test]
    fn strips_json_code_fences() {
        let fenced = format!("```json\n{WELL_FORMED}\n```");
        let entries = parse_ranked(&fenced).expect("parses fenced reply");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn strips_bare_code_fences() {
        let fenced = format!("```\n{WELL_FORMED}\n```");
        assert_eq!(strip_code_fences(&fenced), WELL_FORMED.trim());
    }

    #[test]
    fn rejects_empty_ranked_array() {
        let err = parse_ranked(r#"{"ranked_vehicles": []}"#).expect_err("empty array fails");
        assert!(matches!(err, RankingError::InvalidJsonFormat(ref details)
            if details.contains("empty")));
    }

    #[test]
    fn rejects_prose_reply() {
        let err = parse_ranked("Here are my recommendations: Corolla first.")
            .expect_err("prose fails");
        assert!(matches!(err, RankingError::InvalidJsonFormat(_)));
    }

    #[test]
    fn rejects_unknown_category() {
        let raw = r#"{"ranked_vehicles": [
            {"year": 2025, "make": "Toyota", "model": "Corolla", "trim": "LE",
             "reason": "ok", "category": "bargain"}
        ]}"#;
        let err = parse_ranked(raw).expect_err("unknown category fails");
        assert!(matches!(err, RankingError::InvalidJsonFormat(_)));
    }
}
