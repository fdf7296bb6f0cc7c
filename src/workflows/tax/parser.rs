//! Lenient parser for the two-line county/tax answer. The model output is an
//! untrusted free-text format: unparseable lines fall back to defaults so a
//! partially usable answer still moves the session forward.

pub(crate) const UNKNOWN_COUNTY: &str = "Unknown County";

/// Extract `(county, sales_tax_percentage)` from the model's reply. Values
/// below 1.0 are assumed to be fractions (0.0825) and normalized to
/// percentage points (8.25).
pub(crate) fn parse_county_tax(text: &str) -> (String, f64) {
    let mut county = UNKNOWN_COUNTY.to_string();
    let mut tax_percentage = 0.0;

    for line in text.lines() {
        let line = line.trim();
        let lowered = line.to_ascii_lowercase();

        if lowered.starts_with("county:") {
            let value = line["county:".len()..].trim();
            if !value.is_empty() {
                county = value.to_string();
            }
        } else if lowered.starts_with("tax:") {
            let value = line["tax:".len()..].trim().trim_end_matches('%').trim();
            if let Ok(parsed) = value.parse::<f64>() {
                tax_percentage = if parsed < 1.0 { parsed * 100.0 } else { parsed };
            }
        }
    }

    (county, tax_percentage)
}
