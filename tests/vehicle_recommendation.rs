//! End-to-end specifications for the ranking workflow: reorder semantics,
//! fence stripping, the bounded retry loop, and credential fail-fast, all
//! driven through the public service with a scripted text model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use drivematch::gemini::{GeminiClient, GeminiConfig, GeminiError, GenerationConfig, TextModel};
use drivematch::workflows::affordability::FinancialProfile;
use drivematch::workflows::recommendation::{
    AffordabilityCategory, RankingConfig, RankingError, Vehicle, VehicleRankingService,
};

struct ScriptedModel {
    replies: Mutex<Vec<Result<String, GeminiError>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn with_replies(replies: Vec<Result<String, GeminiError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextModel for ScriptedModel {
    async fn generate(
        &self,
        prompt: &str,
        _generation: Option<&GenerationConfig>,
    ) -> Result<String, GeminiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        let mut replies = self.replies.lock().expect("reply script poisoned");
        if replies.is_empty() {
            return Err(GeminiError::MalformedEnvelope);
        }
        replies.remove(0)
    }
}

fn vehicle(model: &str, trim: &str, msrp: f64) -> Vehicle {
    Vehicle {
        year: 2025,
        make: "Toyota".to_string(),
        model: model.to_string(),
        trim: trim.to_string(),
        msrp_usd_est: msrp,
        horsepower_hp: Some(200),
        drivetrain: "FWD".to_string(),
        powertrain: "Gas".to_string(),
        body_style: "Sedan".to_string(),
        image_url: format!("https://img.example.com/{}.jpg", model.to_lowercase()),
    }
}

fn catalog() -> Vec<Vehicle> {
    vec![
        vehicle("Corolla", "LE", 22_325.0),
        vehicle("Camry", "LE", 28_700.0),
        vehicle("RAV4", "XLE Premium", 34_150.0),
    ]
}

fn profile() -> FinancialProfile {
    FinancialProfile {
        annual_income: 134_217.0,
        credit_score: 742,
        available_monthly: 1_333.8,
        monthly_savings: 2_236.95,
    }
}

fn entry_json(model: &str, trim: &str, category: &str) -> String {
    format!(
        r#"{{"year": 2025, "make": "Toyota", "model": "{model}", "trim": "{trim}",
            "reason": "good fit for the budget", "category": "{category}"}}"#
    )
}

fn reply_with(entries: &[String]) -> String {
    format!(r#"{{"ranked_vehicles": [{}]}}"#, entries.join(","))
}

fn fast_service(model: Arc<ScriptedModel>) -> VehicleRankingService<ScriptedModel> {
    VehicleRankingService::with_config(
        model,
        RankingConfig {
            retry_delay: Duration::ZERO,
            ..RankingConfig::default()
        },
    )
}

#[tokio::test]
async fn reversed_reply_reverses_the_catalog() {
    let reply = reply_with(&[
        entry_json("RAV4", "XLE Premium", "stretch"),
        entry_json("Camry", "LE", "affordable"),
        entry_json("Corolla", "LE", "affordable"),
    ]);
    let model = Arc::new(ScriptedModel::with_replies(vec![Ok(reply)]));
    let service = fast_service(model.clone());

    let ranked = service
        .rank(&catalog(), &profile(), 8.25)
        .await
        .expect("ranking succeeds");

    let models: Vec<&str> = ranked.iter().map(|r| r.vehicle.model.as_str()).collect();
    assert_eq!(models, ["RAV4", "Camry", "Corolla"]);
    assert_eq!(ranked[0].category, Some(AffordabilityCategory::Stretch));
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn omitted_vehicle_is_appended_and_count_preserved() {
    let reply = reply_with(&[
        entry_json("RAV4", "XLE Premium", "stretch"),
        entry_json("Corolla", "LE", "affordable"),
    ]);
    let model = Arc::new(ScriptedModel::with_replies(vec![Ok(reply)]));
    let service = fast_service(model);

    let ranked = service
        .rank(&catalog(), &profile(), 8.25)
        .await
        .expect("ranking succeeds");

    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[2].vehicle.model, "Camry");
    assert!(ranked[2].reason.is_none());
    assert!(ranked[2].category.is_none());
}

#[tokio::test]
async fn fenced_reply_is_accepted() {
    let reply = format!(
        "```json\n{}\n```",
        reply_with(&[
            entry_json("Corolla", "LE", "affordable"),
            entry_json("Camry", "LE", "affordable"),
            entry_json("RAV4", "XLE Premium", "stretch"),
        ])
    );
    let model = Arc::new(ScriptedModel::with_replies(vec![Ok(reply)]));
    let service = fast_service(model);

    let ranked = service
        .rank(&catalog(), &profile(), 8.25)
        .await
        .expect("fenced reply parses");
    assert_eq!(ranked.len(), 3);
}

#[tokio::test]
async fn retry_recovers_after_two_malformed_replies() {
    let good = reply_with(&[
        entry_json("Camry", "LE", "affordable"),
        entry_json("Corolla", "LE", "affordable"),
        entry_json("RAV4", "XLE Premium", "stretch"),
    ]);
    let model = Arc::new(ScriptedModel::with_replies(vec![
        Ok("this is not JSON".to_string()),
        Ok(r#"{"ranked_vehicles": []}"#.to_string()),
        Ok(good),
    ]));
    let service = fast_service(model.clone());

    let ranked = service
        .rank(&catalog(), &profile(), 8.25)
        .await
        .expect("third attempt succeeds");

    assert_eq!(model.calls(), 3);
    assert_eq!(ranked[0].vehicle.model, "Camry");

    // Retries carry the strict-JSON reminder, the first attempt does not.
    let prompts = model.prompts.lock().expect("prompt log poisoned");
    assert!(!prompts[0].contains("invalid JSON format"));
    assert!(prompts[1].contains("invalid JSON format"));
    assert!(prompts[2].contains("invalid JSON format"));
}

#[tokio::test]
async fn persistent_malformed_output_exhausts_retries() {
    let model = Arc::new(ScriptedModel::with_replies(vec![
        Ok("nope".to_string()),
        Ok("still nope".to_string()),
        Ok("never".to_string()),
    ]));
    let service = fast_service(model.clone());

    let err = service
        .rank(&catalog(), &profile(), 8.25)
        .await
        .expect_err("malformed output never recovers");

    assert!(matches!(err, RankingError::MaxRetriesExceeded));
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn transport_failure_on_final_attempt_keeps_its_error() {
    let model = Arc::new(ScriptedModel::with_replies(vec![
        Err(GeminiError::Status(500)),
        Err(GeminiError::Status(500)),
        Err(GeminiError::Status(500)),
    ]));
    let service = fast_service(model.clone());

    let err = service
        .rank(&catalog(), &profile(), 8.25)
        .await
        .expect_err("status errors exhaust retries");

    assert!(matches!(err, RankingError::Gemini(GeminiError::Status(500))));
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn missing_api_key_fails_fast_without_retries() {
    let client = Arc::new(GeminiClient::new(GeminiConfig::default()).expect("client builds"));
    let service = VehicleRankingService::with_config(
        client,
        RankingConfig {
            retry_delay: Duration::ZERO,
            ..RankingConfig::default()
        },
    );

    let err = service
        .rank(&catalog(), &profile(), 8.25)
        .await
        .expect_err("no key configured");

    assert!(matches!(
        err,
        RankingError::Gemini(GeminiError::MissingApiKey)
    ));
}
