use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use drivematch::config::AppConfig;
use drivematch::error::AppError;
use drivematch::gemini::{GeminiClient, GeminiConfig};
use drivematch::telemetry;
use drivematch::workflows::affordability::{self, FinancingCalculator, ScoreBand, ScoreComponent};
use drivematch::workflows::onboarding::BankAccountSummary;
use drivematch::workflows::recommendation::{RankedVehicle, VehicleCatalog, VehicleRankingService};
use drivematch::workflows::tax::{Coordinates, MetroTableResolver, TaxInfo, TaxLookupService};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    catalog: Arc<VehicleCatalog>,
    ranking: Arc<VehicleRankingService<GeminiClient>>,
    tax: Arc<TaxLookupService<GeminiClient, MetroTableResolver>>,
}

#[derive(Parser, Debug)]
#[command(
    name = "DriveMatch Advisor",
    about = "Demonstrate and run the DriveMatch affordability advisor from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute the composite affordability score for a financial snapshot
    Score(ScoreArgs),
    /// Estimate a monthly payment for a vehicle price
    Quote(QuoteArgs),
    /// Rank the vehicle catalog with the generative model (needs an API key)
    Recommend(RecommendArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Annual gross income in dollars
    #[arg(long)]
    income: f64,
    /// Credit score (300-850)
    #[arg(long)]
    credit_score: u16,
    /// Average monthly spending in dollars
    #[arg(long)]
    monthly_spending: f64,
}

#[derive(Args, Debug)]
struct QuoteArgs {
    /// Vehicle MSRP in dollars
    #[arg(long)]
    msrp: f64,
    /// Credit score (300-850)
    #[arg(long)]
    credit_score: u16,
    /// Local sales tax in percentage points (8.25 means 8.25%)
    #[arg(long, default_value_t = 8.25)]
    tax_rate: f64,
    /// Quote a lease instead of a loan
    #[arg(long)]
    lease: bool,
    /// Down payment percentage of the total price
    #[arg(long, default_value_t = 10.0)]
    down_payment_percentage: f64,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Annual gross income in dollars
    #[arg(long)]
    income: f64,
    /// Credit score (300-850)
    #[arg(long)]
    credit_score: u16,
    /// Average monthly spending in dollars
    #[arg(long)]
    monthly_spending: f64,
    /// Local sales tax in percentage points
    #[arg(long, default_value_t = 8.25)]
    tax_rate: f64,
    /// Vehicle catalog JSON file (defaults to the bundled catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ScoreRequest {
    annual_income: f64,
    credit_score: u16,
    available_monthly: f64,
    monthly_savings: f64,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    score: u8,
    band: ScoreBand,
    description: &'static str,
    components: Vec<ScoreComponent>,
    evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    msrp: f64,
    credit_score: u16,
    tax_rate: f64,
    #[serde(default)]
    lease: bool,
    #[serde(default)]
    down_payment_percentage: Option<f64>,
    #[serde(default)]
    loan_term_months: Option<u32>,
    #[serde(default)]
    lease_term_months: Option<u32>,
}

#[derive(Debug, Serialize)]
struct QuoteResponse {
    monthly_payment: f64,
    total_price: f64,
    down_payment: f64,
    apr: f64,
    credit_tier: &'static str,
    term_months: u32,
    lease: bool,
}

#[derive(Debug, Deserialize)]
struct TaxLookupRequest {
    #[serde(default)]
    zip: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RecommendationRequest {
    annual_income: f64,
    credit_score: u16,
    available_monthly: f64,
    monthly_savings: f64,
    tax_rate: f64,
}

#[derive(Debug, Serialize)]
struct RecommendedVehicleView {
    #[serde(flatten)]
    ranked: RankedVehicle,
    monthly_payment_estimate: f64,
}

#[derive(Debug, Serialize)]
struct RecommendationResponse {
    score: u8,
    band: ScoreBand,
    vehicles: Vec<RecommendedVehicleView>,
    generated_at: DateTime<Utc>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Score(args) => run_score(args),
        Command::Quote(args) => run_quote(args),
        Command::Recommend(args) => run_recommend(args).await,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let catalog = match &config.catalog.path {
        Some(path) => VehicleCatalog::from_path(path)?,
        None => VehicleCatalog::builtin()?,
    };
    info!(vehicles = catalog.len(), "vehicle catalog loaded");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = build_state(
        config.gemini.clone(),
        catalog,
        prometheus_handle,
        readiness_flag.clone(),
    )?;

    let app = build_router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "affordability advisor ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(
    gemini: GeminiConfig,
    catalog: VehicleCatalog,
    metrics: PrometheusHandle,
    readiness: Arc<AtomicBool>,
) -> Result<AppState, AppError> {
    let client = Arc::new(GeminiClient::new(gemini)?);
    let resolver = Arc::new(MetroTableResolver::with_default_metros());

    Ok(AppState {
        readiness,
        metrics,
        catalog: Arc::new(catalog),
        ranking: Arc::new(VehicleRankingService::new(client.clone())),
        tax: Arc::new(TaxLookupService::new(client, resolver)),
    })
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/score", post(score_endpoint))
        .route("/api/v1/financing/quote", post(quote_endpoint))
        .route("/api/v1/tax/lookup", post(tax_lookup_endpoint))
        .route("/api/v1/recommendations", post(recommendations_endpoint))
        .with_state(state)
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let bank = BankAccountSummary {
        annual_income: args.income,
        average_monthly_spending: args.monthly_spending,
    };
    let profile = affordability::FinancialProfile {
        annual_income: args.income,
        credit_score: args.credit_score,
        available_monthly: bank.spending_capacity(),
        monthly_savings: bank.monthly_savings(),
    };

    let score = affordability::calculate_score(&profile);
    let band = ScoreBand::for_score(score);

    println!("Affordability score demo");
    println!(
        "Income ${:.0}, credit {}, available ${:.2}/mo, savings ${:.2}/mo",
        profile.annual_income,
        profile.credit_score,
        profile.available_monthly,
        profile.monthly_savings
    );
    println!(
        "\nScore: {score}/100 [{}] - {}",
        band.label(),
        affordability::score_description(score)
    );

    println!("\nComponents");
    for component in affordability::score_breakdown(&profile) {
        println!(
            "- {:?}: {:.1} x {:.0}% ({})",
            component.factor,
            component.value,
            component.weight * 100.0,
            component.notes
        );
    }

    Ok(())
}

fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let calculator = FinancingCalculator {
        down_payment_percentage: args.down_payment_percentage,
        lease_mode: args.lease,
        ..FinancingCalculator::default()
    };

    let payment = calculator.monthly_payment(args.msrp, args.credit_score, args.tax_rate);
    let total = calculator.total_price(args.msrp, args.tax_rate);
    let down = calculator.down_payment_amount(args.msrp, args.tax_rate);

    println!("Financing quote demo");
    println!(
        "MSRP ${:.0} at {:.2}% sales tax, credit {} ({})",
        args.msrp,
        args.tax_rate,
        args.credit_score,
        FinancingCalculator::credit_tier(args.credit_score)
    );
    println!("Total price: ${total:.2}");
    println!("Down payment: ${down:.2}");
    if args.lease {
        println!(
            "Lease payment ({} months): ${payment:.2}/mo",
            calculator.lease_term_months
        );
    } else {
        println!(
            "Loan payment ({} months at {:.2}% APR): ${payment:.2}/mo",
            calculator.loan_term_months,
            FinancingCalculator::apr_for(args.credit_score)
        );
    }

    Ok(())
}

async fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let catalog = match &args.catalog {
        Some(path) => VehicleCatalog::from_path(path)?,
        None => VehicleCatalog::builtin()?,
    };

    let bank = BankAccountSummary {
        annual_income: args.income,
        average_monthly_spending: args.monthly_spending,
    };
    let profile = affordability::FinancialProfile {
        annual_income: args.income,
        credit_score: args.credit_score,
        available_monthly: bank.spending_capacity(),
        monthly_savings: bank.monthly_savings(),
    };

    let client = Arc::new(GeminiClient::new(config.gemini)?);
    let ranking = VehicleRankingService::new(client);
    let ranked = ranking
        .rank(catalog.vehicles(), &profile, args.tax_rate)
        .await?;

    render_recommendations(&ranked, &profile, args.tax_rate);
    Ok(())
}

fn render_recommendations(
    ranked: &[RankedVehicle],
    profile: &affordability::FinancialProfile,
    tax_rate: f64,
) {
    let calculator = FinancingCalculator::default();
    let score = affordability::calculate_score(profile);

    println!("Vehicle recommendation demo");
    println!(
        "Score {score}/100 [{}], available budget ${:.0}/mo, tax {:.2}%",
        ScoreBand::for_score(score).label(),
        profile.available_monthly,
        tax_rate
    );
    println!();

    for (position, entry) in ranked.iter().enumerate() {
        let payment =
            calculator.monthly_payment(entry.vehicle.msrp_usd(), profile.credit_score, tax_rate);
        let category = entry
            .category
            .map(|category| category.label())
            .unwrap_or("unranked");
        println!(
            "{:2}. {} | ${:.2}/mo | {}",
            position + 1,
            entry.vehicle.full_name(),
            payment,
            category
        );
        if let Some(reason) = &entry.reason {
            println!("    {reason}");
        }
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn score_endpoint(Json(payload): Json<ScoreRequest>) -> Json<ScoreResponse> {
    let profile = affordability::FinancialProfile {
        annual_income: payload.annual_income,
        credit_score: payload.credit_score,
        available_monthly: payload.available_monthly,
        monthly_savings: payload.monthly_savings,
    };

    let score = affordability::calculate_score(&profile);

    Json(ScoreResponse {
        score,
        band: ScoreBand::for_score(score),
        description: affordability::score_description(score),
        components: affordability::score_breakdown(&profile),
        evaluated_at: Utc::now(),
    })
}

async fn quote_endpoint(Json(payload): Json<QuoteRequest>) -> Json<QuoteResponse> {
    let defaults = FinancingCalculator::default();
    let calculator = FinancingCalculator {
        down_payment_percentage: payload
            .down_payment_percentage
            .unwrap_or(defaults.down_payment_percentage),
        lease_mode: payload.lease,
        loan_term_months: payload.loan_term_months.unwrap_or(defaults.loan_term_months),
        lease_term_months: payload
            .lease_term_months
            .unwrap_or(defaults.lease_term_months),
    };

    let term_months = if payload.lease {
        calculator.lease_term_months
    } else {
        calculator.loan_term_months
    };

    Json(QuoteResponse {
        monthly_payment: calculator.monthly_payment(
            payload.msrp,
            payload.credit_score,
            payload.tax_rate,
        ),
        total_price: calculator.total_price(payload.msrp, payload.tax_rate),
        down_payment: calculator.down_payment_amount(payload.msrp, payload.tax_rate),
        apr: FinancingCalculator::apr_for(payload.credit_score),
        credit_tier: FinancingCalculator::credit_tier(payload.credit_score),
        term_months,
        lease: payload.lease,
    })
}

async fn tax_lookup_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<TaxLookupRequest>,
) -> Result<Json<TaxInfo>, axum::response::Response> {
    let result = match (payload.zip.as_deref(), payload.latitude, payload.longitude) {
        (Some(zip), _, _) => state.tax.lookup_by_zip(zip).await,
        (None, Some(latitude), Some(longitude)) => {
            state
                .tax
                .lookup(Coordinates {
                    latitude,
                    longitude,
                })
                .await
        }
        _ => {
            let payload = json!({
                "error": "request needs either a zip or a latitude/longitude pair",
            });
            return Err((StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response());
        }
    };

    result
        .map(Json)
        .map_err(|err| AppError::from(err).into_response())
}

async fn recommendations_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let profile = affordability::FinancialProfile {
        annual_income: payload.annual_income,
        credit_score: payload.credit_score,
        available_monthly: payload.available_monthly,
        monthly_savings: payload.monthly_savings,
    };

    let ranked = state
        .ranking
        .rank(state.catalog.vehicles(), &profile, payload.tax_rate)
        .await?;

    let calculator = FinancingCalculator::default();
    let score = affordability::calculate_score(&profile);
    let vehicles = ranked
        .into_iter()
        .map(|entry| {
            let monthly_payment_estimate = calculator.monthly_payment(
                entry.vehicle.msrp_usd(),
                profile.credit_score,
                payload.tax_rate,
            );
            RecommendedVehicleView {
                ranked: entry,
                monthly_payment_estimate,
            }
        })
        .collect();

    Ok(Json(RecommendationResponse {
        score,
        band: ScoreBand::for_score(score),
        vehicles,
        generated_at: Utc::now(),
    }))
}
