use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use okr_client::report::{build_report, ReportInput};
use okr_client::{ApiClient, ClientConfig, ListQuery};
use okr_core::settings::ScoringConfig;

/// Page size used when fetching whole collections.
const FETCH_LIMIT: u32 = 1000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "okr_client=info,okr_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    let mut scoring = ScoringConfig::from_env().context("Failed to load scoring configuration")?;
    tracing::info!(api_url = %config.api_url, "Loaded client configuration");

    let api = ApiClient::new(&config)?;

    match api.settings().await {
        Ok(settings) => {
            let at_risk_tolerance = scoring.at_risk_tolerance;
            scoring = ScoringConfig {
                at_risk_tolerance,
                ..ScoringConfig::from_settings(&settings)?
            };
            tracing::info!(
                max_level = scoring.max_competency_level,
                "Applied organization settings"
            );
        }
        Err(e) => tracing::warn!(error = %e, "Using default scoring settings"),
    }

    // --- Fetch ---
    let all = ListQuery::new().limit(FETCH_LIMIT);
    let (cycles_api, objectives_api, check_ins_api, users_api, evaluations_api, pdis_api) = (
        api.cycles(),
        api.objectives(),
        api.check_ins(),
        api.users(),
        api.evaluations(),
        api.pdis(),
    );
    let (cycles, objectives, check_ins, members, evaluations, pdis) = tokio::try_join!(
        cycles_api.list(&all),
        objectives_api.list(&all),
        check_ins_api.list(&all),
        users_api.list(&all),
        evaluations_api.list(&all),
        pdis_api.list(&all),
    )
    .context("Failed to fetch data from the API")?;

    tracing::info!(
        cycles = cycles.len(),
        objectives = objectives.len(),
        check_ins = check_ins.len(),
        members = members.len(),
        "Fetched records"
    );

    // --- Report ---
    let input = ReportInput {
        cycles,
        objectives,
        check_ins,
        members,
        evaluations,
        pdis,
    };
    let mut report = build_report(&input, chrono::Utc::now(), &scoring)?;

    if let Some(cycle_id) = report.cycle.as_ref().map(|c| c.id.clone()) {
        match api.backend_figures(Some(&cycle_id)).await {
            Ok(figures) => report = report.with_backend(figures),
            Err(e) => tracing::warn!(error = %e, "Backend dashboard figures unavailable"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
