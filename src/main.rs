use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use patient_view_core::{
    CoreConfig, YamlPatientRepository, config::patient_data_dir_from_env_value,
};

/// Main entry point for the patient view application
///
/// Serves read-only patient views over REST, backed by YAML records on disk.
///
/// # Environment Variables
/// - `PATIENT_VIEW_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: Directory holding `patients/<id>/patient.yaml` (default: "patient_data")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the patient data directory does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patient_view_run=info".parse()?)
                .add_directive("patient_view_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PATIENT_VIEW_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let patient_data_dir = patient_data_dir_from_env_value(std::env::var("PATIENT_DATA_DIR").ok());
    if !patient_data_dir.exists() {
        anyhow::bail!(
            "Patient data directory does not exist: {}",
            patient_data_dir.display()
        );
    }

    let cfg = Arc::new(CoreConfig::new(patient_data_dir)?);
    tracing::info!(
        "++ Reading patients from {}",
        cfg.patient_data_dir().display()
    );

    let app = router(AppState::new(Arc::new(YamlPatientRepository::new(cfg))));

    tracing::info!("++ Starting patient view REST on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
