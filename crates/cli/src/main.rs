use clap::{Parser, Subcommand};
use patient_view_core::{
    config::patient_data_dir_from_env_value, CoreConfig, FieldDescriptor, FieldValue, LoadOutcome,
    PatientId, PatientView, YamlPatientRepository,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "patient-view")]
#[command(about = "Read-only patient record viewer")]
struct Cli {
    /// Patient data directory (defaults to $PATIENT_DATA_DIR, then ./patient_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a patient's fields
    Show {
        /// Patient identifier
        id: String,
        /// Print field descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the page title for a patient
    Title {
        /// Patient identifier
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patient_view_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'patient-view --help' for commands");
        return Ok(());
    };

    let patient_data_dir = cli.data_dir.unwrap_or_else(|| {
        patient_data_dir_from_env_value(std::env::var("PATIENT_DATA_DIR").ok())
    });
    let cfg = Arc::new(CoreConfig::new(patient_data_dir)?);
    let repository = Arc::new(YamlPatientRepository::new(cfg));

    let title = Arc::new(Mutex::new(String::new()));
    let title_sink = title.clone();
    let view = PatientView::new(
        repository,
        Arc::new(move |t: &str| {
            if let Ok(mut slot) = title_sink.lock() {
                *slot = t.to_string();
            }
        }),
    );

    let id = match &command {
        Commands::Show { id, .. } | Commands::Title { id } => PatientId::parse(id)?,
    };

    match view.load(id.clone()).await {
        LoadOutcome::Loaded => {}
        LoadOutcome::NotFound => anyhow::bail!("Patient not found: {}", id),
        LoadOutcome::Unavailable | LoadOutcome::Stale => {
            anyhow::bail!("Patient record unavailable: {}", id)
        }
    }

    let title = title
        .lock()
        .map_err(|_| anyhow::anyhow!("title lock poisoned"))?
        .clone();

    match command {
        Commands::Title { .. } => println!("{title}"),
        Commands::Show { json, .. } => {
            let fields = view
                .fields()
                .ok_or_else(|| anyhow::anyhow!("patient view has no record"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fields)?);
            } else {
                println!("{title}");
                println!();
                let width = fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
                for field in &fields {
                    println!("{}", render_line(field, width));
                }
            }
        }
    }

    Ok(())
}

/// Renders a field as `label  value`, with dates as `YYYY-MM-DD`.
fn render_line(field: &FieldDescriptor, width: usize) -> String {
    let value = match &field.value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        FieldValue::Empty => "-".to_string(),
    };
    format!("{:<width$}  {}", field.label, value)
}
