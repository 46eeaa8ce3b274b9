// Main entry point - Dependency injection and CLI dispatch
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sheet_dashboard::application::dashboard_service::DashboardService;
use sheet_dashboard::application::error::DashboardError;
use sheet_dashboard::application::file_store::UploadFile;
use sheet_dashboard::application::history_service::{ConfirmationGate, DeleteOutcome};
use sheet_dashboard::application::session::{BearerToken, SessionContext};
use sheet_dashboard::domain::chart::ChartVariant;
use sheet_dashboard::domain::history::HistoryEntry;
use sheet_dashboard::infrastructure::config::load_dashboard_config;
use sheet_dashboard::infrastructure::http_file_store::HttpFileStore;

/// Exit status when the session token is missing or was refused.
const SESSION_EXPIRED_EXIT: i32 = 2;

#[derive(Parser)]
#[command(name = "sheet-dashboard")]
#[command(about = "Upload spreadsheets, chart them and export the results")]
struct Cli {
    /// Bearer token, overrides `session.token` from the configuration
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List previous uploads, newest first as the server orders them
    History,

    /// Upload a spreadsheet and export its chart
    Upload {
        file: PathBuf,
        /// Field used for chart labels
        #[arg(long)]
        category: Option<String>,
        /// Field used for chart values
        #[arg(long)]
        value: Option<String>,
        #[arg(long, default_value = "bar")]
        variant: ChartVariant,
    },

    /// Load a previous upload and export its chart
    Show { id: String },

    /// Delete a previous upload
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

struct PromptConfirmation;

impl ConfirmationGate for PromptConfirmation {
    fn confirm(&self, entry: &HistoryEntry) -> bool {
        print!("Delete {} ({})? [y/N] ", entry.original_filename, entry.id);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_dashboard_config().context("Failed to load dashboard configuration")?;

    let token = cli.token.or(config.session.token).map(BearerToken::new);
    let store = Arc::new(HttpFileStore::new(config.api.clone()));
    let dashboard = DashboardService::new(store, SessionContext::new(token), config.chart);

    match run(&dashboard, cli.command, &config.export.dir).await {
        Err(err) if is_session_expired(&err) => {
            eprintln!("Your session has expired. Please log in again and supply a fresh token.");
            std::process::exit(SESSION_EXPIRED_EXIT);
        }
        other => other,
    }
}

fn is_session_expired(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DashboardError>()
        .is_some_and(DashboardError::is_session_expired)
}

async fn run(dashboard: &DashboardService, command: Command, export_dir: &Path) -> anyhow::Result<()> {
    match command {
        Command::History => {
            let entries = dashboard.refresh_history().await?;
            if entries.is_empty() {
                println!("No uploads yet.");
            }
            for entry in entries {
                let created = entry
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "Invalid Date".to_string());
                println!("{}  {}  {}", entry.id, created, entry.original_filename);
            }
        }
        Command::Upload {
            file,
            category,
            value,
            variant,
        } => {
            let upload = UploadFile::from_path(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let dataset = dashboard
                .upload(Some(upload), category.clone(), value.clone(), variant)
                .await?;
            println!("Parsed {} rows.", dataset.len());

            let configurator = dashboard.configurator();
            println!("Fields: {}", configurator.available_fields().join(", "));
            configurator.set_category_field(category);
            configurator.set_value_field(value);
            configurator.set_variant(variant);
            export_chart(dashboard, export_dir)?;
        }
        Command::Show { id } => {
            dashboard.refresh_history().await?;
            let entry = dashboard
                .load_history_by_id(&id)
                .with_context(|| format!("No upload with id {id}"))?;
            println!("Loaded {}.", entry.original_filename);
            export_chart(dashboard, export_dir)?;
        }
        Command::Delete { id, yes } => {
            dashboard.refresh_history().await?;
            let outcome = if yes {
                dashboard.delete_history(&id, &|_: &HistoryEntry| true).await?
            } else {
                dashboard.delete_history(&id, &PromptConfirmation).await?
            };
            match outcome {
                DeleteOutcome::Deleted => println!("Deleted {id}."),
                DeleteOutcome::Declined => println!("Kept {id}."),
                DeleteOutcome::Unknown => anyhow::bail!("No upload with id {id}"),
            }
        }
    }
    Ok(())
}

/// Render the chart if it can be shown and write every export that applies.
fn export_chart(dashboard: &DashboardService, export_dir: &Path) -> anyhow::Result<()> {
    if dashboard.chart()?.is_none() {
        println!("Select both a category and a value field to draw a chart.");
    }

    let exports = dashboard.exports();
    for file in [exports.export_image()?, exports.export_document()?, exports.export_table()?]
        .into_iter()
        .flatten()
    {
        let path = file.write_to_dir(export_dir)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
