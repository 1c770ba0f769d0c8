mod address;
mod cli;
mod config;
mod db;
mod errors;
mod export;
mod extraction;
mod llm_client;
mod mail;
mod models;
mod pipeline;
mod prompt;
mod reconcile;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::config::{Config, LlmConfig};
use crate::extraction::LlmExtractor;
use crate::llm_client::LlmClient;
use crate::mail::SearchFilter;
use crate::pipeline::{read_observations, reconcile_blocking, write_records_json, RunOptions};
use crate::prompt::ConsolePrompter;
use crate::reconcile::ReconcileOptions;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries prompts and `reconcile` output.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Run {
            mails,
            since,
            terms,
            include_role,
            non_interactive,
            template,
            out_dir,
            json_out,
        } => {
            let template = template
                .or_else(|| config.table_xlsx.clone())
                .context("No report template: set TABLE_XLSX or pass --template")?;
            let options = RunOptions {
                mails_path: mails,
                filter: SearchFilter {
                    terms: if terms.is_empty() {
                        config.search_terms.clone()
                    } else {
                        terms
                    },
                    since: since.or(config.since_date),
                },
                reconcile: ReconcileOptions {
                    include_role_in_key: include_role || config.include_role_in_key,
                },
                interactive: config.interactive && !non_interactive,
                manual_addr_db: config.manual_addr_db.clone(),
                openregister_db: config.openregister_db.clone(),
                template,
                report_dir: out_dir.unwrap_or_else(|| config.report_dir.clone()),
                json_out,
                agreed_count: config.agreed_count,
                customer_number: config.customer_number.clone(),
                first_name: config.first_name.clone(),
                last_name: config.last_name.clone(),
            };
            run(options).await
        }
        Commands::Reconcile {
            input,
            output,
            include_role,
        } => {
            let options = ReconcileOptions {
                include_role_in_key: include_role || config.include_role_in_key,
            };
            reconcile_file(&input, output.as_deref(), options).await
        }
        Commands::Serve { port } => serve(config, port).await,
    }
}

async fn run(options: RunOptions) -> Result<()> {
    let llm_config = LlmConfig::from_env()?;
    let llm = LlmClient::new(&llm_config);
    info!("LLM client initialized (model: {})", llm.model());
    let extractor = LlmExtractor::new(llm);

    let summary = pipeline::run(&options, &extractor, Arc::new(ConsolePrompter)).await?;

    println!(
        "{} mails, {} records ({} extractions empty), {} report workbooks in {}",
        summary.mails,
        summary.records.len(),
        summary.failed_extractions,
        summary.pages.len(),
        options.report_dir.display()
    );
    if let Some(addresses) = summary.addresses {
        println!(
            "Addresses: {} filled, {} unresolved, {} failed",
            addresses.filled, addresses.unresolved, addresses.failed
        );
    }
    Ok(())
}

async fn reconcile_file(input: &Path, output: Option<&Path>, options: ReconcileOptions) -> Result<()> {
    let observations = read_observations(input)?;
    let records = reconcile_blocking(observations, options, None).await?;

    match output {
        Some(path) => write_records_json(path, &records)?,
        None => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

async fn serve(config: Config, port: Option<u16>) -> Result<()> {
    info!("Starting tracker API v{}", env!("CARGO_PKG_VERSION"));

    let llm_config = LlmConfig::from_env()?;
    let llm = LlmClient::new(&llm_config);
    info!("LLM client initialized (model: {})", llm.model());

    let port = port.unwrap_or(config.port);
    let state = AppState {
        config,
        extractor: Arc::new(LlmExtractor::new(llm)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
