mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use docent_core::Config;
use docent_core::bootstrap::build_service;
use docent_core::service::{AddDocumentRequest, AskRequest, SearchRequest};
use docent_gateway::GatewayServer;
use docent_memory::document::{DocumentLoader, TextLoader};
use serde::Serialize;
use tokio::sync::watch;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    init_subscriber(&config.log_level);
    tracing::debug!(path = %cli.config.display(), "config loaded");

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Add { name, file } => add(&config, name, &file).await,
        Command::Ask { question } => {
            let service = build_service(&config).await?;
            let resp = service.ask_question(AskRequest { question }).await;
            print_json(resp.success, resp.error.as_deref(), &resp)
        }
        Command::Search { query, limit } => {
            let service = build_service(&config).await?;
            let resp = service
                .search_documents(SearchRequest { query, limit })
                .await;
            print_json(resp.success, resp.error.as_deref(), &resp)
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let service = Arc::new(build_service(&config).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            return;
        }
        tracing::info!("received ctrl-c, shutting down");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        service,
        shutdown_rx,
    )
    .with_max_body_size(config.gateway.max_body_size)
    .serve()
    .await
    .context("gateway failed")
}

async fn add(config: &Config, name: Option<String>, file: &Path) -> anyhow::Result<()> {
    let loader = TextLoader::default();
    let mut documents = loader
        .load(file)
        .await
        .with_context(|| format!("failed to load {}", file.display()))?;
    let Some(document) = documents.pop() else {
        bail!("no document loaded from {}", file.display());
    };

    let service = build_service(config).await?;
    let resp = service
        .add_document(AddDocumentRequest {
            name: name.unwrap_or(document.name),
            content: document.content,
            source_id: document.source_id,
        })
        .await;
    print_json(resp.success, resp.error.as_deref(), &resp)
}

fn print_json<T: Serialize>(success: bool, error: Option<&str>, resp: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(resp)?);
    if success {
        Ok(())
    } else {
        bail!("{}", error.unwrap_or("request failed"))
    }
}

fn init_subscriber(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
