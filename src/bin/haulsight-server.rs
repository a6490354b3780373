// ABOUTME: Server binary for the Haulsight shipment investigation API
// ABOUTME: Loads configuration, opens the shipment store, builds the reasoning client and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Haulsight Server Binary
//!
//! Starts the HTTP API on `HTTP_PORT` (default 8081) and serves until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use haulsight_core::constants::endpoints::{HEALTH_CHECK, INVESTIGATE};
use haulsight_server::{
    config::ServerConfig,
    database::seed::{seed_demo_shipments, SeedOptions},
    database::ShipmentDatabase,
    llm::{OpenAiCompatibleProvider, ReasoningService},
    logging,
    resources::ServerResources,
    routes::build_router,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "haulsight-server")]
#[command(about = "Haulsight - conversational shipment analytics API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Seed synthetic shipments for this customer id if it has none
    #[arg(long, value_name = "CUSTOMER_ID")]
    seed_demo: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Haulsight server");
    info!("{}", config.summary());

    let database = ShipmentDatabase::new(&config.database_url).await?;
    if let Some(customer_id) = args.seed_demo.as_deref() {
        seed_if_empty(&database, customer_id).await?;
    }

    let provider = OpenAiCompatibleProvider::from_llm_config(&config.llm)
        .context("Failed to build reasoning provider")?;
    if !provider.capabilities().supports_function_calling() {
        bail!(
            "Reasoning provider '{}' does not support function calling",
            provider.name()
        );
    }
    if !provider.is_configured() {
        warn!(
            provider = %provider.name(),
            "Reasoning provider has no credentials; investigations will return fallback answers"
        );
    }
    info!(
        provider = %provider.name(),
        model = %provider.default_model(),
        "Reasoning provider ready"
    );

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::from_parts(
        database,
        Arc::new(provider),
        Arc::clone(&config),
    ));
    let router = build_router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Server listening on {addr}");
    info!("  POST {INVESTIGATE}");
    info!("  GET  {HEALTH_CHECK}");

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn seed_if_empty(database: &ShipmentDatabase, customer_id: &str) -> Result<()> {
    let existing = database.count_for_customer(customer_id).await?;
    if existing > 0 {
        info!(
            customer_id = %customer_id,
            shipments = existing,
            "Demo customer already has shipments; skipping seed"
        );
        return Ok(());
    }
    seed_demo_shipments(database, customer_id, &SeedOptions::default()).await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }
}
