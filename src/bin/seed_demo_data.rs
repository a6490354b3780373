// ABOUTME: Demo data seeder for the Haulsight shipment store
// ABOUTME: Inserts synthetic shipments for one customer so investigations have data to analyze
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Demo data seeder for Haulsight.
//!
//! Usage:
//! ```bash
//! # Seed 500 shipments over the last 180 days for customer "demo"
//! cargo run --bin seed-demo-data -- --customer-id demo
//!
//! # Replace existing shipments with a reproducible dataset
//! cargo run --bin seed-demo-data -- --customer-id demo --reset --seed 42
//! ```

use std::env;

use anyhow::Result;
use clap::Parser;
use haulsight_core::constants::env_config;
use haulsight_server::database::seed::{seed_demo_shipments, SeedOptions};
use haulsight_server::database::ShipmentDatabase;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "Haulsight Demo Data Seeder",
    long_about = "Populate the shipment store with synthetic shipments for one customer"
)]
struct SeedArgs {
    /// Customer the shipments belong to
    #[arg(long, default_value = "demo")]
    customer_id: String,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Number of shipments to create
    #[arg(long, default_value = "500")]
    shipments: usize,

    /// Number of trailing days the ship dates are spread over
    #[arg(long, default_value = "180")]
    days: u32,

    /// Fixed RNG seed for a reproducible dataset
    #[arg(long)]
    seed: Option<u64>,

    /// Delete the customer's existing shipments first
    #[arg(long)]
    reset: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    info!("=== Haulsight Demo Data Seeder ===");

    let database_url = args
        .database_url
        .or_else(|| env::var(env_config::DATABASE_URL).ok())
        .unwrap_or_else(|| "sqlite:./data/haulsight.db".to_owned());
    info!("Connecting to database: {}", database_url);
    let database = ShipmentDatabase::new(&database_url).await?;

    if args.reset {
        let deleted = database.delete_for_customer(&args.customer_id).await?;
        info!("Deleted {} existing shipments", deleted);
    }

    let options = SeedOptions {
        shipments: args.shipments,
        days: args.days,
        seed: args.seed,
    };
    seed_demo_shipments(&database, &args.customer_id, &options).await?;

    let total = database.count_for_customer(&args.customer_id).await?;
    info!(
        "Customer '{}' now has {} shipments",
        args.customer_id, total
    );
    Ok(())
}
