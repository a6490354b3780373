// ABOUTME: Synthetic shipment generator for demo databases and local testing
// ABOUTME: Produces plausible carriers, lanes, costs and transit times over a trailing window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::{ShipmentDatabase, ShipmentRecord};
use crate::errors::AppResult;

/// Carrier name and its cost multiplier against the lane base rate
const CARRIERS: &[(&str, f64)] = &[
    ("FedEx Freight", 1.08),
    ("XPO Logistics", 0.97),
    ("Old Dominion", 1.12),
    ("Estes Express", 0.94),
    ("Saia", 0.91),
    ("J.B. Hunt", 1.02),
];

/// Mode, cost per mile and weight range in pounds
const MODES: &[(&str, f64, (f64, f64))] = &[
    ("LTL", 2.4, (150.0, 9_000.0)),
    ("FTL", 2.9, (12_000.0, 44_000.0)),
    ("Parcel", 4.8, (1.0, 149.0)),
    ("Intermodal", 1.7, (20_000.0, 42_000.0)),
];

const STATES: &[&str] = &[
    "CA", "TX", "IL", "GA", "OH", "PA", "NJ", "FL", "WA", "AZ", "TN", "NC",
];

/// Demo dataset shape
#[derive(Debug, Clone, Copy)]
pub struct SeedOptions {
    /// Shipments to create
    pub shipments: usize,
    /// Trailing days the ship dates are spread over
    pub days: u32,
    /// RNG seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            shipments: 500,
            days: 180,
            seed: None,
        }
    }
}

/// Generates synthetic shipments
pub struct ShipmentGenerator {
    rng: StdRng,
    now: DateTime<Utc>,
    days: u32,
}

impl ShipmentGenerator {
    /// Generator anchored at `now`
    #[must_use]
    pub fn new(options: &SeedOptions, now: DateTime<Utc>) -> Self {
        let rng = options
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            rng,
            now,
            days: options.days.max(1),
        }
    }

    /// Next shipment
    pub fn next_record(&mut self) -> ShipmentRecord {
        let (carrier, carrier_factor) = CARRIERS[self.rng.gen_range(0..CARRIERS.len())];
        let (mode, rate_per_mile, (min_weight, max_weight)) =
            MODES[self.rng.gen_range(0..MODES.len())];
        let origin = STATES[self.rng.gen_range(0..STATES.len())];
        let destination = STATES[self.rng.gen_range(0..STATES.len())];

        let miles: f64 = if origin == destination {
            self.rng.gen_range(15.0..250.0)
        } else {
            self.rng.gen_range(200.0..2_800.0)
        };
        let weight: f64 = self.rng.gen_range(min_weight..max_weight);
        let variance: f64 = self.rng.gen_range(0.85..1.15);
        let cost = round_cents(miles * rate_per_mile * carrier_factor * variance);
        let markup: f64 = self.rng.gen_range(1.08..1.32);
        let retail = round_cents(cost * markup);

        let base_transit = (miles / 500.0).ceil().max(1.0);
        let delay: f64 = if self.rng.gen_bool(0.15) {
            f64::from(self.rng.gen_range(1_u8..4))
        } else {
            0.0
        };
        let transit_days = base_transit + delay;

        let minutes_back = self.rng.gen_range(0..i64::from(self.days) * 24 * 60);
        let ship_date = self.now - Duration::minutes(minutes_back);
        let delivered_at = ship_date + Duration::hours((transit_days * 24.0) as i64);

        let (status, delivery_date, on_time) = if delivered_at > self.now {
            ("in_transit", None, None)
        } else if self.rng.gen_bool(0.03) {
            ("exception", None, Some(0.0))
        } else {
            ("delivered", Some(delivered_at), Some(if delay > 0.0 { 0.0 } else { 1.0 }))
        };

        ShipmentRecord {
            carrier_name: Some(carrier.to_owned()),
            mode: Some(mode.to_owned()),
            origin_state: Some(origin.to_owned()),
            destination_state: Some(destination.to_owned()),
            status: Some(status.to_owned()),
            retail: Some(retail),
            cost: Some(cost),
            margin: Some(round_cents(retail - cost)),
            miles: Some(miles.round()),
            weight: Some(weight.round()),
            transit_days: Some(transit_days),
            on_time,
            ship_date: Some(ship_date),
            delivery_date,
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Insert synthetic shipments for a customer, returning how many were written
///
/// # Errors
///
/// Returns an error if an insert fails.
pub async fn seed_demo_shipments(
    database: &ShipmentDatabase,
    customer_id: &str,
    options: &SeedOptions,
) -> AppResult<usize> {
    let mut generator = ShipmentGenerator::new(options, Utc::now());
    for _ in 0..options.shipments {
        database
            .insert_shipment(customer_id, &generator.next_record())
            .await?;
    }
    info!(
        customer_id = %customer_id,
        shipments = options.shipments,
        days = options.days,
        "Seeded demo shipments"
    );
    Ok(options.shipments)
}
