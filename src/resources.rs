// ABOUTME: Shared server resources handed to every HTTP handler as axum state
// ABOUTME: Bundles the investigation orchestrator with the loaded server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use haulsight_analytics::{QueryEngine, SchemaRegistry};

use crate::config::ServerConfig;
use crate::database::ShipmentDatabase;
use crate::investigation::InvestigationOrchestrator;
use crate::llm::ReasoningService;
use crate::tools::ToolExecutor;

/// Immutable state shared across requests
#[derive(Clone)]
pub struct ServerResources {
    /// Investigation driver
    pub orchestrator: InvestigationOrchestrator,
    /// Configuration the server was started with
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wrap an existing orchestrator
    #[must_use]
    pub const fn new(orchestrator: InvestigationOrchestrator, config: Arc<ServerConfig>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Wire the shipment registry, a database and a reasoning service together
    #[must_use]
    pub fn from_parts(
        database: ShipmentDatabase,
        reasoning: Arc<dyn ReasoningService>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let engine = QueryEngine::new(Arc::new(SchemaRegistry::shipments()), Arc::new(database));
        let orchestrator = InvestigationOrchestrator::new(
            reasoning,
            ToolExecutor::new(engine),
            config.investigation,
        );
        Self::new(orchestrator, config)
    }
}
