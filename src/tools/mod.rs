// ABOUTME: Investigation tool layer: catalog, argument validation, dispatch and results
// ABOUTME: Tools are keyed by the closed ToolId enum and run against the query engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Tool execution for investigations
//!
//! The reasoning service sees the declarations from [`tool_catalog`]. Each
//! requested call is validated into a [`ToolInvocation`] and executed by the
//! [`ToolExecutor`]; the outcome is always a [`ToolResult`], never an error,
//! so the model can correct bad arguments on its next turn.

/// Tool identifiers and JSON schemas
pub mod catalog;
/// Query engine dispatch
pub mod executor;
/// Typed argument structs and validation
pub mod invocation;
/// Tool results and transcript serialization
pub mod result;

pub use catalog::{tool_catalog, ToolId};
pub use executor::ToolExecutor;
pub use invocation::ToolInvocation;
pub use result::{FieldCatalog, ToolPayload, ToolResult};
