// ABOUTME: Dispatches validated tool invocations to the schema registry and query engine
// ABOUTME: Converts query errors into structured tool errors and honors cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use haulsight_analytics::{FieldCategory, QueryEngine, QueryError, QueryScope};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::invocation::ToolInvocation;
use super::result::{FieldCatalog, ToolPayload, ToolResult};
use crate::errors::ToolError;
use crate::llm::FunctionCall;
use crate::logging::AppLogger;

/// Runs tool calls for one tenant scope
#[derive(Clone)]
pub struct ToolExecutor {
    engine: QueryEngine,
}

impl ToolExecutor {
    /// Create an executor over a query engine
    #[must_use]
    pub const fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }

    /// Query engine used for dispatch
    #[must_use]
    pub const fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Validate and run one call; never fails, errors become failed results
    pub async fn execute(
        &self,
        scope: &QueryScope,
        call: &FunctionCall,
        cancel: &CancellationToken,
    ) -> (Option<ToolInvocation>, ToolResult) {
        let invocation = match ToolInvocation::parse(&call.name, &call.args) {
            Ok(invocation) => invocation,
            Err(error) => {
                debug!(
                    tool = %call.name,
                    call_id = %call.id,
                    error = %error,
                    "Rejected tool arguments"
                );
                AppLogger::log_tool_call(&scope.customer_id, &call.name, false, 0);
                return (None, ToolResult::failed(&call.id, &call.name, error));
            }
        };

        if cancel.is_cancelled() {
            return (
                Some(invocation),
                ToolResult::failed(&call.id, &call.name, ToolError::cancelled(&call.name)),
            );
        }

        let result = match self.dispatch(scope, &invocation).await {
            Ok(payload) => ToolResult::ok(&call.id, &call.name, payload),
            Err(error) => ToolResult::failed(
                &call.id,
                &call.name,
                to_tool_error(invocation.tool().name(), error),
            ),
        };
        AppLogger::log_tool_call(&scope.customer_id, &call.name, result.success, result.row_count);
        (Some(invocation), result)
    }

    async fn dispatch(
        &self,
        scope: &QueryScope,
        invocation: &ToolInvocation,
    ) -> Result<ToolPayload, QueryError> {
        match invocation {
            ToolInvocation::FieldInfo { field_name } => {
                self.field_info(field_name.as_deref()).map(ToolPayload::FieldCatalog)
            }
            ToolInvocation::AnalyzeMetric(request) => self
                .engine
                .analyze_metric(scope, request)
                .await
                .map(ToolPayload::GroupedAnalysis),
            ToolInvocation::Trend(request) => {
                self.engine.trend(scope, request).await.map(ToolPayload::Trend)
            }
            ToolInvocation::ComparePeriods(request) => self
                .engine
                .compare_periods(scope, request)
                .await
                .map(ToolPayload::Comparison),
            ToolInvocation::DetectAnomalies(request) => self
                .engine
                .detect_anomalies(scope, request)
                .await
                .map(ToolPayload::Anomalies),
            ToolInvocation::SummaryStats { time_range } => self
                .engine
                .summary_stats(scope, time_range.as_deref())
                .await
                .map(ToolPayload::Summary),
        }
    }

    /// Describe a field, a derived metric or a category; everything when `None`
    fn field_info(&self, name: Option<&str>) -> Result<FieldCatalog, QueryError> {
        let registry = self.engine.registry();
        let Some(name) = name else {
            return Ok(FieldCatalog {
                fields: registry.list_fields(None).into_iter().cloned().collect(),
                derived_metrics: registry.derived_metrics().to_vec(),
            });
        };

        let miss = match registry.describe_field(name) {
            Ok(field) => {
                return Ok(FieldCatalog {
                    fields: vec![field.clone()],
                    derived_metrics: Vec::new(),
                })
            }
            Err(miss) => miss,
        };
        if let Ok(spec) = registry.derived_metric(name) {
            return Ok(FieldCatalog {
                fields: Vec::new(),
                derived_metrics: vec![spec.clone()],
            });
        }
        if let Ok(category) = name.parse::<FieldCategory>() {
            return Ok(FieldCatalog {
                fields: registry.list_fields(Some(category)).into_iter().cloned().collect(),
                derived_metrics: Vec::new(),
            });
        }
        Err(QueryError::UnknownField(miss))
    }
}

/// Map an engine error onto the tool error shown to the model
fn to_tool_error(tool_name: &str, error: QueryError) -> ToolError {
    match error {
        QueryError::UnknownField(miss) => {
            ToolError::unknown_field(tool_name, miss.requested, miss.suggestions)
        }
        QueryError::UnsupportedField { field, role } => ToolError::invalid_parameter(
            tool_name,
            field.clone(),
            format!("field '{field}' cannot be used {role}"),
        ),
        QueryError::InvalidArgument { parameter, reason } => {
            ToolError::invalid_parameter(tool_name, parameter, reason)
        }
        QueryError::Store(source) => {
            warn!(tool = %tool_name, error = %source, "Query execution failed");
            ToolError::execution_failed(
                tool_name,
                "the data store query failed; try again or narrow the request",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haulsight_core::errors::AppError;

    #[test]
    fn test_store_errors_hide_details() {
        let error = to_tool_error(
            "get_trend",
            QueryError::Store(AppError::database("no such table: shipments_v2")),
        );
        assert!(matches!(error, ToolError::ExecutionFailed { .. }));
        assert!(!error.to_string().contains("shipments_v2"));
        assert!(!error.is_argument_error());
    }

    #[test]
    fn test_argument_errors_stay_correctable() {
        let error = to_tool_error(
            "compare_periods",
            QueryError::InvalidArgument {
                parameter: "period2",
                reason: "overlaps".to_owned(),
            },
        );
        assert_eq!(error, ToolError::invalid_parameter("compare_periods", "period2", "overlaps"));
    }
}
