// ABOUTME: Query error type returned by every engine operation
// ABOUTME: Distinguishes argument problems the model can fix from data store failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use haulsight_core::errors::AppError;
use thiserror::Error;

use crate::schema::UnknownField;

/// Why a query could not produce a result
#[derive(Debug, Error)]
pub enum QueryError {
    /// A field or metric name is not in the registry
    #[error("{0}")]
    UnknownField(UnknownField),

    /// The field exists but cannot play the requested role
    #[error("field '{field}' cannot be used {role}")]
    UnsupportedField {
        /// Field name
        field: String,
        /// Role description, e.g. "as a grouping dimension"
        role: &'static str,
    },

    /// An argument value is malformed or inconsistent
    #[error("invalid value for '{parameter}': {reason}")]
    InvalidArgument {
        /// Parameter name
        parameter: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The data store failed
    #[error("data store query failed: {0}")]
    Store(#[from] AppError),
}

impl QueryError {
    /// Whether the caller can fix the error by changing arguments
    #[must_use]
    pub const fn is_argument_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }
}

impl From<UnknownField> for QueryError {
    fn from(miss: UnknownField) -> Self {
        Self::UnknownField(miss)
    }
}
