//! Error types for the hatching crate.
//!
//! This module provides structured error types for parameter validation
//! and the hatching pipeline.

use inkhatch_core::GeometryError;
use thiserror::Error;

/// Errors that can occur while hatching an image.
#[derive(Error, Debug)]
pub enum HatchError {
    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Canvas or coordinate validation failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A background worker could not be joined.
    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Errors related to hatching parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// Parameters are mutually incompatible.
    #[error("Incompatible parameters: {0}")]
    Incompatible(String),
}

impl ParameterError {
    pub(crate) fn out_of_range(name: &str, value: f64, min: f64, max: f64) -> Self {
        ParameterError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ParameterError::InvalidValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for hatching operations.
pub type HatchResult<T> = Result<T, HatchError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;
