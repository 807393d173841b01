//! # Error Types
//!
//! Structured error types for spring_core. Only *fatal* problems are errors:
//! a design that cannot be evaluated at all (non-positive radius, degenerate
//! travel, no enabled groups). Everything a human should see next to the
//! numbers (overstress, collision risk, NVH) is reported as a
//! [`Finding`](crate::calculations::torsional::Finding) instead.
//!
//! ## Example
//!
//! ```rust
//! use spring_core::errors::{CalcError, CalcResult};
//!
//! fn validate_radius(radius_mm: f64) -> CalcResult<()> {
//!     if !(radius_mm.is_finite() && radius_mm > 0.0) {
//!         return Err(CalcError::InvalidInput {
//!             field: "radius_mm".to_string(),
//!             value: radius_mm.to_string(),
//!             reason: "Radius must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for spring_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (non-finite, out of range, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Material not found by the lookup collaborator
    #[error("Material not found: {material_name}")]
    MaterialNotFound { material_name: String },

    /// Group geometry leaves no usable travel
    #[error("Degenerate geometry in group '{group}': {reason}")]
    DegenerateGeometry { group: String, reason: String },

    /// File I/O error (CLI only, the core never touches files)
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_name: impl Into<String>) -> Self {
        CalcError::MaterialNotFound {
            material_name: material_name.into(),
        }
    }

    /// Create a DegenerateGeometry error
    pub fn degenerate_geometry(group: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::DegenerateGeometry {
            group: group.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::DegenerateGeometry { .. } => "DEGENERATE_GEOMETRY",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::degenerate_geometry("outer", "free length 30 <= solid 28 + clearance 2");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"DegenerateGeometry\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("groups").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::material_not_found("unobtainium").error_code(), "MATERIAL_NOT_FOUND");
        assert_eq!(
            CalcError::invalid_input("radius_mm", "-1", "Radius must be positive").error_code(),
            "INVALID_INPUT"
        );
    }

    #[test]
    fn test_from_json_error() {
        let err: CalcError = serde_json::from_str::<f64>("not a number").unwrap_err().into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
