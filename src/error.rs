//! Error types for aftctl.
//!
//! This module provides the error hierarchy for every step of provisioning:
//! configuration, name compliance, provider calls, and repository seeding.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::resource::ResourceKind;

/// The main error type for aftctl.
#[derive(Debug, Error)]
pub enum AftctlError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A resource name violates its naming rules.
    #[error("Name error: {0}")]
    Name(#[from] NameError),

    /// AWS provider errors.
    #[error("AWS error: {0}")]
    Cloud(#[from] CloudError),

    /// Repository seeding errors.
    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// No provider client was supplied for a resource kind.
    #[error("{} is not provided", .kind.client_name())]
    MissingClient {
        /// Kind of resource the client was needed for.
        kind: ResourceKind,
    },

    /// A resource name was empty.
    #[error("{kind} name is not provided")]
    MissingName {
        /// Kind of resource whose name is missing.
        kind: ResourceKind,
    },

    /// An AWS account id is not twelve digits.
    #[error("Invalid AWS account id '{account_id}': must be exactly 12 digits")]
    InvalidAccountId {
        /// The rejected account id.
        account_id: String,
    },
}

/// Name compliance errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// The name breaks one of the rules for its kind.
    #[error("invalid {kind} name '{name}': {rule}")]
    Invalid {
        /// Kind of resource being named.
        kind: ResourceKind,
        /// The rejected name.
        name: String,
        /// The rule that was violated.
        rule: NameRule,
    },
}

/// A single naming rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRule {
    /// Length outside the allowed range (inclusive).
    Length {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
    },
    /// Starts with a reserved prefix.
    ReservedPrefix,
    /// Ends with a reserved suffix.
    ReservedSuffix,
    /// Contains characters outside the allowed set.
    Charset {
        /// Pattern the name must match.
        pattern: &'static str,
    },
    /// Contains two adjacent periods.
    AdjacentPeriods,
    /// Formatted like an IPv4 address.
    IpAddress,
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { min, max } => {
                write!(f, "name must be between {min} and {max} characters long")
            }
            Self::ReservedPrefix => {
                write!(f, "name cannot start with restricted prefixes (xn-- or sthree-)")
            }
            Self::ReservedSuffix => {
                write!(f, "name cannot end with restricted suffixes (-s3alias or --ol-s3)")
            }
            Self::Charset { pattern } => write!(f, "name must match {pattern}"),
            Self::AdjacentPeriods => write!(f, "name must not contain two adjacent periods"),
            Self::IpAddress => write!(f, "name must not be formatted as an IP address"),
        }
    }
}

/// AWS provider errors.
#[derive(Debug, Error)]
pub enum CloudError {
    /// A provider request failed.
    #[error("{operation} failed for '{resource}': {message}")]
    Request {
        /// Provider operation name (e.g. `CreateBucket`).
        operation: &'static str,
        /// Resource the request targeted.
        resource: String,
        /// Error text reported by the provider.
        message: String,
    },

    /// A request could not be assembled.
    #[error("Invalid {operation} request: {message}")]
    InvalidRequest {
        /// Provider operation name.
        operation: &'static str,
        /// Description of the problem.
        message: String,
    },
}

/// Repository seeding errors.
#[derive(Debug, Error)]
pub enum SeedError {
    /// A seed file could not be written.
    #[error("Failed to write {path}: {message}")]
    Write {
        /// Path of the file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The seed archive could not be built.
    #[error("Failed to build archive {path}: {message}")]
    Archive {
        /// Path of the archive.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for aftctl operations.
pub type Result<T> = std::result::Result<T, AftctlError>;

/// Result type alias for provider calls.
pub type CloudResult<T> = std::result::Result<T, CloudError>;

impl AftctlError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the error was raised before any provider call.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Name(_)
                | Self::Config(ConfigError::MissingClient { .. } | ConfigError::MissingName { .. })
        )
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl NameError {
    /// Returns the violated rule.
    #[must_use]
    pub const fn rule(&self) -> &NameRule {
        match self {
            Self::Invalid { rule, .. } => rule,
        }
    }
}

impl CloudError {
    /// Creates a request error from any displayable provider error.
    #[must_use]
    pub fn request(
        operation: &'static str,
        resource: impl Into<String>,
        message: impl fmt::Display,
    ) -> Self {
        Self::Request {
            operation,
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    /// Creates an invalid request error from a builder failure.
    #[must_use]
    pub fn invalid_request(operation: &'static str, message: impl fmt::Display) -> Self {
        Self::InvalidRequest {
            operation,
            message: message.to_string(),
        }
    }
}
