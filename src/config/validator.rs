//! Configuration validation for deployment files.
//!
//! Every check runs locally. Errors block a deploy; warnings are reported
//! but never fail validation.

use crate::error::{AftctlError, ConfigError, Result};
use crate::naming::{check_aws_account_id, validate_name};
use crate::resource::ResourceKind;
use tracing::debug;

use super::spec::DeployConfig;

/// Terraform distributions accepted by AFT.
pub const TERRAFORM_DISTRIBUTIONS: &[&str] = &["oss", "tfc"];

/// Validator for deployment configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a deployment configuration and returns every finding.
    #[must_use]
    pub fn check(&self, config: &DeployConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_metadata(config, &mut result);
        Self::validate_accounts(config, &mut result);
        Self::validate_regions(config, &mut result);
        Self::validate_resource_names(config, &mut result);
        Self::validate_terraform(config, &mut result);

        result
    }

    /// Validates a deployment configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &DeployConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if let Some(first_error) = result.errors.first() {
            return Err(AftctlError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }));
        }

        debug!("Configuration validation passed");
        Ok(result)
    }

    fn validate_metadata(config: &DeployConfig, result: &mut ValidationResult) {
        if config.metadata.name.trim().is_empty() {
            result.error("metadata.name", "Deployment name cannot be empty");
        }
    }

    fn validate_accounts(config: &DeployConfig, result: &mut ValidationResult) {
        for (field, account_id) in config.account_ids() {
            if let Err(e) = check_aws_account_id(account_id) {
                result.error(field, e.to_string());
            }
        }

        if config.deployment.aft_account_id == config.control_tower.management_account_id
            && !config.deployment.aft_account_id.is_empty()
        {
            result.warnings.push(String::from(
                "AFT is deployed in the Control Tower management account; a dedicated AFT account is recommended",
            ));
        }
    }

    fn validate_regions(config: &DeployConfig, result: &mut ValidationResult) {
        if config.deployment.region.trim().is_empty() {
            result.error(
                "deployment.region",
                "Region is required (set it in the file or through AFTCTL_REGION)",
            );
        }

        if config.control_tower.home_region.trim().is_empty() {
            result.error("control_tower.home_region", "Control Tower home region is required");
        }

        if config.control_tower.secondary_region.trim().is_empty() {
            result.warnings.push(String::from(
                "control_tower.secondary_region is empty; the AFT backend will not be replicated",
            ));
        } else if config.control_tower.secondary_region == config.control_tower.home_region {
            result.error(
                "control_tower.secondary_region",
                "Secondary region must differ from the home region",
            );
        }
    }

    fn validate_resource_names(config: &DeployConfig, result: &mut ValidationResult) {
        let deployment = &config.deployment;

        if deployment.state_bucket.trim().is_empty() {
            result.error(
                "deployment.state_bucket",
                "Terraform state bucket is required (set it in the file or through AFTCTL_STATE_BUCKET)",
            );
        }

        let names = [
            ("deployment.state_bucket", ResourceKind::Bucket, deployment.state_bucket.clone()),
            ("deployment.codepipeline.bucket", ResourceKind::Bucket, config.artifact_bucket()),
            ("deployment.codebuild.role", ResourceKind::Role, deployment.codebuild.role.clone()),
            (
                "deployment.codepipeline.role",
                ResourceKind::Role,
                deployment.codepipeline.role.clone(),
            ),
            (
                "deployment.repository.name",
                ResourceKind::Repository,
                deployment.repository.name.clone(),
            ),
            ("deployment.repository.name", ResourceKind::Stack, config.stack_name()),
            (
                "deployment.codebuild.project",
                ResourceKind::BuildProject,
                deployment.codebuild.project.clone(),
            ),
            (
                "deployment.codepipeline.pipeline",
                ResourceKind::Pipeline,
                deployment.codepipeline.pipeline.clone(),
            ),
        ];

        for (field, kind, name) in names {
            if name.is_empty() {
                continue;
            }
            if let Err(e) = validate_name(kind, &name) {
                result.error(field, e.to_string());
            }
        }

        if deployment.repository.branch.trim().is_empty() {
            result.error("deployment.repository.branch", "Branch name cannot be empty");
        }

        if deployment.codebuild.docker_image.trim().is_empty() {
            result.error("deployment.codebuild.docker_image", "Docker image cannot be empty");
        }

        if deployment.kms_key_id.is_none() {
            result.warnings.push(String::from(
                "deployment.kms_key_id is not set; buckets keep the default S3 encryption",
            ));
        }
    }

    fn validate_terraform(config: &DeployConfig, result: &mut ValidationResult) {
        let terraform = &config.terraform;

        if !TERRAFORM_DISTRIBUTIONS.contains(&terraform.distribution.as_str()) {
            result.error(
                "terraform.distribution",
                format!(
                    "Terraform distribution '{}' is invalid. Must be one of: {}",
                    terraform.distribution,
                    TERRAFORM_DISTRIBUTIONS.join(", ")
                ),
            );
        }

        if !is_valid_version(&terraform.version) {
            result.error(
                "terraform.version",
                format!(
                    "Terraform version '{}' is invalid. Must look like 1.5.6",
                    terraform.version
                ),
            );
        }
    }
}

/// Checks a `MAJOR.MINOR.PATCH` version string.
fn is_valid_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

impl ValidationResult {
    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
