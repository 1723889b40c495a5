//! Configuration types for the deployment file.
//!
//! This module defines the structs that map to `aftctl.deploy.yaml`. Every
//! resource name has a default, so a minimal file only carries the account
//! ids, the region and the Terraform state bucket.

use serde::{Deserialize, Serialize};

/// Suffix appended to the repository name to form the seeding stack name.
pub const STACK_SUFFIX: &str = "-cloudformation-stack";

/// Service principal trusted by the pipeline role.
pub const CODEPIPELINE_SERVICE: &str = "codepipeline.amazonaws.com";

/// Service principal trusted by the build role.
pub const CODEBUILD_SERVICE: &str = "codebuild.amazonaws.com";

/// The root configuration structure for an AFT deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployConfig {
    /// Descriptive metadata.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Resources created in the AFT management account.
    pub deployment: DeploymentConfig,
    /// Control Tower landing zone accounts and regions.
    pub control_tower: ControlTowerConfig,
    /// Terraform used by the pipeline and by AFT.
    #[serde(default)]
    pub terraform: TerraformConfig,
    /// AFT feature flags.
    #[serde(default)]
    pub aft_features: AftFeaturesConfig,
}

/// Descriptive metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataConfig {
    /// Name of this deployment.
    #[serde(default = "default_metadata_name")]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Resources created in the AFT management account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Region where the deployment resources are created.
    #[serde(default)]
    pub region: String,
    /// AFT management account id.
    #[serde(default)]
    pub aft_account_id: String,
    /// Bucket holding the Terraform state of the AFT deployment.
    #[serde(default)]
    pub state_bucket: String,
    /// KMS key for default bucket encryption (optional).
    #[serde(default)]
    pub kms_key_id: Option<String>,
    /// Source repository.
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// Build project and its role.
    #[serde(default)]
    pub codebuild: CodeBuildConfig,
    /// Pipeline, its role and its artifact bucket.
    #[serde(default)]
    pub codepipeline: CodePipelineConfig,
}

/// Source repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository name.
    #[serde(default = "default_repository_name")]
    pub name: String,
    /// Repository description.
    #[serde(default = "default_repository_description")]
    pub description: String,
    /// Default branch.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Create the repository through a stack seeded with the generated files.
    /// When false the repository is created empty and push instructions are
    /// printed instead.
    #[serde(default = "default_true")]
    pub seed_with_stack: bool,
}

/// Build project configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeBuildConfig {
    /// Service role name.
    #[serde(default = "default_codebuild_role")]
    pub role: String,
    /// Inline policy name of the service role.
    #[serde(default = "default_codebuild_policy")]
    pub policy: String,
    /// Project name.
    #[serde(default = "default_codebuild_project")]
    pub project: String,
    /// Build container image.
    #[serde(default = "default_docker_image")]
    pub docker_image: String,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodePipelineConfig {
    /// Service role name.
    #[serde(default = "default_codepipeline_role")]
    pub role: String,
    /// Inline policy name of the service role.
    #[serde(default = "default_codepipeline_policy")]
    pub policy: String,
    /// Artifact bucket suffix; the account id is prepended.
    #[serde(default = "default_codepipeline_bucket")]
    pub bucket: String,
    /// Pipeline name.
    #[serde(default = "default_codepipeline_pipeline")]
    pub pipeline: String,
}

/// Control Tower landing zone configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlTowerConfig {
    /// Management (payer) account id.
    #[serde(default)]
    pub management_account_id: String,
    /// Log archive account id.
    #[serde(default)]
    pub log_archive_account_id: String,
    /// Audit account id.
    #[serde(default)]
    pub audit_account_id: String,
    /// Control Tower home region.
    #[serde(default)]
    pub home_region: String,
    /// Secondary region for the AFT Terraform backend.
    #[serde(default)]
    pub secondary_region: String,
}

/// Terraform configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerraformConfig {
    /// Terraform version installed by the build and used by AFT.
    #[serde(default = "default_terraform_version")]
    pub version: String,
    /// Terraform distribution: `oss` or `tfc`.
    #[serde(default = "default_terraform_distribution")]
    pub distribution: String,
}

/// AFT feature flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AftFeaturesConfig {
    /// Report AFT usage metrics.
    #[serde(default = "default_true")]
    pub metrics_reporting: bool,
    /// Enable CloudTrail data events.
    #[serde(default = "default_true")]
    pub cloudtrail_data_events: bool,
    /// Enable enterprise support on vended accounts.
    #[serde(default = "default_true")]
    pub enterprise_support: bool,
    /// Delete default VPCs in vended accounts.
    #[serde(default = "default_true")]
    pub delete_default_vpcs: bool,
}

// Default value functions

const fn default_true() -> bool {
    true
}

fn default_metadata_name() -> String {
    String::from("aft")
}

fn default_repository_name() -> String {
    String::from("aft-deployment")
}

fn default_repository_description() -> String {
    String::from("CodeCommit repository to store the AFT deployment files")
}

fn default_branch() -> String {
    String::from("main")
}

fn default_codebuild_role() -> String {
    String::from("aft-deployment-codebuild-service-role")
}

fn default_codebuild_policy() -> String {
    String::from("aft-deployment-build-service-role-policy")
}

fn default_codebuild_project() -> String {
    String::from("aft-deployment-build")
}

fn default_docker_image() -> String {
    String::from("aws/codebuild/amazonlinux2-x86_64-standard:4.0")
}

fn default_codepipeline_role() -> String {
    String::from("aft-deployment-codepipeline-service-role")
}

fn default_codepipeline_policy() -> String {
    String::from("aft-deployment-codepipeline-service-role-policy")
}

fn default_codepipeline_bucket() -> String {
    String::from("aft-deployment-codepipeline-artifact")
}

fn default_codepipeline_pipeline() -> String {
    String::from("aft-deployment-pipeline")
}

fn default_terraform_version() -> String {
    String::from("1.5.6")
}

fn default_terraform_distribution() -> String {
    String::from("oss")
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            name: default_metadata_name(),
            description: None,
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            name: default_repository_name(),
            description: default_repository_description(),
            branch: default_branch(),
            seed_with_stack: true,
        }
    }
}

impl Default for CodeBuildConfig {
    fn default() -> Self {
        Self {
            role: default_codebuild_role(),
            policy: default_codebuild_policy(),
            project: default_codebuild_project(),
            docker_image: default_docker_image(),
        }
    }
}

impl Default for CodePipelineConfig {
    fn default() -> Self {
        Self {
            role: default_codepipeline_role(),
            policy: default_codepipeline_policy(),
            bucket: default_codepipeline_bucket(),
            pipeline: default_codepipeline_pipeline(),
        }
    }
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            version: default_terraform_version(),
            distribution: default_terraform_distribution(),
        }
    }
}

impl Default for AftFeaturesConfig {
    fn default() -> Self {
        Self {
            metrics_reporting: true,
            cloudtrail_data_events: true,
            enterprise_support: true,
            delete_default_vpcs: true,
        }
    }
}

impl DeployConfig {
    /// Returns the pipeline artifact bucket name, `<account>-<bucket>`.
    #[must_use]
    pub fn artifact_bucket(&self) -> String {
        format!(
            "{}-{}",
            self.deployment.aft_account_id, self.deployment.codepipeline.bucket
        )
    }

    /// Returns the object key of the seed archive, `<repository>.zip`.
    #[must_use]
    pub fn seed_archive_key(&self) -> String {
        format!("{}.zip", self.deployment.repository.name)
    }

    /// Returns the seeding stack name, `<repository>-cloudformation-stack`.
    #[must_use]
    pub fn stack_name(&self) -> String {
        format!("{}{STACK_SUFFIX}", self.deployment.repository.name)
    }

    /// Returns every account id in the file with its field path.
    #[must_use]
    pub fn account_ids(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("deployment.aft_account_id", self.deployment.aft_account_id.as_str()),
            (
                "control_tower.management_account_id",
                self.control_tower.management_account_id.as_str(),
            ),
            (
                "control_tower.log_archive_account_id",
                self.control_tower.log_archive_account_id.as_str(),
            ),
            (
                "control_tower.audit_account_id",
                self.control_tower.audit_account_id.as_str(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_aft_deployment_naming() {
        let deployment: DeploymentConfig = serde_yaml::from_str("region: us-east-1").unwrap();

        assert_eq!(deployment.repository.name, "aft-deployment");
        assert_eq!(deployment.repository.branch, "main");
        assert!(deployment.repository.seed_with_stack);
        assert_eq!(deployment.codebuild.project, "aft-deployment-build");
        assert_eq!(deployment.codepipeline.pipeline, "aft-deployment-pipeline");
        assert_eq!(
            deployment.codebuild.docker_image,
            "aws/codebuild/amazonlinux2-x86_64-standard:4.0"
        );
    }

    #[test]
    fn test_derived_names() {
        let config: DeployConfig = serde_yaml::from_str(
            r"
deployment:
  aft_account_id: '123456789012'
control_tower: {}
",
        )
        .unwrap();

        assert_eq!(
            config.artifact_bucket(),
            "123456789012-aft-deployment-codepipeline-artifact"
        );
        assert_eq!(config.seed_archive_key(), "aft-deployment.zip");
        assert_eq!(config.stack_name(), "aft-deployment-cloudformation-stack");
        assert_eq!(config.terraform.version, "1.5.6");
        assert_eq!(config.aft_features, AftFeaturesConfig::default());
    }
}
