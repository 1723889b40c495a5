//! Shared AWS configuration.
//!
//! The SDK configuration is loaded once per invocation and every service
//! adapter is built from it.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;
use tracing::debug;

use super::{
    CloudFormationStacks, CodeBuildProjects, CodeCommitRepositories, CodePipelinePipelines,
    IamRoles, S3Storage,
};

/// Region used when neither the caller nor the environment names one.
pub const FALLBACK_REGION: &str = "us-east-1";

/// Loaded AWS SDK configuration.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Loads credentials and settings from the environment, optionally
    /// pinned to a region.
    pub async fn load(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        let region = config
            .region()
            .map_or_else(|| FALLBACK_REGION.to_string(), ToString::to_string);
        debug!("Loaded AWS configuration for region {region}");

        Self {
            config: Arc::new(config),
            region,
        }
    }

    /// Returns the underlying SDK configuration.
    #[must_use]
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Returns the resolved region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Every provider adapter the prerequisites workflow needs.
#[derive(Debug, Clone)]
pub struct CloudClients {
    /// Object storage.
    pub storage: S3Storage,
    /// Identity.
    pub identity: IamRoles,
    /// Source control.
    pub source_control: CodeCommitRepositories,
    /// Build service.
    pub build: CodeBuildProjects,
    /// Pipeline service.
    pub pipeline: CodePipelinePipelines,
    /// Infrastructure stacks.
    pub stack: CloudFormationStacks,
}

impl CloudClients {
    /// Builds every adapter from one context.
    #[must_use]
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            storage: S3Storage::from_context(ctx),
            identity: IamRoles::from_context(ctx),
            source_control: CodeCommitRepositories::from_context(ctx),
            build: CodeBuildProjects::from_context(ctx),
            pipeline: CodePipelinePipelines::from_context(ctx),
            stack: CloudFormationStacks::from_context(ctx),
        }
    }
}
