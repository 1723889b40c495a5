//! Provider capability traits and their AWS implementations.
//!
//! Each trait covers the calls one resource kind needs. The ensure
//! strategies only see these traits, so tests substitute mocks and the
//! binary plugs in the SDK-backed adapters built from one [`AwsContext`].

mod cloudformation;
mod codebuild;
mod codecommit;
mod codepipeline;
mod context;
mod iam;
mod s3;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::CloudResult;
use crate::resource::TagSet;

pub use cloudformation::CloudFormationStacks;
pub use codebuild::CodeBuildProjects;
pub use codecommit::CodeCommitRepositories;
pub use codepipeline::CodePipelinePipelines;
pub use context::{AwsContext, CloudClients};
pub use iam::IamRoles;
pub use s3::S3Storage;

/// Object storage calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Lists the names of every bucket owned by the account.
    async fn list_buckets(&self) -> CloudResult<Vec<String>>;

    /// Creates a bucket.
    async fn create_bucket(&self, bucket: &str) -> CloudResult<()>;

    /// Waits until a newly created bucket is visible.
    async fn wait_until_exists(&self, bucket: &str) -> CloudResult<()>;

    /// Blocks every form of public access on a bucket.
    async fn block_public_access(&self, bucket: &str) -> CloudResult<()>;

    /// Enables default SSE-KMS encryption with the given key.
    async fn put_bucket_encryption(&self, bucket: &str, kms_key_id: &str) -> CloudResult<()>;

    /// Replaces the bucket policy.
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> CloudResult<()>;

    /// Replaces the bucket tags.
    async fn put_bucket_tagging(&self, bucket: &str, tags: &TagSet) -> CloudResult<()>;

    /// Uploads an object.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> CloudResult<()>;
}

/// Identity calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Returns whether the role exists; a "no such entity" answer is `false`.
    async fn role_exists(&self, role: &str) -> CloudResult<bool>;

    /// Creates a role at path `/` with the given trust policy.
    async fn create_role(&self, role: &str, trust_policy: &str, tags: &TagSet) -> CloudResult<()>;

    /// Adds or replaces an inline role policy.
    async fn put_role_policy(
        &self,
        role: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> CloudResult<()>;
}

/// Source control calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceControlApi: Send + Sync {
    /// Returns whether the repository exists; a "does not exist" answer is `false`.
    async fn repository_exists(&self, repository: &str) -> CloudResult<bool>;

    /// Creates a repository.
    async fn create_repository(
        &self,
        repository: &str,
        description: &str,
        tags: &TagSet,
    ) -> CloudResult<()>;
}

/// Build service calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildApi: Send + Sync {
    /// Lists every build project name.
    async fn list_projects(&self) -> CloudResult<Vec<String>>;

    /// Creates a build project.
    async fn create_project(&self, request: &BuildProjectRequest) -> CloudResult<()>;
}

/// Pipeline service calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Lists every pipeline name.
    async fn list_pipelines(&self) -> CloudResult<Vec<String>>;

    /// Creates a pipeline.
    async fn create_pipeline(&self, request: &PipelineRequest) -> CloudResult<()>;
}

/// Infrastructure stack calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Describes a stack and returns its status.
    async fn describe_stack(&self, stack: &str) -> CloudResult<String>;

    /// Creates a stack from a template body and returns the stack id.
    async fn create_stack(
        &self,
        stack: &str,
        template_body: &str,
        tags: &TagSet,
    ) -> CloudResult<String>;
}

/// Inputs for creating a build project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProjectRequest {
    /// Project name.
    pub name: String,
    /// ARN of the role the build runs as.
    pub service_role_arn: String,
    /// Container image.
    pub image: String,
    /// Compute size (e.g. `BUILD_GENERAL1_SMALL`).
    pub compute_type: String,
    /// Environment type (e.g. `LINUX_CONTAINER`).
    pub environment_type: String,
    /// Whether the build container runs privileged.
    pub privileged_mode: bool,
    /// Plaintext environment variables.
    pub environment_variables: BTreeMap<String, String>,
    /// Tags applied to the project.
    pub tags: TagSet,
}

/// Inputs for creating a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Pipeline name.
    pub name: String,
    /// ARN of the role the pipeline runs as.
    pub role_arn: String,
    /// Bucket holding pipeline artifacts.
    pub artifact_bucket: String,
    /// Ordered stages.
    pub stages: Vec<StageRequest>,
    /// Tags applied to the pipeline.
    pub tags: TagSet,
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    /// Stage name.
    pub name: String,
    /// Actions run in this stage.
    pub actions: Vec<ActionRequest>,
}

/// One pipeline action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// Action name.
    pub name: String,
    /// Action category (e.g. `Source`, `Build`).
    pub category: String,
    /// Action provider (e.g. `CodeCommit`, `CodeBuild`).
    pub provider: String,
    /// Provider-specific configuration.
    pub configuration: BTreeMap<String, String>,
    /// Names of consumed artifacts.
    pub input_artifacts: Vec<String>,
    /// Names of produced artifacts.
    pub output_artifacts: Vec<String>,
    /// Position within the stage.
    pub run_order: i32,
}
