//! `CodePipeline` pipeline strategy.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::cloud::{ActionRequest, PipelineApi, PipelineRequest, StageRequest};
use crate::error::CloudResult;
use crate::resource::{ResourceDescriptor, ResourceKind, TagSet};

use super::{ManagedResource, role_arn};

/// Artifact produced by the source stage.
pub const SOURCE_ARTIFACT: &str = "App";

/// Artifact produced by the build stage.
pub const BUILD_ARTIFACT: &str = "BuildOutput";

/// A two-stage pipeline: pull the repository branch, then run the build
/// project on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    /// Pipeline name.
    pub name: String,
    /// Account owning the pipeline role.
    pub account_id: String,
    /// Role the pipeline runs as.
    pub pipeline_role: String,
    /// Bucket holding pipeline artifacts.
    pub artifact_bucket: String,
    /// Source repository.
    pub repository: String,
    /// Source branch.
    pub branch: String,
    /// Build project run by the second stage.
    pub build_project: String,
    /// Tags applied on creation.
    pub tags: TagSet,
}

impl PipelineSpec {
    /// Builds the provider request for this pipeline.
    #[must_use]
    pub fn request(&self) -> PipelineRequest {
        let source = ActionRequest {
            name: String::from(SOURCE_ARTIFACT),
            category: String::from("Source"),
            provider: String::from("CodeCommit"),
            configuration: BTreeMap::from([
                (String::from("RepositoryName"), self.repository.clone()),
                (String::from("BranchName"), self.branch.clone()),
            ]),
            input_artifacts: Vec::new(),
            output_artifacts: vec![String::from(SOURCE_ARTIFACT)],
            run_order: 1,
        };

        let build = ActionRequest {
            name: String::from("Build"),
            category: String::from("Build"),
            provider: String::from("CodeBuild"),
            configuration: BTreeMap::from([(
                String::from("ProjectName"),
                self.build_project.clone(),
            )]),
            input_artifacts: vec![String::from(SOURCE_ARTIFACT)],
            output_artifacts: vec![String::from(BUILD_ARTIFACT)],
            run_order: 1,
        };

        PipelineRequest {
            name: self.name.clone(),
            role_arn: role_arn(&self.account_id, &self.pipeline_role),
            artifact_bucket: self.artifact_bucket.clone(),
            stages: vec![
                StageRequest {
                    name: String::from("Source"),
                    actions: vec![source],
                },
                StageRequest {
                    name: String::from("Build"),
                    actions: vec![build],
                },
            ],
            tags: self.tags.clone(),
        }
    }
}

#[async_trait]
impl ManagedResource for PipelineSpec {
    type Client = dyn PipelineApi;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Pipeline
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Pipeline, &self.name)
            .with_parameter("role", &self.pipeline_role)
            .with_parameter("artifact_bucket", &self.artifact_bucket)
            .with_parameter("repository", &self.repository)
            .with_parameter("branch", &self.branch)
            .with_parameter("build_project", &self.build_project)
    }

    async fn exists(&self, client: &Self::Client) -> CloudResult<bool> {
        let pipelines = client.list_pipelines().await?;
        Ok(pipelines.iter().any(|p| p == &self.name))
    }

    async fn create(&self, client: &Self::Client) -> CloudResult<()> {
        client.create_pipeline(&self.request()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::MockPipelineApi;
    use crate::ensure::{EnsureOutcome, Ensurer};
    use crate::error::{AftctlError, CloudError};

    fn spec() -> PipelineSpec {
        PipelineSpec {
            name: String::from("aft-deployment-pipeline"),
            account_id: String::from("123456789012"),
            pipeline_role: String::from("aft-deployment-codepipeline-service-role"),
            artifact_bucket: String::from("123456789012-aft-deployment-codepipeline-artifact"),
            repository: String::from("aft-deployment"),
            branch: String::from("main"),
            build_project: String::from("aft-deployment-build"),
            tags: TagSet::aftctl(),
        }
    }

    #[test]
    fn test_request_wires_source_into_build() {
        let request = spec().request();
        assert_eq!(
            request.role_arn,
            "arn:aws:iam::123456789012:role/aft-deployment-codepipeline-service-role"
        );
        assert_eq!(request.stages.len(), 2);

        let source = &request.stages[0].actions[0];
        assert_eq!(source.provider, "CodeCommit");
        assert_eq!(
            source.configuration.get("BranchName").map(String::as_str),
            Some("main")
        );

        let build = &request.stages[1].actions[0];
        assert_eq!(build.provider, "CodeBuild");
        assert_eq!(build.input_artifacts, source.output_artifacts);
        assert_eq!(build.output_artifacts, vec![String::from("BuildOutput")]);
    }

    #[tokio::test]
    async fn test_absent_pipeline_is_created() {
        let mut client = MockPipelineApi::new();
        client.expect_list_pipelines().returning(|| Ok(Vec::new()));
        client
            .expect_create_pipeline()
            .withf(|request| request.artifact_bucket.ends_with("codepipeline-artifact"))
            .times(1)
            .returning(|_| Ok(()));

        let outcome = Ensurer::new()
            .ensure::<PipelineSpec>(Some(&client), &spec())
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Created);
    }

    #[tokio::test]
    async fn test_create_failure_is_reported() {
        let mut client = MockPipelineApi::new();
        client.expect_list_pipelines().returning(|| Ok(Vec::new()));
        client.expect_create_pipeline().times(1).returning(|request| {
            Err(CloudError::request(
                "CreatePipeline",
                &request.name,
                "InvalidStructureException",
            ))
        });

        let result = Ensurer::new()
            .ensure::<PipelineSpec>(Some(&client), &spec())
            .await;

        assert!(matches!(result, Err(AftctlError::Cloud(_))));
    }
}
