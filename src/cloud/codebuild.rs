//! `CodeBuild` implementation of [`BuildApi`].

use async_trait::async_trait;
use aws_sdk_codebuild::Client;
use aws_sdk_codebuild::error::DisplayErrorContext;
use aws_sdk_codebuild::types::{
    ArtifactsType, ComputeType, EnvironmentType, EnvironmentVariable, EnvironmentVariableType,
    ProjectArtifacts, ProjectEnvironment, ProjectSource, SourceType, Tag,
};
use tracing::debug;

use crate::error::{CloudError, CloudResult};

use super::context::AwsContext;
use super::{BuildApi, BuildProjectRequest};

/// `CodeBuild`-backed project adapter.
#[derive(Debug, Clone)]
pub struct CodeBuildProjects {
    client: Client,
}

impl CodeBuildProjects {
    /// Creates an adapter from a loaded context.
    #[must_use]
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self::new(Client::new(ctx.sdk_config()))
    }

    /// Wraps an already configured SDK client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    fn environment(request: &BuildProjectRequest) -> CloudResult<ProjectEnvironment> {
        let variables = request
            .environment_variables
            .iter()
            .map(|(name, value)| {
                EnvironmentVariable::builder()
                    .name(name)
                    .value(value)
                    .r#type(EnvironmentVariableType::Plaintext)
                    .build()
                    .map_err(|e| CloudError::invalid_request("CreateProject", e))
            })
            .collect::<CloudResult<Vec<_>>>()?;

        ProjectEnvironment::builder()
            .r#type(EnvironmentType::from(request.environment_type.as_str()))
            .compute_type(ComputeType::from(request.compute_type.as_str()))
            .image(&request.image)
            .privileged_mode(request.privileged_mode)
            .set_environment_variables(Some(variables))
            .build()
            .map_err(|e| CloudError::invalid_request("CreateProject", e))
    }
}

#[async_trait]
impl BuildApi for CodeBuildProjects {
    async fn list_projects(&self) -> CloudResult<Vec<String>> {
        let mut names = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_projects()
                .set_next_token(token.take())
                .send()
                .await
                .map_err(|e| CloudError::request("ListProjects", "*", DisplayErrorContext(&e)))?;

            names.extend(response.projects().iter().cloned());

            match response.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        debug!("Listed {} build projects", names.len());
        Ok(names)
    }

    async fn create_project(&self, request: &BuildProjectRequest) -> CloudResult<()> {
        let source = ProjectSource::builder()
            .r#type(SourceType::Codepipeline)
            .build()
            .map_err(|e| CloudError::invalid_request("CreateProject", e))?;

        let artifacts = ProjectArtifacts::builder()
            .r#type(ArtifactsType::Codepipeline)
            .build()
            .map_err(|e| CloudError::invalid_request("CreateProject", e))?;

        let tags = request
            .tags
            .iter()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect::<Vec<_>>();

        self.client
            .create_project()
            .name(&request.name)
            .source(source)
            .artifacts(artifacts)
            .environment(Self::environment(request)?)
            .service_role(&request.service_role_arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| {
                CloudError::request("CreateProject", &request.name, DisplayErrorContext(&e))
            })?;
        Ok(())
    }
}
