//! `CodePipeline` implementation of [`PipelineApi`].

use async_trait::async_trait;
use aws_sdk_codepipeline::Client;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types::{
    ActionCategory, ActionDeclaration, ActionOwner, ActionTypeId, ArtifactStore,
    ArtifactStoreType, InputArtifact, OutputArtifact, PipelineDeclaration, StageDeclaration, Tag,
};
use tracing::debug;

use crate::error::{CloudError, CloudResult};

use super::context::AwsContext;
use super::{ActionRequest, PipelineApi, PipelineRequest, StageRequest};

const OPERATION: &str = "CreatePipeline";

/// Version of the AWS-owned action types used by every stage.
const ACTION_TYPE_VERSION: &str = "1";

/// `CodePipeline`-backed pipeline adapter.
#[derive(Debug, Clone)]
pub struct CodePipelinePipelines {
    client: Client,
}

impl CodePipelinePipelines {
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

    fn action(action: &ActionRequest) -> CloudResult<ActionDeclaration> {
        let type_id = ActionTypeId::builder()
            .category(ActionCategory::from(action.category.as_str()))
            .owner(ActionOwner::Aws)
            .provider(&action.provider)
            .version(ACTION_TYPE_VERSION)
            .build()
            .map_err(|e| CloudError::invalid_request(OPERATION, e))?;

        let inputs = action
            .input_artifacts
            .iter()
            .map(|name| {
                InputArtifact::builder()
                    .name(name)
                    .build()
                    .map_err(|e| CloudError::invalid_request(OPERATION, e))
            })
            .collect::<CloudResult<Vec<_>>>()?;

        let outputs = action
            .output_artifacts
            .iter()
            .map(|name| {
                OutputArtifact::builder()
                    .name(name)
                    .build()
                    .map_err(|e| CloudError::invalid_request(OPERATION, e))
            })
            .collect::<CloudResult<Vec<_>>>()?;

        ActionDeclaration::builder()
            .name(&action.name)
            .action_type_id(type_id)
            .set_configuration(Some(action.configuration.clone().into_iter().collect()))
            .set_input_artifacts((!inputs.is_empty()).then_some(inputs))
            .set_output_artifacts((!outputs.is_empty()).then_some(outputs))
            .run_order(action.run_order)
            .build()
            .map_err(|e| CloudError::invalid_request(OPERATION, e))
    }

    fn stage(stage: &StageRequest) -> CloudResult<StageDeclaration> {
        let actions = stage
            .actions
            .iter()
            .map(Self::action)
            .collect::<CloudResult<Vec<_>>>()?;

        StageDeclaration::builder()
            .name(&stage.name)
            .set_actions(Some(actions))
            .build()
            .map_err(|e| CloudError::invalid_request(OPERATION, e))
    }

    fn declaration(request: &PipelineRequest) -> CloudResult<PipelineDeclaration> {
        let store = ArtifactStore::builder()
            .r#type(ArtifactStoreType::S3)
            .location(&request.artifact_bucket)
            .build()
            .map_err(|e| CloudError::invalid_request(OPERATION, e))?;

        let stages = request
            .stages
            .iter()
            .map(Self::stage)
            .collect::<CloudResult<Vec<_>>>()?;

        PipelineDeclaration::builder()
            .name(&request.name)
            .role_arn(&request.role_arn)
            .artifact_store(store)
            .set_stages(Some(stages))
            .build()
            .map_err(|e| CloudError::invalid_request(OPERATION, e))
    }
}

#[async_trait]
impl PipelineApi for CodePipelinePipelines {
    async fn list_pipelines(&self) -> CloudResult<Vec<String>> {
        let mut names = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_pipelines()
                .set_next_token(token.take())
                .send()
                .await
                .map_err(|e| CloudError::request("ListPipelines", "*", DisplayErrorContext(&e)))?;

            names.extend(
                response
                    .pipelines()
                    .iter()
                    .filter_map(|p| p.name().map(ToString::to_string)),
            );

            match response.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        debug!("Listed {} pipelines", names.len());
        Ok(names)
    }

    async fn create_pipeline(&self, request: &PipelineRequest) -> CloudResult<()> {
        let tags = request
            .tags
            .iter()
            .map(|(key, value)| {
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| CloudError::invalid_request(OPERATION, e))
            })
            .collect::<CloudResult<Vec<_>>>()?;

        self.client
            .create_pipeline()
            .pipeline(Self::declaration(request)?)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| CloudError::request(OPERATION, &request.name, DisplayErrorContext(&e)))?;
        Ok(())
    }
}
