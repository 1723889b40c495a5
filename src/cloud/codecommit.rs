//! `CodeCommit` implementation of [`SourceControlApi`].

use async_trait::async_trait;
use aws_sdk_codecommit::Client;
use aws_sdk_codecommit::error::DisplayErrorContext;
use tracing::debug;

use crate::error::{CloudError, CloudResult};
use crate::resource::TagSet;

use super::SourceControlApi;
use super::context::AwsContext;

/// `CodeCommit`-backed repository adapter.
#[derive(Debug, Clone)]
pub struct CodeCommitRepositories {
    client: Client,
}

impl CodeCommitRepositories {
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
}

#[async_trait]
impl SourceControlApi for CodeCommitRepositories {
    async fn repository_exists(&self, repository: &str) -> CloudResult<bool> {
        match self
            .client
            .get_repository()
            .repository_name(repository)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_repository_does_not_exist_exception() {
                    debug!("Repository {repository} does not exist");
                    Ok(false)
                } else {
                    Err(CloudError::request(
                        "GetRepository",
                        repository,
                        DisplayErrorContext(&service_err),
                    ))
                }
            }
        }
    }

    async fn create_repository(
        &self,
        repository: &str,
        description: &str,
        tags: &TagSet,
    ) -> CloudResult<()> {
        let request = tags.iter().fold(
            self.client
                .create_repository()
                .repository_name(repository)
                .repository_description(description),
            |request, (key, value)| request.tags(key, value),
        );

        request.send().await.map_err(|e| {
            CloudError::request("CreateRepository", repository, DisplayErrorContext(&e))
        })?;
        Ok(())
    }
}
