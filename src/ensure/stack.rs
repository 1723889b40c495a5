//! `CloudFormation` stack strategy.
//!
//! The stack declares a repository seeded from an archive in S3, so the
//! repository starts with the generated Terraform files already committed.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::cloud::StackApi;
use crate::error::CloudResult;
use crate::resource::{ResourceDescriptor, ResourceKind, TagSet};

use super::ManagedResource;

/// A stack that creates a seeded repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSpec {
    /// Stack name.
    pub name: String,
    /// Repository declared by the stack.
    pub repository: String,
    /// Repository description.
    pub description: String,
    /// Branch the seed is committed to.
    pub branch: String,
    /// Bucket holding the seed archive.
    pub seed_bucket: String,
    /// Key of the seed archive.
    pub seed_key: String,
    /// Tags applied to the stack and the repository.
    pub tags: TagSet,
}

impl StackSpec {
    /// Renders the template body.
    #[must_use]
    pub fn template(&self) -> String {
        let tags: Vec<serde_json::Value> = self
            .tags
            .iter()
            .map(|(key, value)| json!({ "Key": key, "Value": value }))
            .collect();

        json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Description": format!("Seeded repository {}", self.repository),
            "Resources": {
                "AftRepository": {
                    "Type": "AWS::CodeCommit::Repository",
                    "Properties": {
                        "RepositoryName": self.repository,
                        "RepositoryDescription": self.description,
                        "Tags": tags,
                        "Code": {
                            "BranchName": self.branch,
                            "S3": {
                                "Bucket": self.seed_bucket,
                                "Key": self.seed_key
                            }
                        }
                    }
                }
            }
        })
        .to_string()
    }
}

#[async_trait]
impl ManagedResource for StackSpec {
    type Client = dyn StackApi;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Stack
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Stack, &self.name)
            .with_parameter("repository", &self.repository)
            .with_parameter("seed", format!("s3://{}/{}", self.seed_bucket, self.seed_key))
    }

    /// Any successful describe means the stack exists; any failure, including
    /// transport errors, means it does not.
    async fn exists(&self, client: &Self::Client) -> CloudResult<bool> {
        match client.describe_stack(&self.name).await {
            Ok(status) => {
                debug!("Stack {} found with status {status}", self.name);
                Ok(true)
            }
            Err(e) => {
                debug!("Stack {} treated as absent: {e}", self.name);
                Ok(false)
            }
        }
    }

    async fn create(&self, client: &Self::Client) -> CloudResult<()> {
        let stack_id = client
            .create_stack(&self.name, &self.template(), &self.tags)
            .await?;
        debug!("Stack {} submitted as {stack_id}", self.name);
        Ok(())
    }
}
