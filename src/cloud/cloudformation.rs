//! `CloudFormation` implementation of [`StackApi`].

use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::Tag;
use tracing::debug;

use crate::error::{CloudError, CloudResult};
use crate::resource::TagSet;

use super::StackApi;
use super::context::AwsContext;

/// `CloudFormation`-backed stack adapter.
#[derive(Debug, Clone)]
pub struct CloudFormationStacks {
    client: Client,
}

impl CloudFormationStacks {
    /// Creates an adapter from a loaded context.
    #[must_use]
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: Client::new(ctx.sdk_config()),
        }
    }
}

#[async_trait]
impl StackApi for CloudFormationStacks {
    async fn describe_stack(&self, stack: &str) -> CloudResult<String> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(stack)
            .send()
            .await
            .map_err(|e| CloudError::request("DescribeStacks", stack, DisplayErrorContext(&e)))?;

        let status = response
            .stacks()
            .first()
            .and_then(|s| s.stack_status())
            .map_or_else(|| String::from("UNKNOWN"), |s| s.as_str().to_string());

        debug!("Stack {stack} is {status}");
        Ok(status)
    }

    async fn create_stack(
        &self,
        stack: &str,
        template_body: &str,
        tags: &TagSet,
    ) -> CloudResult<String> {
        let tags = tags
            .iter()
            .map(|(key, value)| {
                Tag::builder().key(key).value(value).build()
            })
            .collect::<Vec<_>>();

        let response = self
            .client
            .create_stack()
            .stack_name(stack)
            .template_body(template_body)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| CloudError::request("CreateStack", stack, DisplayErrorContext(&e)))?;

        Ok(response.stack_id().unwrap_or_default().to_string())
    }
}
