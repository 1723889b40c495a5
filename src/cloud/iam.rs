//! IAM implementation of [`IdentityApi`].

use async_trait::async_trait;
use aws_sdk_iam::Client;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::Tag;
use tracing::debug;

use crate::error::{CloudError, CloudResult};
use crate::resource::TagSet;

use super::IdentityApi;
use super::context::AwsContext;

/// IAM-backed role adapter.
#[derive(Debug, Clone)]
pub struct IamRoles {
    client: Client,
}

impl IamRoles {
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
impl IdentityApi for IamRoles {
    async fn role_exists(&self, role: &str) -> CloudResult<bool> {
        match self.client.get_role().role_name(role).send().await {
            Ok(_) => Ok(true),
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_no_such_entity_exception() {
                    debug!("Role {role} does not exist");
                    Ok(false)
                } else {
                    Err(CloudError::request(
                        "GetRole",
                        role,
                        DisplayErrorContext(&service_err),
                    ))
                }
            }
        }
    }

    async fn create_role(&self, role: &str, trust_policy: &str, tags: &TagSet) -> CloudResult<()> {
        let tags = tags
            .iter()
            .map(|(key, value)| {
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| CloudError::invalid_request("CreateRole", e))
            })
            .collect::<CloudResult<Vec<_>>>()?;

        self.client
            .create_role()
            .role_name(role)
            .path("/")
            .assume_role_policy_document(trust_policy)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| CloudError::request("CreateRole", role, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn put_role_policy(
        &self,
        role: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> CloudResult<()> {
        self.client
            .put_role_policy()
            .role_name(role)
            .policy_name(policy_name)
            .policy_document(policy_document)
            .send()
            .await
            .map_err(|e| CloudError::request("PutRolePolicy", role, DisplayErrorContext(&e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_iam::config::retry::RetryConfig;
    use aws_sdk_iam::config::{BehaviorVersion, Credentials, Region};
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ROLE: &str = "aft-deployment-codebuild-service-role";

    fn roles(server: &MockServer) -> IamRoles {
        let config = aws_sdk_iam::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .endpoint_url(server.uri())
            .build();
        IamRoles::new(Client::from_conf(config))
    }

    fn error_body(code: &str) -> String {
        format!(
            r#"<ErrorResponse xmlns="https://iam.amazonaws.com/doc/2010-05-08/">
  <Error>
    <Type>Sender</Type>
    <Code>{code}</Code>
    <Message>{code} for {ROLE}</Message>
  </Error>
  <RequestId>4a2f1c3e-0000-0000-0000-000000000000</RequestId>
</ErrorResponse>"#
        )
    }

    async fn mount_get_role(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_string_contains("Action=GetRole"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_no_such_entity_means_absent() {
        let server = MockServer::start().await;
        mount_get_role(
            &server,
            ResponseTemplate::new(404).set_body_raw(error_body("NoSuchEntity"), "text/xml"),
        )
        .await;

        assert!(!roles(&server).role_exists(ROLE).await.unwrap());
    }

    #[tokio::test]
    async fn test_other_errors_propagate_with_role_name() {
        let server = MockServer::start().await;
        mount_get_role(
            &server,
            ResponseTemplate::new(400).set_body_raw(error_body("Throttling"), "text/xml"),
        )
        .await;

        let err = roles(&server).role_exists(ROLE).await.unwrap_err();
        match &err {
            CloudError::Request {
                operation,
                resource,
                ..
            } => {
                assert_eq!(*operation, "GetRole");
                assert_eq!(resource, ROLE);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("Throttling"));
    }

    #[tokio::test]
    async fn test_found_role_exists() {
        let server = MockServer::start().await;
        let body = format!(
            r#"<GetRoleResponse xmlns="https://iam.amazonaws.com/doc/2010-05-08/">
  <GetRoleResult>
    <Role>
      <Path>/</Path>
      <RoleName>{ROLE}</RoleName>
      <RoleId>AROAEXAMPLEID</RoleId>
      <Arn>arn:aws:iam::123456789012:role/{ROLE}</Arn>
      <CreateDate>2024-01-01T00:00:00Z</CreateDate>
    </Role>
  </GetRoleResult>
  <ResponseMetadata>
    <RequestId>4a2f1c3e-0000-0000-0000-000000000001</RequestId>
  </ResponseMetadata>
</GetRoleResponse>"#
        );
        mount_get_role(&server, ResponseTemplate::new(200).set_body_raw(body, "text/xml")).await;

        assert!(roles(&server).role_exists(ROLE).await.unwrap());
    }
}
