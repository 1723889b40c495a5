//! S3 implementation of [`StorageApi`].

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::client::Waiters;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, PublicAccessBlockConfiguration,
    ServerSideEncryption, ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration,
    ServerSideEncryptionRule, Tag, Tagging,
};
use std::time::Duration;
use tracing::debug;

use crate::error::{CloudError, CloudResult};
use crate::resource::TagSet;

use super::StorageApi;
use super::context::AwsContext;

/// Longest time to wait for a new bucket to become visible.
const BUCKET_WAIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Region whose buckets must not carry a location constraint.
const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// S3-backed storage adapter.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    region: String,
}

impl S3Storage {
    /// Creates an adapter from a loaded context.
    #[must_use]
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self::new(Client::new(ctx.sdk_config()), ctx.region())
    }

    /// Wraps an already configured SDK client for buckets in `region`.
    #[must_use]
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

#[async_trait]
impl StorageApi for S3Storage {
    async fn list_buckets(&self) -> CloudResult<Vec<String>> {
        let mut names = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_buckets()
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(|e| CloudError::request("ListBuckets", "*", DisplayErrorContext(&e)))?;

            names.extend(
                response
                    .buckets()
                    .iter()
                    .filter_map(|b| b.name().map(ToString::to_string)),
            );

            match response.continuation_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }

        debug!("Listed {} buckets", names.len());
        Ok(names)
    }

    async fn create_bucket(&self, bucket: &str) -> CloudResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);

        if self.region != DEFAULT_BUCKET_REGION {
            let config = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build();
            request = request.create_bucket_configuration(config);
        }

        request
            .send()
            .await
            .map_err(|e| CloudError::request("CreateBucket", bucket, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn wait_until_exists(&self, bucket: &str) -> CloudResult<()> {
        self.client
            .wait_until_bucket_exists()
            .bucket(bucket)
            .wait(BUCKET_WAIT_TIMEOUT)
            .await
            .map_err(|e| {
                CloudError::request("WaitUntilBucketExists", bucket, DisplayErrorContext(&e))
            })?;
        Ok(())
    }

    async fn block_public_access(&self, bucket: &str) -> CloudResult<()> {
        let config = PublicAccessBlockConfiguration::builder()
            .block_public_acls(true)
            .ignore_public_acls(true)
            .block_public_policy(true)
            .restrict_public_buckets(true)
            .build();

        self.client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(config)
            .send()
            .await
            .map_err(|e| {
                CloudError::request("PutPublicAccessBlock", bucket, DisplayErrorContext(&e))
            })?;
        Ok(())
    }

    async fn put_bucket_encryption(&self, bucket: &str, kms_key_id: &str) -> CloudResult<()> {
        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::AwsKms)
            .kms_master_key_id(kms_key_id)
            .build()
            .map_err(|e| CloudError::invalid_request("PutBucketEncryption", e))?;

        let rule = ServerSideEncryptionRule::builder()
            .apply_server_side_encryption_by_default(by_default)
            .bucket_key_enabled(true)
            .build();

        let config = ServerSideEncryptionConfiguration::builder()
            .rules(rule)
            .build()
            .map_err(|e| CloudError::invalid_request("PutBucketEncryption", e))?;

        self.client
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(config)
            .send()
            .await
            .map_err(|e| {
                CloudError::request("PutBucketEncryption", bucket, DisplayErrorContext(&e))
            })?;
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> CloudResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| CloudError::request("PutBucketPolicy", bucket, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn put_bucket_tagging(&self, bucket: &str, tags: &TagSet) -> CloudResult<()> {
        let tag_set = tags
            .iter()
            .map(|(key, value)| {
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| CloudError::invalid_request("PutBucketTagging", e))
            })
            .collect::<CloudResult<Vec<_>>>()?;

        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| CloudError::invalid_request("PutBucketTagging", e))?;

        self.client
            .put_bucket_tagging()
            .bucket(bucket)
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| CloudError::request("PutBucketTagging", bucket, DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> CloudResult<()> {
        debug!("Uploading s3://{bucket}/{key} ({} bytes)", body.len());

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/zip")
            .send()
            .await
            .map_err(|e| {
                CloudError::request("PutObject", format!("{bucket}/{key}"), DisplayErrorContext(&e))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::retry::RetryConfig;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage(server: &MockServer) -> S3Storage {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .endpoint_url(server.uri())
            .force_path_style(true)
            .build();
        S3Storage::new(Client::from_conf(config), "eu-west-1")
    }

    fn page(names: &[&str], token: Option<&str>) -> ResponseTemplate {
        let buckets: String = names
            .iter()
            .map(|n| format!("<Bucket><Name>{n}</Name></Bucket>"))
            .collect();
        let token = token
            .map(|t| format!("<ContinuationToken>{t}</ContinuationToken>"))
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Buckets>{buckets}</Buckets>{token}</ListAllMyBucketsResult>"#
            ),
            "application/xml",
        )
    }

    #[tokio::test]
    async fn test_list_buckets_follows_continuation_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(page(&["aft-tfstate", "logs"], Some("page-2")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("continuation-token", "page-2"))
            .respond_with(page(&["111111111111-aft-deployment-codepipeline-artifact"], None))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        let names = storage(&server).list_buckets().await.unwrap();

        assert_eq!(
            names,
            vec![
                "aft-tfstate",
                "logs",
                "111111111111-aft-deployment-codepipeline-artifact"
            ]
        );
    }

    #[tokio::test]
    async fn test_list_buckets_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
                "application/xml",
            ))
            .mount(&server)
            .await;

        let err = storage(&server).list_buckets().await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::Request {
                operation: "ListBuckets",
                ..
            }
        ));
        assert!(err.to_string().contains("AccessDenied"));
    }
}
