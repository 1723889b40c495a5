//! S3 bucket strategy.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::cloud::StorageApi;
use crate::error::CloudResult;
use crate::resource::{ResourceDescriptor, ResourceKind, TagSet};
use crate::retry::RetryPolicy;

use super::{ManagedResource, role_arn};

/// An S3 bucket that the account and the build role can write to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    /// Bucket name.
    pub name: String,
    /// Account granted write/list access.
    pub account_id: String,
    /// Build role granted write/list access.
    pub build_role: String,
    /// KMS key for default encryption, if any.
    pub kms_key_id: Option<String>,
    /// Retry policy for the bucket policy step.
    pub policy_retry: RetryPolicy,
    /// Tags applied on creation.
    pub tags: TagSet,
}

impl BucketSpec {
    /// Creates a bucket spec with the default policy retry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        account_id: impl Into<String>,
        build_role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            account_id: account_id.into(),
            build_role: build_role.into(),
            kms_key_id: None,
            policy_retry: RetryPolicy::default(),
            tags: TagSet::aftctl(),
        }
    }

    /// Enables default SSE-KMS encryption with the given key.
    #[must_use]
    pub fn with_kms_key_id(mut self, kms_key_id: Option<String>) -> Self {
        self.kms_key_id = kms_key_id.filter(|k| !k.is_empty());
        self
    }

    /// Replaces the retry policy of the bucket policy step.
    #[must_use]
    pub const fn with_policy_retry(mut self, policy: RetryPolicy) -> Self {
        self.policy_retry = policy;
        self
    }

    /// Renders the bucket policy granting write and list access to the
    /// account root and to the build role.
    #[must_use]
    pub fn policy_document(&self) -> String {
        let actions = ["s3:PutObject", "s3:PutObjectAcl", "s3:ListBucket"];
        let resources = [
            format!("arn:aws:s3:::{}/*", self.name),
            format!("arn:aws:s3:::{}", self.name),
        ];

        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Sid": "AllowAccountWriteAndList",
                    "Effect": "Allow",
                    "Principal": { "AWS": format!("arn:aws:iam::{}:root", self.account_id) },
                    "Action": actions,
                    "Resource": resources,
                },
                {
                    "Sid": "AllowCodeBuild",
                    "Effect": "Allow",
                    "Principal": { "AWS": role_arn(&self.account_id, &self.build_role) },
                    "Action": actions,
                    "Resource": resources,
                }
            ]
        })
        .to_string()
    }
}

#[async_trait]
impl ManagedResource for BucketSpec {
    type Client = dyn StorageApi;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Bucket
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> ResourceDescriptor {
        let descriptor = ResourceDescriptor::new(ResourceKind::Bucket, &self.name)
            .with_parameter("account_id", &self.account_id)
            .with_parameter("build_role", &self.build_role);
        match &self.kms_key_id {
            Some(key) => descriptor.with_parameter("kms_key_id", key),
            None => descriptor,
        }
    }

    async fn exists(&self, client: &Self::Client) -> CloudResult<bool> {
        let buckets = client.list_buckets().await?;
        Ok(buckets.iter().any(|b| b == &self.name))
    }

    async fn create(&self, client: &Self::Client) -> CloudResult<()> {
        client.create_bucket(&self.name).await?;
        client.wait_until_exists(&self.name).await?;
        debug!("Bucket {} is visible", self.name);

        client.block_public_access(&self.name).await?;

        if let Some(key) = &self.kms_key_id {
            client.put_bucket_encryption(&self.name, key).await?;
        }

        let policy = self.policy_document();
        self.policy_retry
            .retry("PutBucketPolicy", || client.put_bucket_policy(&self.name, &policy))
            .await?;

        client.put_bucket_tagging(&self.name, &self.tags).await
    }
}
