//! IAM service role strategy.

use async_trait::async_trait;
use serde_json::json;

use crate::cloud::IdentityApi;
use crate::error::CloudResult;
use crate::resource::{ResourceDescriptor, ResourceKind, TagSet};

use super::ManagedResource;

/// An IAM role assumable by one AWS service, with one inline policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    /// Role name.
    pub name: String,
    /// Service principal trusted to assume the role.
    pub trusted_service: String,
    /// Name of the inline policy.
    pub policy_name: String,
    /// Region of the repository the role reads.
    pub region: String,
    /// Account owning every referenced resource.
    pub account_id: String,
    /// Repository the role reads from.
    pub repository: String,
    /// Pipeline artifact bucket.
    pub artifact_bucket: String,
    /// Terraform state bucket.
    pub state_bucket: String,
    /// Tags applied on creation.
    pub tags: TagSet,
}

impl RoleSpec {
    /// Renders the trust policy letting the service assume the role.
    #[must_use]
    pub fn trust_policy(&self) -> String {
        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": { "Service": self.trusted_service },
                    "Action": "sts:AssumeRole"
                }
            ]
        })
        .to_string()
    }

    /// Renders the inline permissions policy.
    #[must_use]
    pub fn permissions_policy(&self) -> String {
        let object_actions = [
            "s3:PutObject",
            "s3:GetObject",
            "s3:GetObjectVersion",
            "s3:GetBucketVersioning",
        ];

        json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Resource": "*",
                    "Action": ["codebuild:StartBuild", "codebuild:BatchGetBuilds"]
                },
                {
                    "Effect": "Allow",
                    "Resource": "*",
                    "Action": [
                        "logs:CreateLogGroup",
                        "logs:CreateLogStream",
                        "logs:PutLogEvents"
                    ]
                },
                {
                    "Effect": "Allow",
                    "Resource": format!(
                        "arn:aws:codecommit:{}:{}:{}",
                        self.region, self.account_id, self.repository
                    ),
                    "Action": [
                        "codecommit:GetBranch",
                        "codecommit:GetCommit",
                        "codecommit:UploadArchive",
                        "codecommit:GetUploadArchiveStatus",
                        "codecommit:CancelUploadArchive"
                    ]
                },
                {
                    "Effect": "Allow",
                    "Resource": format!("arn:aws:s3:::{}/*", self.artifact_bucket),
                    "Action": object_actions
                },
                {
                    "Effect": "Allow",
                    "Resource": format!("arn:aws:s3:::{}/*", self.state_bucket),
                    "Action": object_actions
                },
                {
                    "Effect": "Allow",
                    "Resource": "*",
                    "Action": [
                        "ec2:CreateNetworkInterface",
                        "ec2:DescribeDhcpOptions",
                        "ec2:DescribeNetworkInterfaces",
                        "ec2:DeleteNetworkInterface",
                        "ec2:DescribeSubnets",
                        "ec2:DescribeSecurityGroups",
                        "ec2:DescribeVpcs",
                        "ec2:CreateNetworkInterfacePermission"
                    ]
                }
            ]
        })
        .to_string()
    }
}

#[async_trait]
impl ManagedResource for RoleSpec {
    type Client = dyn IdentityApi;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Role
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Role, &self.name)
            .with_parameter("trusted_service", &self.trusted_service)
            .with_parameter("policy_name", &self.policy_name)
    }

    async fn exists(&self, client: &Self::Client) -> CloudResult<bool> {
        client.role_exists(&self.name).await
    }

    async fn create(&self, client: &Self::Client) -> CloudResult<()> {
        client
            .create_role(&self.name, &self.trust_policy(), &self.tags)
            .await?;
        client
            .put_role_policy(&self.name, &self.policy_name, &self.permissions_policy())
            .await
    }
}
