//! Resource kinds and descriptors.
//!
//! A [`ResourceDescriptor`] is the provider-neutral description of one
//! resource aftctl ensures: its kind, its name, the kind-specific creation
//! parameters, and the tags applied on creation.

mod tags;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub use tags::{CREATED_BY_KEY, CREATED_BY_VALUE, TagSet};

/// Kinds of resources aftctl knows how to ensure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// S3 bucket.
    Bucket,
    /// IAM service role.
    Role,
    /// `CodeCommit` repository.
    Repository,
    /// `CodeBuild` project.
    BuildProject,
    /// `CodePipeline` pipeline.
    Pipeline,
    /// `CloudFormation` stack.
    Stack,
}

impl ResourceKind {
    /// Every resource kind, in provisioning order.
    pub const ALL: [Self; 6] = [
        Self::Role,
        Self::Bucket,
        Self::Stack,
        Self::Repository,
        Self::BuildProject,
        Self::Pipeline,
    ];

    /// Name of the provider client this kind needs.
    #[must_use]
    pub const fn client_name(self) -> &'static str {
        match self {
            Self::Bucket => "S3Client",
            Self::Role => "IAMClient",
            Self::Repository => "CodeCommitClient",
            Self::BuildProject => "CodeBuildClient",
            Self::Pipeline => "CodePipelineClient",
            Self::Stack => "CloudFormationClient",
        }
    }

    /// Human-readable label including the service name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bucket => "S3 Bucket",
            Self::Role => "IAM Role",
            Self::Repository => "CodeCommit Repository",
            Self::BuildProject => "CodeBuild Project",
            Self::Pipeline => "CodePipeline Pipeline",
            Self::Stack => "CloudFormation Stack",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bucket => "bucket",
            Self::Role => "role",
            Self::Repository => "repository",
            Self::BuildProject => "project",
            Self::Pipeline => "pipeline",
            Self::Stack => "stack",
        };
        f.write_str(name)
    }
}

/// Provider-neutral description of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    /// Resource name as known to the provider.
    pub name: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Kind-specific creation inputs.
    pub parameters: BTreeMap<String, String>,
    /// Tags applied when the resource is created.
    pub tags: TagSet,
}

impl ResourceDescriptor {
    /// Creates a descriptor with no parameters and the aftctl tag set.
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: BTreeMap::new(),
            tags: TagSet::aftctl(),
        }
    }

    /// Adds a creation parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns a creation parameter by key.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Checks the name against the naming rules of its kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or violates a rule.
    pub fn check_name(&self) -> crate::error::Result<()> {
        crate::naming::validate_name(self.kind, &self.name)
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.label(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_parameters() {
        let descriptor = ResourceDescriptor::new(ResourceKind::Role, "aft-role")
            .with_parameter("trusted_service", "codebuild.amazonaws.com");

        assert_eq!(
            descriptor.parameter("trusted_service"),
            Some("codebuild.amazonaws.com")
        );
        assert_eq!(descriptor.parameter("missing"), None);
        assert_eq!(descriptor.tags, TagSet::aftctl());
        assert_eq!(descriptor.to_string(), "IAM Role aft-role");
    }

    #[test]
    fn test_descriptor_name_check() {
        assert!(ResourceDescriptor::new(ResourceKind::Bucket, "valid-bucket-name")
            .check_name()
            .is_ok());
        assert!(ResourceDescriptor::new(ResourceKind::Bucket, "ab")
            .check_name()
            .is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::BuildProject.to_string(), "project");
        assert_eq!(ResourceKind::Stack.client_name(), "CloudFormationClient");
    }
}
