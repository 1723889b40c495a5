//! `CodeBuild` project strategy.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::cloud::{BuildApi, BuildProjectRequest};
use crate::error::CloudResult;
use crate::resource::{ResourceDescriptor, ResourceKind, TagSet};

use super::{ManagedResource, role_arn};

/// Compute size of the build container.
pub const COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";

/// Environment type of the build container.
pub const ENVIRONMENT_TYPE: &str = "LINUX_CONTAINER";

/// A build project fed by the pipeline that applies the Terraform code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProjectSpec {
    /// Project name.
    pub name: String,
    /// Account owning the build role.
    pub account_id: String,
    /// Build container image.
    pub image: String,
    /// Repository exposed to the build as `REPOSITORY_NAME`.
    pub repository: String,
    /// Branch exposed to the build as `REPOSITORY_BRANCH`.
    pub branch: String,
    /// Role the build runs as.
    pub build_role: String,
    /// Tags applied on creation.
    pub tags: TagSet,
}

impl BuildProjectSpec {
    /// Builds the provider request for this project.
    #[must_use]
    pub fn request(&self) -> BuildProjectRequest {
        let mut environment_variables = BTreeMap::new();
        environment_variables.insert(String::from("REPOSITORY_NAME"), self.repository.clone());
        environment_variables.insert(String::from("REPOSITORY_BRANCH"), self.branch.clone());

        BuildProjectRequest {
            name: self.name.clone(),
            service_role_arn: role_arn(&self.account_id, &self.build_role),
            image: self.image.clone(),
            compute_type: COMPUTE_TYPE.to_string(),
            environment_type: ENVIRONMENT_TYPE.to_string(),
            privileged_mode: true,
            environment_variables,
            tags: self.tags.clone(),
        }
    }
}

#[async_trait]
impl ManagedResource for BuildProjectSpec {
    type Client = dyn BuildApi;

    fn kind(&self) -> ResourceKind {
        ResourceKind::BuildProject
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::BuildProject, &self.name)
            .with_parameter("image", &self.image)
            .with_parameter("service_role", &self.build_role)
            .with_parameter("repository", &self.repository)
            .with_parameter("branch", &self.branch)
    }

    async fn exists(&self, client: &Self::Client) -> CloudResult<bool> {
        let projects = client.list_projects().await?;
        Ok(projects.iter().any(|p| p == &self.name))
    }

    async fn create(&self, client: &Self::Client) -> CloudResult<()> {
        client.create_project(&self.request()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::MockBuildApi;
    use crate::ensure::{EnsureOutcome, Ensurer};

    fn spec() -> BuildProjectSpec {
        BuildProjectSpec {
            name: String::from("aft-deployment-build"),
            account_id: String::from("123456789012"),
            image: String::from("aws/codebuild/amazonlinux2-x86_64-standard:4.0"),
            repository: String::from("aft-deployment"),
            branch: String::from("main"),
            build_role: String::from("aft-deployment-codebuild-service-role"),
            tags: TagSet::aftctl(),
        }
    }

    #[test]
    fn test_request_shape() {
        let request = spec().request();
        assert_eq!(
            request.service_role_arn,
            "arn:aws:iam::123456789012:role/aft-deployment-codebuild-service-role"
        );
        assert_eq!(request.compute_type, "BUILD_GENERAL1_SMALL");
        assert_eq!(request.environment_type, "LINUX_CONTAINER");
        assert!(request.privileged_mode);
        assert_eq!(
            request.environment_variables.get("REPOSITORY_NAME").map(String::as_str),
            Some("aft-deployment")
        );
        assert_eq!(
            request.environment_variables.get("REPOSITORY_BRANCH").map(String::as_str),
            Some("main")
        );
    }

    #[tokio::test]
    async fn test_listed_project_is_not_created() {
        let mut client = MockBuildApi::new();
        client
            .expect_list_projects()
            .returning(|| Ok(vec![String::from("aft-deployment-build")]));
        client.expect_create_project().never();

        let outcome = Ensurer::new()
            .ensure::<BuildProjectSpec>(Some(&client), &spec())
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_unlisted_project_is_created() {
        let mut client = MockBuildApi::new();
        client
            .expect_list_projects()
            .returning(|| Ok(vec![String::from("aft-deployment-build-old")]));
        client
            .expect_create_project()
            .withf(|request| request.name == "aft-deployment-build")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = Ensurer::new()
            .ensure::<BuildProjectSpec>(Some(&client), &spec())
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Created);
    }
}
