//! `CodeCommit` repository strategy.

use async_trait::async_trait;

use crate::cloud::SourceControlApi;
use crate::error::CloudResult;
use crate::resource::{ResourceDescriptor, ResourceKind, TagSet};

use super::ManagedResource;

/// A source repository created empty, to be seeded with a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    /// Repository name.
    pub name: String,
    /// Repository description.
    pub description: String,
    /// Tags applied on creation.
    pub tags: TagSet,
}

impl RepositorySpec {
    /// Creates a repository spec.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: TagSet::aftctl(),
        }
    }
}

#[async_trait]
impl ManagedResource for RepositorySpec {
    type Client = dyn SourceControlApi;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Repository, &self.name)
            .with_parameter("description", &self.description)
    }

    async fn exists(&self, client: &Self::Client) -> CloudResult<bool> {
        client.repository_exists(&self.name).await
    }

    async fn create(&self, client: &Self::Client) -> CloudResult<()> {
        client
            .create_repository(&self.name, &self.description, &self.tags)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::MockSourceControlApi;
    use crate::ensure::{EnsureOutcome, Ensurer, ExistencePolicy};
    use crate::error::{AftctlError, CloudError};
    use mockall::predicate::eq;

    fn spec() -> RepositorySpec {
        RepositorySpec::new(
            "aft-deployment",
            "CodeCommit repository to store the AFT deployment files",
        )
    }

    #[tokio::test]
    async fn test_absent_repository_is_created_with_description() {
        let mut client = MockSourceControlApi::new();
        client
            .expect_repository_exists()
            .with(eq("aft-deployment"))
            .returning(|_| Ok(false));
        client
            .expect_create_repository()
            .withf(|name, description, tags| {
                name == "aft-deployment"
                    && description.starts_with("CodeCommit repository")
                    && tags.len() == 1
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = Ensurer::new()
            .ensure::<RepositorySpec>(Some(&client), &spec())
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Created);
    }

    #[tokio::test]
    async fn test_existing_repository_is_not_created() {
        let mut client = MockSourceControlApi::new();
        client.expect_repository_exists().returning(|_| Ok(true));
        client.expect_create_repository().never();

        let outcome = Ensurer::new()
            .ensure::<RepositorySpec>(Some(&client), &spec())
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_lookup_failure_aborts_when_strict() {
        let mut client = MockSourceControlApi::new();
        client
            .expect_repository_exists()
            .returning(|r| Err(CloudError::request("GetRepository", r, "ThrottlingException")));
        client.expect_create_repository().never();

        let result = Ensurer::new()
            .with_existence_policy(ExistencePolicy::Abort)
            .ensure::<RepositorySpec>(Some(&client), &spec())
            .await;

        assert!(matches!(result, Err(AftctlError::Cloud(_))));
    }
}
