//! Idempotent resource provisioning.
//!
//! [`Ensurer::ensure`] drives every resource kind through the same linear
//! sequence:
//!
//! 1. **Client check**: a missing provider client fails before any call.
//! 2. **Name check**: the name must satisfy the rules of its kind.
//! 3. **Existence check**: the provider is asked whether the resource exists.
//! 4. **Create**: runs only when the resource is absent.
//!
//! Both "already existed" and "was created" are success; the caller only
//! learns which one happened for reporting.

mod bucket;
mod build_project;
mod pipeline;
mod repository;
mod role;
mod stack;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::error::{CloudResult, ConfigError, Result};
use crate::naming::validate_name;
use crate::resource::{ResourceDescriptor, ResourceKind};

pub use bucket::BucketSpec;
pub use build_project::BuildProjectSpec;
pub use pipeline::PipelineSpec;
pub use repository::RepositorySpec;
pub use role::RoleSpec;
pub use stack::StackSpec;

/// A resource that can be checked for and created through a provider client.
#[async_trait]
pub trait ManagedResource: Send + Sync {
    /// Provider capability this resource needs.
    type Client: ?Sized + Send + Sync;

    /// Kind of the resource.
    fn kind(&self) -> ResourceKind;

    /// Name of the resource.
    fn name(&self) -> &str;

    /// Provider-neutral description for reporting.
    fn descriptor(&self) -> ResourceDescriptor;

    /// Asks the provider whether the resource exists.
    async fn exists(&self, client: &Self::Client) -> CloudResult<bool>;

    /// Creates the resource and applies its tags.
    async fn create(&self, client: &Self::Client) -> CloudResult<()>;
}

/// What to do when the existence check itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistencePolicy {
    /// Log the failure and treat the resource as absent.
    #[default]
    AssumeAbsent,
    /// Return the failure without attempting creation.
    Abort,
}

/// Result of a successful ensure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureOutcome {
    /// The resource was already present; nothing was changed.
    AlreadyExists,
    /// The resource was absent and has been created.
    Created,
}

impl EnsureOutcome {
    /// Returns true if this call created the resource.
    #[must_use]
    pub const fn was_created(self) -> bool {
        matches!(self, Self::Created)
    }
}

impl fmt::Display for EnsureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "already exists"),
            Self::Created => write!(f, "created"),
        }
    }
}

/// Drives resources through the ensure sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ensurer {
    existence_policy: ExistencePolicy,
}

impl Ensurer {
    /// Creates an ensurer that treats failed existence checks as absence.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            existence_policy: ExistencePolicy::AssumeAbsent,
        }
    }

    /// Sets the policy for failed existence checks.
    #[must_use]
    pub const fn with_existence_policy(mut self, policy: ExistencePolicy) -> Self {
        self.existence_policy = policy;
        self
    }

    /// Returns the configured existence policy.
    #[must_use]
    pub const fn existence_policy(&self) -> ExistencePolicy {
        self.existence_policy
    }

    /// Ensures that `resource` exists, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is missing, the name is invalid,
    /// the existence check fails under [`ExistencePolicy::Abort`], or
    /// creation fails.
    pub async fn ensure<R>(&self, client: Option<&R::Client>, resource: &R) -> Result<EnsureOutcome>
    where
        R: ManagedResource + ?Sized,
    {
        let kind = resource.kind();
        let label = kind.label();
        let name = resource.name();

        let Some(client) = client else {
            return Err(ConfigError::MissingClient { kind }.into());
        };

        validate_name(kind, name)?;

        let exists = match resource.exists(client).await {
            Ok(exists) => exists,
            Err(e) => match self.existence_policy {
                ExistencePolicy::AssumeAbsent => {
                    warn!("Could not check whether {label} {name} exists, assuming absent: {e}");
                    false
                }
                ExistencePolicy::Abort => return Err(e.into()),
            },
        };

        if exists {
            info!("{label} {name} already exists");
            return Ok(EnsureOutcome::AlreadyExists);
        }

        info!("{label} {name} doesn't exist... creating");
        resource.create(client).await?;
        info!("{label} {name} successfully created");

        Ok(EnsureOutcome::Created)
    }
}

/// Builds the ARN of an IAM role in an account.
#[must_use]
pub fn role_arn(account_id: &str, role: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AftctlError, CloudError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal in-memory provider used to exercise the state machine.
    #[derive(Default)]
    struct FakeProvider {
        existing: std::sync::Mutex<Vec<String>>,
        fail_exists: bool,
        exists_calls: AtomicUsize,
        create_calls: AtomicUsize,
    }

    struct FakeResource {
        name: String,
    }

    #[async_trait]
    impl ManagedResource for FakeResource {
        type Client = FakeProvider;

        fn kind(&self) -> ResourceKind {
            ResourceKind::Repository
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn descriptor(&self) -> ResourceDescriptor {
            ResourceDescriptor::new(self.kind(), &self.name)
        }

        async fn exists(&self, client: &FakeProvider) -> CloudResult<bool> {
            client.exists_calls.fetch_add(1, Ordering::SeqCst);
            if client.fail_exists {
                return Err(CloudError::request("GetRepository", &self.name, "throttled"));
            }
            Ok(client.existing.lock().unwrap().contains(&self.name))
        }

        async fn create(&self, client: &FakeProvider) -> CloudResult<()> {
            client.create_calls.fetch_add(1, Ordering::SeqCst);
            client.existing.lock().unwrap().push(self.name.clone());
            Ok(())
        }
    }

    fn resource(name: &str) -> FakeResource {
        FakeResource {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_client_fails_without_calls() {
        let result = Ensurer::new()
            .ensure::<FakeResource>(None, &resource("repo"))
            .await;

        assert!(matches!(
            result,
            Err(AftctlError::Config(ConfigError::MissingClient {
                kind: ResourceKind::Repository
            }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_name_fails_before_existence_check() {
        let provider = FakeProvider::default();
        let result = Ensurer::new()
            .ensure(Some(&provider), &resource("bad name"))
            .await;

        assert!(matches!(result, Err(AftctlError::Name(_))));
        assert_eq!(provider.exists_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ensure_twice_creates_once() {
        let provider = FakeProvider::default();
        let ensurer = Ensurer::new();
        let repo = resource("aft-deployment");

        let first = ensurer.ensure(Some(&provider), &repo).await.unwrap();
        let second = ensurer.ensure(Some(&provider), &repo).await.unwrap();

        assert_eq!(first, EnsureOutcome::Created);
        assert_eq!(second, EnsureOutcome::AlreadyExists);
        assert_eq!(provider.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_existence_check_assumes_absent_by_default() {
        let provider = FakeProvider {
            fail_exists: true,
            ..FakeProvider::default()
        };

        let outcome = Ensurer::new()
            .ensure(Some(&provider), &resource("aft-deployment"))
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Created);
        assert_eq!(provider.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_existence_check_aborts_when_strict() {
        let provider = FakeProvider {
            fail_exists: true,
            ..FakeProvider::default()
        };

        let result = Ensurer::new()
            .with_existence_policy(ExistencePolicy::Abort)
            .ensure(Some(&provider), &resource("aft-deployment"))
            .await;

        assert!(matches!(result, Err(AftctlError::Cloud(_))));
        assert_eq!(provider.create_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_role_arn() {
        assert_eq!(
            role_arn("123456789012", "aft-role"),
            "arn:aws:iam::123456789012:role/aft-role"
        );
    }
}
