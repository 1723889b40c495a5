//! The AFT prerequisites workflow.
//!
//! [`PrereqsPlan`] derives every resource from a [`DeployConfig`];
//! [`PrereqsRunner`] ensures them in dependency order and stops at the
//! first failure. The order is fixed:
//!
//! 1. pipeline role, build role
//! 2. Terraform state bucket, pipeline artifact bucket
//! 3. seed files, then their upload to the artifact bucket
//! 4. repository (through the seeding stack, or directly)
//! 5. build project, pipeline

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::cloud::{
    BuildApi, CloudClients, IdentityApi, PipelineApi, SourceControlApi, StackApi, StorageApi,
};
use crate::config::{CODEBUILD_SERVICE, CODEPIPELINE_SERVICE, DeployConfig};
use crate::ensure::{
    BucketSpec, BuildProjectSpec, EnsureOutcome, Ensurer, ManagedResource, PipelineSpec,
    RepositorySpec, RoleSpec, StackSpec,
};
use crate::error::{AftctlError, ConfigError, Result};
use crate::resource::{ResourceDescriptor, ResourceKind, TagSet};
use crate::seed::{PushInstructions, SeedFiles};

/// How the repository gets created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryTarget {
    /// Through a stack that seeds it from the uploaded archive.
    Stack(StackSpec),
    /// Directly and empty; the user pushes the seed files.
    Direct(RepositorySpec),
}

impl RepositoryTarget {
    fn descriptor(&self) -> ResourceDescriptor {
        match self {
            Self::Stack(stack) => stack.descriptor(),
            Self::Direct(repository) => repository.descriptor(),
        }
    }
}

/// Every resource the workflow ensures, derived from one configuration.
#[derive(Debug, Clone)]
pub struct PrereqsPlan {
    /// Deployment region.
    pub region: String,
    /// Role assumed by the pipeline.
    pub pipeline_role: RoleSpec,
    /// Role assumed by the build project.
    pub build_role: RoleSpec,
    /// Terraform state bucket.
    pub state_bucket: BucketSpec,
    /// Pipeline artifact bucket, also holding the seed archive.
    pub artifact_bucket: BucketSpec,
    /// Rendered seed files.
    pub seed: SeedFiles,
    /// Object key of the seed archive.
    pub seed_key: String,
    /// Repository creation target.
    pub repository: RepositoryTarget,
    /// Build project.
    pub build_project: BuildProjectSpec,
    /// Pipeline.
    pub pipeline: PipelineSpec,
}

impl PrereqsPlan {
    /// Derives the plan from a configuration.
    #[must_use]
    pub fn from_config(config: &DeployConfig) -> Self {
        let deployment = &config.deployment;
        let account_id = deployment.aft_account_id.trim().to_string();
        let state_bucket = deployment.state_bucket.trim().to_string();
        let artifact_bucket = config.artifact_bucket();
        let repository = &deployment.repository;
        let tags = TagSet::aftctl();

        let role = |name: &str, service: &str, policy: &str| RoleSpec {
            name: name.to_string(),
            trusted_service: service.to_string(),
            policy_name: policy.to_string(),
            region: deployment.region.clone(),
            account_id: account_id.clone(),
            repository: repository.name.clone(),
            artifact_bucket: artifact_bucket.clone(),
            state_bucket: state_bucket.clone(),
            tags: tags.clone(),
        };

        let bucket = |name: &str| {
            BucketSpec::new(name, &account_id, &deployment.codebuild.role)
                .with_kms_key_id(deployment.kms_key_id.clone())
        };

        let seed_key = config.seed_archive_key();
        let target = if repository.seed_with_stack {
            RepositoryTarget::Stack(StackSpec {
                name: config.stack_name(),
                repository: repository.name.clone(),
                description: repository.description.clone(),
                branch: repository.branch.clone(),
                seed_bucket: artifact_bucket.clone(),
                seed_key: seed_key.clone(),
                tags: tags.clone(),
            })
        } else {
            RepositoryTarget::Direct(RepositorySpec::new(&repository.name, &repository.description))
        };

        Self {
            region: deployment.region.clone(),
            pipeline_role: role(
                &deployment.codepipeline.role,
                CODEPIPELINE_SERVICE,
                &deployment.codepipeline.policy,
            ),
            build_role: role(
                &deployment.codebuild.role,
                CODEBUILD_SERVICE,
                &deployment.codebuild.policy,
            ),
            state_bucket: bucket(&state_bucket),
            artifact_bucket: bucket(&artifact_bucket),
            seed: SeedFiles::render(config),
            seed_key,
            repository: target,
            build_project: BuildProjectSpec {
                name: deployment.codebuild.project.clone(),
                account_id: account_id.clone(),
                image: deployment.codebuild.docker_image.clone(),
                repository: repository.name.clone(),
                branch: repository.branch.clone(),
                build_role: deployment.codebuild.role.clone(),
                tags: tags.clone(),
            },
            pipeline: PipelineSpec {
                name: deployment.codepipeline.pipeline.clone(),
                account_id,
                pipeline_role: deployment.codepipeline.role.clone(),
                artifact_bucket,
                repository: repository.name.clone(),
                branch: repository.branch.clone(),
                build_project: deployment.codebuild.project.clone(),
                tags,
            },
        }
    }

    /// Returns true if the repository is seeded through the stack.
    #[must_use]
    pub const fn seeds_with_stack(&self) -> bool {
        matches!(self.repository, RepositoryTarget::Stack(_))
    }

    /// Descriptors of every ensured resource, in workflow order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        vec![
            self.pipeline_role.descriptor(),
            self.build_role.descriptor(),
            self.state_bucket.descriptor(),
            self.artifact_bucket.descriptor(),
            self.repository.descriptor(),
            self.build_project.descriptor(),
            self.pipeline.descriptor(),
        ]
    }

    /// Every step of the workflow, in execution order.
    #[must_use]
    pub fn steps(&self) -> Vec<PlannedStep> {
        let mut ensure_steps = self.descriptors().into_iter().map(PlannedStep::ensure);

        // Seeding runs after both buckets and before the repository.
        let mut steps: Vec<PlannedStep> = ensure_steps.by_ref().take(4).collect();
        steps.push(PlannedStep {
            kind: None,
            name: self.seed.repository.clone(),
            action: StepAction::WriteSeed,
        });
        if self.seeds_with_stack() {
            steps.push(PlannedStep {
                kind: None,
                name: format!("s3://{}/{}", self.artifact_bucket.name, self.seed_key),
                action: StepAction::UploadSeed,
            });
        }
        steps.extend(ensure_steps);
        steps
    }
}

/// What a workflow step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Ensure a resource exists.
    Ensure,
    /// Write and archive the seed files.
    WriteSeed,
    /// Upload the seed archive.
    UploadSeed,
}

/// One step of the workflow before it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// Resource kind, for ensure steps.
    pub kind: Option<ResourceKind>,
    /// Resource name, directory or object URL.
    pub name: String,
    /// What the step does.
    pub action: StepAction,
}

impl PlannedStep {
    fn ensure(descriptor: ResourceDescriptor) -> Self {
        Self {
            kind: Some(descriptor.kind),
            name: descriptor.name,
            action: StepAction::Ensure,
        }
    }

    /// Human-readable label of the step.
    #[must_use]
    pub fn label(&self) -> String {
        match (self.action, self.kind) {
            (StepAction::Ensure, Some(kind)) => kind.label().to_string(),
            (StepAction::WriteSeed, _) => String::from("Seed files"),
            (StepAction::UploadSeed, _) => String::from("Seed upload"),
            (StepAction::Ensure, None) => String::from("Resource"),
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The resource was created.
    Created,
    /// The resource already existed.
    AlreadyExists,
    /// The seed files were written.
    Written,
    /// The seed archive was uploaded.
    Uploaded,
    /// The step failed; the workflow stopped here.
    Failed,
    /// The step did not run because an earlier step failed.
    Skipped,
}

impl StepStatus {
    /// Returns true for every status that counts as success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Failed | Self::Skipped)
    }
}

impl From<EnsureOutcome> for StepStatus {
    fn from(outcome: EnsureOutcome) -> Self {
        match outcome {
            EnsureOutcome::Created => Self::Created,
            EnsureOutcome::AlreadyExists => Self::AlreadyExists,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::AlreadyExists => "already exists",
            Self::Written => "written",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// One step with its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// The step.
    #[serde(flatten)]
    pub step: PlannedStep,
    /// Its outcome.
    pub status: StepStatus,
    /// Error text for a failed step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-step outcomes of one workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct PrereqsReport {
    /// Every step in workflow order.
    pub steps: Vec<StepReport>,
    /// Local path of the seed archive, once written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_archive: Option<PathBuf>,
    /// Push instructions, when the repository was created directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_instructions: Option<PushInstructions>,
    #[serde(skip)]
    cursor: usize,
}

impl PrereqsReport {
    fn pending(plan: &PrereqsPlan) -> Self {
        Self {
            steps: plan
                .steps()
                .into_iter()
                .map(|step| StepReport {
                    step,
                    status: StepStatus::Skipped,
                    error: None,
                })
                .collect(),
            seed_archive: None,
            push_instructions: None,
            cursor: 0,
        }
    }

    /// Records the outcome of the next step; returns true on success.
    fn record(&mut self, result: Result<StepStatus>) -> bool {
        let Some(step) = self.steps.get_mut(self.cursor) else {
            return false;
        };
        self.cursor += 1;

        match result {
            Ok(status) => {
                step.status = status;
                true
            }
            Err(e) => {
                error!("{} {} failed: {e}", step.step.label(), step.step.name);
                step.status = StepStatus::Failed;
                step.error = Some(e.to_string());
                false
            }
        }
    }

    /// Returns true if every step succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_success())
    }

    /// Returns the failed step, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    /// Returns the number of resources created by this run.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Created)
            .count()
    }
}

/// Provider clients used by the workflow. A missing client fails the first
/// step that needs it.
#[derive(Clone, Copy, Default)]
pub struct Providers<'a> {
    /// Object storage.
    pub storage: Option<&'a (dyn StorageApi + 'static)>,
    /// Identity.
    pub identity: Option<&'a (dyn IdentityApi + 'static)>,
    /// Source control.
    pub source_control: Option<&'a (dyn SourceControlApi + 'static)>,
    /// Build service.
    pub build: Option<&'a (dyn BuildApi + 'static)>,
    /// Pipeline service.
    pub pipeline: Option<&'a (dyn PipelineApi + 'static)>,
    /// Infrastructure stacks.
    pub stack: Option<&'a (dyn StackApi + 'static)>,
}

impl<'a> From<&'a CloudClients> for Providers<'a> {
    fn from(clients: &'a CloudClients) -> Self {
        Self {
            storage: Some(&clients.storage),
            identity: Some(&clients.identity),
            source_control: Some(&clients.source_control),
            build: Some(&clients.build),
            pipeline: Some(&clients.pipeline),
            stack: Some(&clients.stack),
        }
    }
}

/// Runs a [`PrereqsPlan`].
pub struct PrereqsRunner<'a> {
    providers: Providers<'a>,
    ensurer: Ensurer,
    workdir: PathBuf,
}

impl<'a> PrereqsRunner<'a> {
    /// Creates a runner writing seed files under `workdir`.
    #[must_use]
    pub fn new(providers: Providers<'a>, ensurer: Ensurer, workdir: impl Into<PathBuf>) -> Self {
        Self {
            providers,
            ensurer,
            workdir: workdir.into(),
        }
    }

    /// Returns the seed working directory.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn ensure<R>(&self, client: Option<&R::Client>, resource: &R) -> Result<StepStatus>
    where
        R: ManagedResource + ?Sized,
    {
        self.ensurer
            .ensure(client, resource)
            .await
            .map(StepStatus::from)
    }

    /// Runs every step in order, stopping at the first failure.
    pub async fn run(&self, plan: &PrereqsPlan) -> PrereqsReport {
        let mut report = PrereqsReport::pending(plan);
        let p = self.providers;

        info!("Setting up AFT prerequisites in {}", plan.region);

        if !report.record(self.ensure(p.identity, &plan.pipeline_role).await)
            || !report.record(self.ensure(p.identity, &plan.build_role).await)
            || !report.record(self.ensure(p.storage, &plan.state_bucket).await)
            || !report.record(self.ensure(p.storage, &plan.artifact_bucket).await)
        {
            return report;
        }

        let archive = match plan.seed.write(&self.workdir) {
            Ok(archive) => archive,
            Err(e) => {
                report.record(Err(e));
                return report;
            }
        };
        report.seed_archive = Some(archive.archive_path.clone());
        report.record(Ok(StepStatus::Written));

        let repository_created = match &plan.repository {
            RepositoryTarget::Stack(stack) => {
                let uploaded = self.upload_seed(plan, archive.bytes).await;
                report.record(uploaded) && report.record(self.ensure(p.stack, stack).await)
            }
            RepositoryTarget::Direct(repository) => {
                let ok = report.record(self.ensure(p.source_control, repository).await);
                if ok {
                    report.push_instructions = Some(PushInstructions::new(
                        &plan.region,
                        &repository.name,
                        &plan.pipeline.branch,
                    ));
                }
                ok
            }
        };
        if !repository_created {
            return report;
        }

        if report.record(self.ensure(p.build, &plan.build_project).await) {
            report.record(self.ensure(p.pipeline, &plan.pipeline).await);
        }

        if report.is_success() {
            info!(
                "AFT prerequisites ready: {} resource(s) created",
                report.created_count()
            );
        }
        report
    }

    async fn upload_seed(&self, plan: &PrereqsPlan, body: Vec<u8>) -> Result<StepStatus> {
        let storage = self.providers.storage.ok_or(AftctlError::Config(
            ConfigError::MissingClient {
                kind: ResourceKind::Bucket,
            },
        ))?;

        storage
            .put_object(&plan.artifact_bucket.name, &plan.seed_key, body)
            .await?;
        info!(
            "Seed archive uploaded to s3://{}/{}",
            plan.artifact_bucket.name, plan.seed_key
        );
        Ok(StepStatus::Uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{
        MockBuildApi, MockIdentityApi, MockPipelineApi, MockSourceControlApi, MockStackApi,
        MockStorageApi,
    };
    use crate::config::ConfigParser;
    use crate::error::CloudError;
    use mockall::Sequence;

    fn config(seed_with_stack: bool) -> DeployConfig {
        let mut config = ConfigParser::new()
            .parse_yaml(
                r"
deployment:
  region: us-east-1
  aft_account_id: '111111111111'
  state_bucket: aft-tfstate
control_tower:
  management_account_id: '222222222222'
  log_archive_account_id: '333333333333'
  audit_account_id: '444444444444'
  home_region: us-east-1
  secondary_region: us-west-2
",
                None,
            )
            .unwrap();
        config.deployment.repository.seed_with_stack = seed_with_stack;
        config
    }

    fn storage_creating_everything() -> MockStorageApi {
        let mut storage = MockStorageApi::new();
        storage.expect_list_buckets().returning(|| Ok(Vec::new()));
        storage.expect_create_bucket().returning(|_| Ok(()));
        storage.expect_wait_until_exists().returning(|_| Ok(()));
        storage.expect_block_public_access().returning(|_| Ok(()));
        storage.expect_put_bucket_policy().returning(|_, _| Ok(()));
        storage.expect_put_bucket_tagging().returning(|_, _| Ok(()));
        storage
    }

    fn identity_with_existing_roles() -> MockIdentityApi {
        let mut identity = MockIdentityApi::new();
        identity.expect_role_exists().returning(|_| Ok(true));
        identity
    }

    #[test]
    fn test_plan_derives_names_from_config() {
        let plan = PrereqsPlan::from_config(&config(true));

        assert_eq!(plan.pipeline_role.trusted_service, "codepipeline.amazonaws.com");
        assert_eq!(plan.build_role.trusted_service, "codebuild.amazonaws.com");
        assert_eq!(
            plan.artifact_bucket.name,
            "111111111111-aft-deployment-codepipeline-artifact"
        );
        assert_eq!(plan.artifact_bucket.build_role, "aft-deployment-codebuild-service-role");
        assert_eq!(plan.state_bucket.build_role, "aft-deployment-codebuild-service-role");
        assert_eq!(plan.seed_key, "aft-deployment.zip");

        let RepositoryTarget::Stack(stack) = &plan.repository else {
            panic!("expected stack target");
        };
        assert_eq!(stack.name, "aft-deployment-cloudformation-stack");
        assert_eq!(stack.seed_bucket, plan.artifact_bucket.name);
    }

    #[test]
    fn test_steps_follow_workflow_order() {
        let plan = PrereqsPlan::from_config(&config(true));
        let labels: Vec<String> = plan.steps().iter().map(PlannedStep::label).collect();

        assert_eq!(
            labels,
            vec![
                "IAM Role",
                "IAM Role",
                "S3 Bucket",
                "S3 Bucket",
                "Seed files",
                "Seed upload",
                "CloudFormation Stack",
                "CodeBuild Project",
                "CodePipeline Pipeline",
            ]
        );

        let direct = PrereqsPlan::from_config(&config(false));
        assert_eq!(direct.steps().len(), 8);
        assert_eq!(direct.descriptors()[4].kind, ResourceKind::Repository);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_with_stack_seeding() {
        let workdir = tempfile::tempdir().unwrap();
        let plan = PrereqsPlan::from_config(&config(true));

        let identity = identity_with_existing_roles();
        let mut storage = storage_creating_everything();
        storage
            .expect_put_object()
            .withf(|bucket, key, body| {
                bucket == "111111111111-aft-deployment-codepipeline-artifact"
                    && key == "aft-deployment.zip"
                    && !body.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut stack = MockStackApi::new();
        stack
            .expect_describe_stack()
            .returning(|s| Err(CloudError::request("DescribeStacks", s, "does not exist")));
        stack
            .expect_create_stack()
            .times(1)
            .returning(|_, _, _| Ok(String::from("stack-id")));

        let mut build = MockBuildApi::new();
        build.expect_list_projects().returning(|| Ok(Vec::new()));
        build.expect_create_project().times(1).returning(|_| Ok(()));

        let mut pipeline = MockPipelineApi::new();
        pipeline
            .expect_list_pipelines()
            .returning(|| Ok(vec![String::from("aft-deployment-pipeline")]));
        pipeline.expect_create_pipeline().never();

        let providers = Providers {
            storage: Some(&storage),
            identity: Some(&identity),
            source_control: None,
            build: Some(&build),
            pipeline: Some(&pipeline),
            stack: Some(&stack),
        };

        let report = PrereqsRunner::new(providers, Ensurer::new(), workdir.path())
            .run(&plan)
            .await;

        assert!(report.is_success(), "{report:?}");
        let statuses: Vec<StepStatus> = report.steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::AlreadyExists,
                StepStatus::AlreadyExists,
                StepStatus::Created,
                StepStatus::Created,
                StepStatus::Written,
                StepStatus::Uploaded,
                StepStatus::Created,
                StepStatus::Created,
                StepStatus::AlreadyExists,
            ]
        );
        assert_eq!(report.created_count(), 4);
        assert!(report.push_instructions.is_none());
        assert!(workdir.path().join("aft-deployment.zip").is_file());
    }

    #[tokio::test]
    async fn test_failure_stops_the_workflow() {
        let workdir = tempfile::tempdir().unwrap();
        let plan = PrereqsPlan::from_config(&config(true));

        let mut seq = Sequence::new();
        let mut identity = MockIdentityApi::new();
        identity
            .expect_role_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        identity
            .expect_role_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));
        identity
            .expect_create_role()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|role, _, _| Err(CloudError::request("CreateRole", role, "AccessDenied")));

        let mut storage = MockStorageApi::new();
        storage.expect_list_buckets().never();

        let providers = Providers {
            storage: Some(&storage),
            identity: Some(&identity),
            ..Providers::default()
        };

        let report = PrereqsRunner::new(providers, Ensurer::new(), workdir.path())
            .run(&plan)
            .await;

        assert!(!report.is_success());
        let failure = report.failure().unwrap();
        assert_eq!(failure.step.name, "aft-deployment-codebuild-service-role");
        assert!(failure.error.as_deref().unwrap().contains("AccessDenied"));
        assert!(report.steps[2..].iter().all(|s| s.status == StepStatus::Skipped));
        assert!(!workdir.path().join("aft-deployment").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_repository_yields_push_instructions() {
        let workdir = tempfile::tempdir().unwrap();
        let plan = PrereqsPlan::from_config(&config(false));

        let identity = identity_with_existing_roles();
        let mut storage = MockStorageApi::new();
        storage.expect_list_buckets().returning(|| {
            Ok(vec![
                String::from("aft-tfstate"),
                String::from("111111111111-aft-deployment-codepipeline-artifact"),
            ])
        });
        storage.expect_put_object().never();

        let mut source_control = MockSourceControlApi::new();
        source_control.expect_repository_exists().returning(|_| Ok(false));
        source_control
            .expect_create_repository()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut build = MockBuildApi::new();
        build
            .expect_list_projects()
            .returning(|| Ok(vec![String::from("aft-deployment-build")]));

        let mut pipeline = MockPipelineApi::new();
        pipeline
            .expect_list_pipelines()
            .returning(|| Ok(vec![String::from("aft-deployment-pipeline")]));

        let providers = Providers {
            storage: Some(&storage),
            identity: Some(&identity),
            source_control: Some(&source_control),
            build: Some(&build),
            pipeline: Some(&pipeline),
            stack: None,
        };

        let report = PrereqsRunner::new(providers, Ensurer::new(), workdir.path())
            .run(&plan)
            .await;

        assert!(report.is_success(), "{report:?}");
        assert_eq!(report.created_count(), 1);
        let push = report.push_instructions.unwrap();
        assert_eq!(
            push.url,
            "https://git-codecommit.us-east-1.amazonaws.com/v1/repos/aft-deployment"
        );
        assert!(workdir.path().join("aft-deployment").join("main.tf").is_file());
    }

    #[tokio::test]
    async fn test_missing_stack_client_fails_after_upload() {
        let workdir = tempfile::tempdir().unwrap();
        let plan = PrereqsPlan::from_config(&config(true));

        let identity = identity_with_existing_roles();
        let mut storage = MockStorageApi::new();
        storage.expect_list_buckets().returning(|| {
            Ok(vec![
                String::from("aft-tfstate"),
                String::from("111111111111-aft-deployment-codepipeline-artifact"),
            ])
        });
        storage.expect_put_object().times(1).returning(|_, _, _| Ok(()));

        let runner = PrereqsRunner::new(
            Providers {
                storage: Some(&storage),
                identity: Some(&identity),
                ..Providers::default()
            },
            Ensurer::new(),
            workdir.path(),
        );
        let report = runner.run(&plan).await;

        let failure = report.failure().unwrap();
        assert_eq!(failure.step.kind, Some(ResourceKind::Stack));
        assert_eq!(
            failure.error.as_deref(),
            Some("Configuration error: CloudFormationClient is not provided")
        );
    }
}
