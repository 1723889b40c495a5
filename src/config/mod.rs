//! Configuration module for aftctl.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `aftctl.deploy.yaml`
//! - Environment overrides and `.env` loading
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENV_AFT_ACCOUNT_ID, ENV_REGION, ENV_STATE_BUCKET,
    find_config_file,
};
pub use spec::{
    AftFeaturesConfig, CODEBUILD_SERVICE, CODEPIPELINE_SERVICE, CodeBuildConfig,
    CodePipelineConfig, ControlTowerConfig, DeployConfig, DeploymentConfig, MetadataConfig,
    RepositoryConfig, STACK_SUFFIX, TerraformConfig,
};
pub use validator::{ConfigValidator, TERRAFORM_DISTRIBUTIONS, ValidationError, ValidationResult};
