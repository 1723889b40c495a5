// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # aftctl
//!
//! Sets up the prerequisites of AWS Control Tower Account Factory for
//! Terraform (AFT) in the AFT management account.
//!
//! ## Overview
//!
//! Every resource is *ensured*: its existence is checked first and it is
//! only created when absent, so running a deploy twice is harmless. The
//! workflow creates, in order:
//!
//! 1. The `CodeBuild` and `CodePipeline` service roles
//! 2. The Terraform state bucket and the pipeline artifact bucket
//! 3. The seed files (backend, buildspec, AFT module call) and their archive
//! 4. The `CodeCommit` repository, seeded through a `CloudFormation` stack
//! 5. The `CodeBuild` project and the `CodePipeline` pipeline
//!
//! ## Modules
//!
//! - [`config`]: Deployment file parsing and validation
//! - [`naming`]: AWS naming rules for each resource kind
//! - [`cloud`]: Narrow AWS service adapters
//! - [`ensure`]: The check-then-create strategies
//! - [`seed`]: Seed file rendering and archiving
//! - [`prereqs`]: The ordered prerequisites workflow
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! deployment:
//!   region: us-east-1
//!   aft_account_id: "111111111111"
//!   state_bucket: aft-deployment-tfstate
//!
//! control_tower:
//!   management_account_id: "222222222222"
//!   log_archive_account_id: "333333333333"
//!   audit_account_id: "444444444444"
//!   home_region: us-east-1
//!   secondary_region: us-west-2
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod cloud;
pub mod config;
pub mod ensure;
pub mod error;
pub mod naming;
pub mod prereqs;
pub mod resource;
pub mod retry;
pub mod seed;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use cloud::{AwsContext, CloudClients};
pub use config::{ConfigParser, ConfigValidator, DeployConfig};
pub use ensure::{EnsureOutcome, Ensurer, ExistencePolicy, ManagedResource};
pub use error::{AftctlError, Result};
pub use prereqs::{PrereqsPlan, PrereqsReport, PrereqsRunner, Providers};
pub use resource::{ResourceDescriptor, ResourceKind, TagSet};
pub use retry::RetryPolicy;
pub use seed::{PushInstructions, SeedFiles};
