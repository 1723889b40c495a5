//! aftctl CLI entrypoint.
//!
//! This is the main entrypoint for the aftctl command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aftctl::cli::{Cli, Commands, OutputFormat, OutputFormatter};
use aftctl::cloud::{AwsContext, CloudClients};
use aftctl::config::{ConfigParser, ConfigValidator, DeployConfig, find_config_file};
use aftctl::ensure::{Ensurer, ExistencePolicy};
use aftctl::error::{AftctlError, ConfigError, Result};
use aftctl::prereqs::{PrereqsPlan, PrereqsRunner, Providers};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, &formatter),
        Commands::Plan => cmd_plan(cli.config.as_ref(), &formatter),
        Commands::Deploy {
            yes,
            strict,
            workdir,
        } => cmd_deploy(cli.config.as_ref(), yes, strict, &workdir, &formatter).await,
        Commands::Version => {
            cmd_version(cli.output);
            Ok(())
        }
    }
}

/// Write a template deployment file.
fn cmd_init(path: &Path, force: bool) -> Result<()> {
    info!("Initializing aftctl deployment in: {}", path.display());

    let config_path = path.join("aftctl.deploy.yaml");
    let env_path = path.join(".env.example");

    if !force && config_path.exists() {
        eprintln!("Deployment file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    let config_template = include_str!("../templates/aftctl.deploy.yaml");
    std::fs::write(&config_path, config_template)?;
    eprintln!("Created: {}", config_path.display());

    let env_template = include_str!("../templates/.env.example");
    std::fs::write(&env_path, env_template)?;
    eprintln!("Created: {}", env_path.display());

    eprintln!("\nDeployment initialized successfully!");
    eprintln!("Next steps:");
    eprintln!("  1. Copy .env.example to .env and set your AWS profile and region");
    eprintln!("  2. Edit aftctl.deploy.yaml with your Control Tower account ids");
    eprintln!("  3. Run 'aftctl validate' to check your configuration");
    eprintln!("  4. Run 'aftctl plan' to see what will be created");
    eprintln!("  5. Run 'aftctl deploy' to set up the AFT prerequisites");

    Ok(())
}

/// Validate the deployment file.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;

    let result = ConfigValidator::new().check(&config);
    eprintln!("{}", formatter.format_validation(&result, show_warnings));

    if !result.is_valid() {
        return Err(AftctlError::Config(ConfigError::validation_general(format!(
            "{} error(s) found",
            result.error_count()
        ))));
    }

    eprintln!("Configuration summary:");
    eprintln!("  Name: {}", config.metadata.name);
    eprintln!("  Region: {}", config.deployment.region);
    eprintln!("  AFT account: {}", config.deployment.aft_account_id);
    eprintln!("  Repository: {}", config.deployment.repository.name);
    eprintln!("  Pipeline: {}", config.deployment.codepipeline.pipeline);

    Ok(())
}

/// Show the resources a deploy would ensure.
fn cmd_plan(config_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let config = load_config(config_path)?;
    let plan = PrereqsPlan::from_config(&config);

    eprintln!("{}", formatter.format_plan(&plan));
    Ok(())
}

/// Run the prerequisites workflow.
async fn cmd_deploy(
    config_path: Option<&PathBuf>,
    auto_approve: bool,
    strict: bool,
    workdir: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    ConfigValidator::new().validate(&config)?;

    let plan = PrereqsPlan::from_config(&config);
    eprintln!("{}", formatter.format_plan(&plan));

    if !auto_approve {
        eprint!("\nDo you want to set up these resources? [y/N] ");
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Deploy cancelled.");
            return Ok(());
        }
    }

    let context = AwsContext::load(Some(&config.deployment.region)).await;
    debug!("Using {context:?}");
    let clients = CloudClients::from_context(&context);

    let policy = if strict {
        ExistencePolicy::Abort
    } else {
        ExistencePolicy::AssumeAbsent
    };
    let ensurer = Ensurer::new().with_existence_policy(policy);

    let runner = PrereqsRunner::new(Providers::from(&clients), ensurer, workdir);
    let report = runner.run(&plan).await;

    eprintln!("{}", formatter.format_report(&report));

    match report.failure() {
        Some(failure) => Err(AftctlError::internal(format!(
            "deploy stopped at {} {}",
            failure.step.label(),
            failure.step.name
        ))),
        None => Ok(()),
    }
}

/// Show version information.
fn cmd_version(format: OutputFormat) {
    let version = env!("CARGO_PKG_VERSION");
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "name": "aftctl", "version": version });
            eprintln!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputFormat::Text => eprintln!("aftctl {version}"),
    }
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Loads `.env`, the deployment file and environment overrides.
fn load_config(config_path: Option<&PathBuf>) -> Result<DeployConfig> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading configuration from: {}", config_file.display());

    let parser = ConfigParser::new().with_base_path(
        config_file
            .parent()
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;
    parser.load_with_env(&config_file)
}
