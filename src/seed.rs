//! Initial repository content.
//!
//! Renders the Terraform files that deploy AFT, writes them into a local
//! directory named after the repository and packs that directory into a zip
//! archive. The archive seeds the repository through the stack; when the
//! repository is created directly, [`PushInstructions`] tells the user how to
//! push the directory instead.

use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::config::DeployConfig;
use crate::error::{Result, SeedError};

const BACKEND_TEMPLATE: &str = include_str!("../templates/seed/backend.tf.tmpl");
const BUILDSPEC_TEMPLATE: &str = include_str!("../templates/seed/buildspec.yaml.tmpl");
const MAIN_TEMPLATE: &str = include_str!("../templates/seed/main.tf.tmpl");

/// Local working directories that never belong in the repository.
const ARCHIVE_SKIPPED_DIRS: &[&str] = &[".git", ".terraform"];

/// The rendered seed files, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFiles {
    /// Repository the files belong to.
    pub repository: String,
    /// `(file name, content)` pairs in write order.
    pub files: Vec<(&'static str, String)>,
}

/// A seed written to disk and archived.
#[derive(Debug, Clone)]
pub struct SeedArchive {
    /// Directory holding the seed files.
    pub directory: PathBuf,
    /// Path of the zip archive.
    pub archive_path: PathBuf,
    /// Archive content, ready for upload.
    pub bytes: Vec<u8>,
}

impl SeedFiles {
    /// Renders `backend.tf`, `buildspec.yaml` and `main.tf` for a deployment.
    #[must_use]
    pub fn render(config: &DeployConfig) -> Self {
        let deployment = &config.deployment;
        let control_tower = &config.control_tower;
        let features = &config.aft_features;

        let backend = render(
            BACKEND_TEMPLATE,
            &[
                ("state_bucket", deployment.state_bucket.as_str()),
                ("region", deployment.region.as_str()),
            ],
        );

        let buildspec = render(
            BUILDSPEC_TEMPLATE,
            &[("terraform_version", config.terraform.version.as_str())],
        );

        let main = render(
            MAIN_TEMPLATE,
            &[
                ("ct_management_account_id", control_tower.management_account_id.as_str()),
                ("log_archive_account_id", control_tower.log_archive_account_id.as_str()),
                ("audit_account_id", control_tower.audit_account_id.as_str()),
                ("aft_management_account_id", deployment.aft_account_id.as_str()),
                ("ct_home_region", control_tower.home_region.as_str()),
                ("tf_backend_secondary_region", control_tower.secondary_region.as_str()),
                ("aft_metrics_reporting", bool_str(features.metrics_reporting)),
                (
                    "aft_feature_cloudtrail_data_events",
                    bool_str(features.cloudtrail_data_events),
                ),
                ("aft_feature_enterprise_support", bool_str(features.enterprise_support)),
                (
                    "aft_feature_delete_default_vpcs_enabled",
                    bool_str(features.delete_default_vpcs),
                ),
                ("terraform_version", config.terraform.version.as_str()),
                ("terraform_distribution", config.terraform.distribution.as_str()),
            ],
        );

        Self {
            repository: deployment.repository.name.clone(),
            files: vec![
                ("backend.tf", backend),
                ("buildspec.yaml", buildspec),
                ("main.tf", main),
            ],
        }
    }

    /// Returns the content of one file.
    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(name, _)| *name == file_name)
            .map(|(_, content)| content.as_str())
    }

    /// Writes the files into `<workdir>/<repository>/` and archives that
    /// directory as `<workdir>/<repository>.zip`.
    ///
    /// Existing files with the same names are overwritten; other files in
    /// the directory are archived too, except `.git/` and `.terraform/`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written or the archive cannot
    /// be built.
    pub fn write(&self, workdir: &Path) -> Result<SeedArchive> {
        let directory = workdir.join(&self.repository);

        if directory.is_dir() {
            info!("Directory {} already exists", directory.display());
        } else {
            std::fs::create_dir_all(&directory).map_err(|e| SeedError::Write {
                path: directory.clone(),
                message: e.to_string(),
            })?;
            info!("Directory {} successfully created", directory.display());
        }

        for (name, content) in &self.files {
            let path = directory.join(name);
            std::fs::write(&path, content).map_err(|e| SeedError::Write {
                path: path.clone(),
                message: e.to_string(),
            })?;
            info!("File {} successfully created", path.display());
        }

        let archive_path = workdir.join(format!("{}.zip", self.repository));
        let bytes = zip_directory(&directory).map_err(|message| SeedError::Archive {
            path: archive_path.clone(),
            message,
        })?;

        std::fs::write(&archive_path, &bytes).map_err(|e| SeedError::Write {
            path: archive_path.clone(),
            message: e.to_string(),
        })?;
        info!("File {} successfully created", archive_path.display());

        Ok(SeedArchive {
            directory,
            archive_path,
            bytes,
        })
    }
}

/// Replaces every `{{key}}` in `template`.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}"), value)
    })
}

const fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Archives every file below `directory`, with entry names relative to it.
fn zip_directory(directory: &Path) -> std::result::Result<Vec<u8>, String> {
    let mut files = Vec::new();
    collect_files(directory, &mut files).map_err(|e| e.to_string())?;
    files.sort();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    for path in files {
        let relative = path.strip_prefix(directory).map_err(|e| e.to_string())?;
        let entry = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read(&path).map_err(|e| e.to_string())?;

        debug!("Adding {entry} to archive");
        writer
            .start_file(entry, options)
            .map_err(|e| e.to_string())?;
        writer.write_all(&content).map_err(|e| e.to_string())?;
    }

    let cursor = writer.finish().map_err(|e| e.to_string())?;
    Ok(cursor.into_inner())
}

fn collect_files(directory: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_dir() {
            if path
                .file_name()
                .is_some_and(|name| ARCHIVE_SKIPPED_DIRS.iter().any(|s| name == *s))
            {
                debug!("Leaving {} out of the archive", path.display());
                continue;
            }
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Git commands that push a seed directory into a directly created repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushInstructions {
    /// HTTPS clone URL of the repository.
    pub url: String,
    /// Branch to push.
    pub branch: String,
    /// Command that checks whether the branch exists locally.
    pub check_branch: String,
    /// Command that creates the branch when it does not.
    pub create_branch: String,
    /// Commands that push the directory, in order.
    pub commands: Vec<String>,
}

impl PushInstructions {
    /// Builds the push instructions for a repository.
    #[must_use]
    pub fn new(region: &str, repository: &str, branch: &str) -> Self {
        let url = format!("https://git-codecommit.{region}.amazonaws.com/v1/repos/{repository}");
        let commands = vec![
            String::from("git init"),
            format!("git remote add origin {url}"),
            String::from("git add -A"),
            String::from("git commit -m \"Initial commit\""),
            format!("git push origin {branch}"),
        ];

        Self {
            check_branch: format!("git rev-parse --verify --quiet {branch}"),
            create_branch: format!("git checkout -b {branch}"),
            url,
            branch: branch.to_string(),
            commands,
        }
    }
}
