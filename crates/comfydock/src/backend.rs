//! Local collaborator implementations
//!
//! [`LocalBackend`] satisfies the core's `ComfyBackend` contract without a
//! server: Docker operations shell out to the Docker CLI, ComfyUI installs
//! clone the upstream repository with git, and environment records plus user
//! settings live in JSON files under the data directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use comfydock_core::backend::ComfyBackend;
use comfydock_core::environment::{Environment, EnvironmentInput, COMFYUI_IMAGE_NAME};
use comfydock_core::errors::{DockerError, InstallError, Result};
use comfydock_core::paths::join_paths;
use comfydock_core::releases::ImageTags;
use comfydock_core::settings::{JsonSettingsStore, UserSettings, UserSettingsUpdate};
use comfydock_core::store::EnvironmentStore;
use comfydock_core::IndexMap;
use tracing::{debug, instrument};

/// Upstream ComfyUI repository cloned by the installer
const COMFYUI_REPO_URL: &str = "https://github.com/comfyanonymous/ComfyUI.git";

/// File-backed backend talking to a local Docker daemon
#[derive(Debug)]
pub struct LocalBackend {
    runtime_path: String,
    settings: JsonSettingsStore,
    data_dir: PathBuf,
}

impl LocalBackend {
    /// Backend rooted at `data_dir`, shelling out to `runtime_path`
    pub fn new(data_dir: PathBuf, runtime_path: String) -> Self {
        let settings = JsonSettingsStore::new(data_dir.join("settings.json"));
        Self {
            runtime_path,
            settings,
            data_dir,
        }
    }

    /// The environment record store, honoring the user's retention limit
    pub fn store(&self) -> Result<EnvironmentStore> {
        let settings = self.settings.load()?;
        Ok(EnvironmentStore::new(
            self.data_dir.join("environments.json"),
            settings.effective_max_deleted(),
        ))
    }

    async fn run_runtime(&self, args: Vec<String>) -> Result<String> {
        let runtime_path = self.runtime_path.clone();
        tokio::task::spawn_blocking(move || {
            let output = Command::new(&runtime_path)
                .args(&args)
                .output()
                .map_err(|_| DockerError::NotInstalled)?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(DockerError::CLIError(stderr.trim().to_string()).into());
            }
            String::from_utf8(output.stdout)
                .map_err(|e| DockerError::CLIError(format!("Invalid UTF-8 in output: {}", e)).into())
        })
        .await
        .map_err(|e| DockerError::CLIError(format!("Task join error: {}", e)))?
    }
}

impl ComfyBackend for LocalBackend {
    #[instrument(skip(self))]
    async fn image_exists(&self, image: &str) -> Result<bool> {
        let runtime_path = self.runtime_path.clone();
        let image = image.to_string();
        tokio::task::spawn_blocking(move || {
            let output = Command::new(&runtime_path)
                .args(["image", "inspect", "--format", "{{.Id}}", &image])
                .output()
                .map_err(|_| DockerError::NotInstalled)?;
            if output.status.success() {
                return Ok(true);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such image") {
                Ok(false)
            } else {
                Err(DockerError::CLIError(stderr.trim().to_string()).into())
            }
        })
        .await
        .map_err(|e| DockerError::CLIError(format!("Task join error: {}", e)))?
    }

    /// A usable installation is a directory holding ComfyUI's entry point
    #[instrument(skip(self))]
    async fn valid_comfyui_path(&self, path: &str) -> Result<bool> {
        let dir = Path::new(path);
        let valid = dir.is_dir() && dir.join("main.py").is_file();
        debug!("Path '{}' valid ComfyUI installation: {}", path, valid);
        Ok(valid)
    }

    #[instrument(skip(self))]
    async fn pull_image(&self, image: &str) -> Result<()> {
        debug!("Pulling image {}", image);
        let image_owned = image.to_string();
        match self.run_runtime(vec!["pull".to_string(), image_owned]).await {
            Ok(_) => Ok(()),
            Err(e) => Err(DockerError::PullFailed {
                image: image.to_string(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    #[instrument(skip(self))]
    async fn install_comfyui(&self, path: &str, branch: &str) -> Result<()> {
        let target = join_paths(path, "ComfyUI");
        let mut args = vec!["clone".to_string(), "--depth".to_string(), "1".to_string()];
        // "latest" means the default branch; anything else is a tag/branch
        if branch != "latest" {
            args.push("--branch".to_string());
            args.push(branch.to_string());
        }
        args.push(COMFYUI_REPO_URL.to_string());
        args.push(target);

        tokio::task::spawn_blocking(move || {
            let output = Command::new("git")
                .args(&args)
                .output()
                .map_err(|_| InstallError::GitNotInstalled)?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(InstallError::CloneFailed(stderr.trim().to_string()).into());
            }
            Ok(())
        })
        .await
        .map_err(|e| InstallError::CloneFailed(format!("Task join error: {}", e)))?
    }

    /// Tags of locally available ComfyUI environment images, newest first
    #[instrument(skip(self))]
    async fn image_tags(&self) -> Result<ImageTags> {
        let stdout = self
            .run_runtime(vec![
                "image".to_string(),
                "ls".to_string(),
                COMFYUI_IMAGE_NAME.to_string(),
                "--format".to_string(),
                "{{.Tag}}".to_string(),
            ])
            .await?;

        let mut tags = IndexMap::new();
        for tag in stdout.lines().map(str::trim) {
            if tag.is_empty() || tag == "<none>" {
                continue;
            }
            tags.insert(
                tag.to_string(),
                format!("{}:{}", COMFYUI_IMAGE_NAME, tag),
            );
        }
        Ok(ImageTags { tags })
    }

    async fn create_environment(&self, input: &EnvironmentInput) -> Result<Environment> {
        self.store()?.insert(input)
    }

    async fn duplicate_environment(
        &self,
        source_id: &str,
        input: &EnvironmentInput,
    ) -> Result<Environment> {
        let store = self.store()?;
        // Resolving the source first surfaces a stale id before any write
        let _source = store.get(source_id)?;
        store.insert(input)
    }

    async fn user_settings(&self) -> Result<UserSettings> {
        self.settings.load()
    }

    async fn update_user_settings(&self, update: UserSettingsUpdate) -> Result<UserSettings> {
        self.settings.update(update)
    }
}
