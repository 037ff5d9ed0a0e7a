//! Backend collaborator contracts
//!
//! The workflow controller is a pure caller of these contracts; the concrete
//! implementations (Docker CLI shell-outs, git installer, record stores, or a
//! remote REST backend) live with the composition root. All operations are
//! fallible and asynchronous; callers surface failures as notifications and
//! never let them corrupt workflow state.

use crate::environment::{Environment, EnvironmentInput};
use crate::errors::Result;
use crate::releases::ImageTags;
use crate::settings::{UserSettings, UserSettingsUpdate};

/// Everything the create/duplicate workflow needs from the outside world
#[allow(async_fn_in_trait)]
pub trait ComfyBackend {
    /// Pre-flight: is this image already available locally?
    async fn image_exists(&self, image: &str) -> Result<bool>;

    /// Pre-flight: does this path hold a usable ComfyUI installation?
    async fn valid_comfyui_path(&self, path: &str) -> Result<bool>;

    /// Pull an image; progress presentation is the caller's concern
    async fn pull_image(&self, image: &str) -> Result<()>;

    /// Install ComfyUI from the given branch/release into `path`
    async fn install_comfyui(&self, path: &str, branch: &str) -> Result<()>;

    /// Available ComfyUI image tags for the release selector
    async fn image_tags(&self) -> Result<ImageTags>;

    /// Create a new environment from the finalized input
    async fn create_environment(&self, input: &EnvironmentInput) -> Result<Environment>;

    /// Duplicate an existing environment under the finalized input
    async fn duplicate_environment(
        &self,
        source_id: &str,
        input: &EnvironmentInput,
    ) -> Result<Environment>;

    /// Current user settings
    async fn user_settings(&self) -> Result<UserSettings>;

    /// Apply a partial settings update, returning the merged settings
    async fn update_user_settings(&self, update: UserSettingsUpdate) -> Result<UserSettings>;
}

// Implement the trait for references so controllers can borrow a backend

impl<T: ComfyBackend> ComfyBackend for &T {
    async fn image_exists(&self, image: &str) -> Result<bool> {
        (*self).image_exists(image).await
    }

    async fn valid_comfyui_path(&self, path: &str) -> Result<bool> {
        (*self).valid_comfyui_path(path).await
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        (*self).pull_image(image).await
    }

    async fn install_comfyui(&self, path: &str, branch: &str) -> Result<()> {
        (*self).install_comfyui(path, branch).await
    }

    async fn image_tags(&self) -> Result<ImageTags> {
        (*self).image_tags().await
    }

    async fn create_environment(&self, input: &EnvironmentInput) -> Result<Environment> {
        (*self).create_environment(input).await
    }

    async fn duplicate_environment(
        &self,
        source_id: &str,
        input: &EnvironmentInput,
    ) -> Result<Environment> {
        (*self).duplicate_environment(source_id, input).await
    }

    async fn user_settings(&self) -> Result<UserSettings> {
        (*self).user_settings().await
    }

    async fn update_user_settings(&self, update: UserSettingsUpdate) -> Result<UserSettings> {
        (*self).update_user_settings(update).await
    }
}

/// Transient user-visible notifications (the toast surface)
pub trait Notifier {
    /// Operation completed
    fn success(&self, message: &str);

    /// Operation failed; the workflow has already returned to idle
    fn error(&self, message: &str);
}

impl<T: Notifier> Notifier for &T {
    fn success(&self, message: &str) {
        (*self).success(message)
    }

    fn error(&self, message: &str) {
        (*self).error(message)
    }
}
