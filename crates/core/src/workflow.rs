//! Create/duplicate workflow controller
//!
//! One state machine serves both dialog flows, parameterized by
//! [`FlowKind`](crate::form::FlowKind) and [`WorkflowOptions`] instead of the
//! per-dialog copies the UI grew historically:
//!
//! ```text
//! Idle -> Submitting -> {AwaitingImagePull | AwaitingComfyUIInstall}
//!      -> Finalizing -> Idle
//! ```
//!
//! Any collaborator failure is absorbed: the error is emitted through the
//! [`Notifier`], the pending input is discarded, and the machine returns to
//! `Idle`. Nothing is created partially; cancelling out of the install prompt
//! aborts the whole operation.
//!
//! Pre-flight ordering: the image check runs before the path check, and a
//! missing image wins the tie when both would trigger, since installing
//! ComfyUI may rely on tooling from the pulled image. After a pull completes
//! only the path check is retried; after an install detour both checks run
//! again before finalizing.

use crate::backend::{ComfyBackend, Notifier};
use crate::environment::{default_image_for_release, EnvironmentInput};
use crate::errors::{InternalError, Result};
use crate::form::{EnvironmentForm, FieldError, FlowKind};
use crate::mount::MountConfig;
use crate::paths::derive_installed_path;
use crate::releases::resolve_release;
use tracing::{debug, instrument, warn};

/// Workflow states; the dialog locks its open/close handling outside `Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Nothing in flight
    Idle,
    /// Pre-flight checks running
    Submitting,
    /// Waiting on the image-pull dialog
    AwaitingImagePull,
    /// Waiting on the user's install decision
    AwaitingComfyUIInstall,
    /// Create/duplicate call in flight
    Finalizing,
}

/// Outcome of driving the workflow one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// The environment was created or duplicated; the form has been reset
    Completed,
    /// Schema validation failed; surfaced inline, no notification emitted
    ValidationFailed(Vec<FieldError>),
    /// The image is not available locally; open the pull dialog for it
    ImagePullRequired {
        /// Image reference to pull
        image: String,
    },
    /// No valid ComfyUI installation at the base path; prompt the user
    InstallPromptRequired {
        /// Path that failed validation
        path: String,
    },
    /// The operation was abandoned (error or user cancel); back to idle with
    /// the pending input discarded
    Aborted,
}

/// Per-flow knobs collapsing the historical dialog variants
#[derive(Debug, Clone, Copy)]
pub struct WorkflowOptions {
    /// Run the ComfyUI path pre-flight check
    pub validate_comfyui_path: bool,
    /// Synthesize `<image>:<release>` from the release selector when the
    /// image field is empty
    pub synthesize_image_from_release: bool,
}

impl WorkflowOptions {
    /// Create-flow defaults: validate the path, allow tag synthesis
    pub fn create() -> Self {
        Self {
            validate_comfyui_path: true,
            synthesize_image_from_release: true,
        }
    }

    /// Duplicate-flow defaults: the source environment already proved its
    /// path, no fresh installation check
    pub fn duplicate() -> Self {
        Self {
            validate_comfyui_path: false,
            synthesize_image_from_release: false,
        }
    }
}

/// The workflow controller for one dialog instance.
///
/// Owns the dialog's form; the dialog edits it through
/// [`form_mut`](Self::form_mut) and drives the machine through the
/// transition methods. Exactly one operation may be in flight at a time.
pub struct WorkflowController<B, N> {
    backend: B,
    notifier: N,
    form: EnvironmentForm,
    options: WorkflowOptions,
    release_options: Vec<String>,
    selected_folder: Option<String>,
    state: WorkflowState,
    pending: Option<EnvironmentInput>,
}

impl<B: ComfyBackend, N: Notifier> WorkflowController<B, N> {
    /// Controller with flow-appropriate default options
    pub fn new(backend: B, notifier: N, form: EnvironmentForm) -> Self {
        let options = match form.flow() {
            FlowKind::Create => WorkflowOptions::create(),
            FlowKind::Duplicate => WorkflowOptions::duplicate(),
        };
        Self::with_options(backend, notifier, form, options)
    }

    /// Controller with explicit options
    pub fn with_options(
        backend: B,
        notifier: N,
        form: EnvironmentForm,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            backend,
            notifier,
            form,
            options,
            release_options: Vec::new(),
            selected_folder: None,
            state: WorkflowState::Idle,
            pending: None,
        }
    }

    /// Provide the release list backing the version selector
    pub fn set_release_options(&mut self, releases: Vec<String>) {
        self.release_options = releases;
    }

    /// Folder the new environment is assigned to at submit time
    pub fn set_selected_folder(&mut self, folder: Option<String>) {
        self.selected_folder = folder;
    }

    /// Current state
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// True while an operation is in flight; the dialog disables its
    /// open/close handling so the user cannot dismiss mid-operation
    pub fn is_busy(&self) -> bool {
        self.state != WorkflowState::Idle
    }

    /// The dialog's form
    pub fn form(&self) -> &EnvironmentForm {
        &self.form
    }

    /// Mutable access for field edits while idle or awaiting a prompt
    pub fn form_mut(&mut self) -> &mut EnvironmentForm {
        &mut self.form
    }

    /// Pending input, present between submit and completion/abort
    pub fn pending(&self) -> Option<&EnvironmentInput> {
        self.pending.as_ref()
    }

    /// Submit the form: validate, build the pending input, and run the
    /// pre-flight checks.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<WorkflowEvent> {
        if self.state != WorkflowState::Idle {
            return Err(InternalError::Generic {
                message: "an operation is already in flight".to_string(),
            }
            .into());
        }

        if let Err(errors) = self.form.values.validate(self.form.flow()) {
            debug!("Form validation failed with {} errors", errors.len());
            return Ok(WorkflowEvent::ValidationFailed(errors));
        }

        let image = match self.resolve_image() {
            Some(image) => image,
            None => {
                return Ok(WorkflowEvent::ValidationFailed(vec![FieldError {
                    field: "image".to_string(),
                    message: "Docker image is required".to_string(),
                }]))
            }
        };

        let mut input = match self.form.build_input(image) {
            Ok(input) => input,
            Err(e) => return Ok(self.abort_with_error(&e.to_string())),
        };
        if let Some(folder) = &self.selected_folder {
            input.folder_ids = vec![folder.clone()];
        }

        self.pending = Some(input);
        self.state = WorkflowState::Submitting;
        self.continue_submit(true, self.options.validate_comfyui_path)
            .await
    }

    /// Image-pull dialog success signal: retry only the path check, the
    /// image was just pulled.
    #[instrument(skip(self))]
    pub async fn pull_completed(&mut self) -> Result<WorkflowEvent> {
        self.expect_state(WorkflowState::AwaitingImagePull)?;
        self.state = WorkflowState::Submitting;
        self.continue_submit(false, self.options.validate_comfyui_path)
            .await
    }

    /// Image-pull dialog dismissed without pulling
    pub fn pull_cancelled(&mut self) -> Result<WorkflowEvent> {
        self.expect_state(WorkflowState::AwaitingImagePull)?;
        debug!("Image pull cancelled, discarding pending environment");
        self.reset_to_idle();
        Ok(WorkflowEvent::Aborted)
    }

    /// Install ComfyUI from `branch`, move the base path into the cloned
    /// directory, recompute mounts, and re-run both pre-flight checks.
    #[instrument(skip(self))]
    pub async fn install_comfyui(&mut self, branch: &str) -> Result<WorkflowEvent> {
        self.expect_state(WorkflowState::AwaitingComfyUIInstall)?;
        self.state = WorkflowState::Submitting;

        let base_path = self.form.values.comfyui_path.clone();
        let release = resolve_release(branch, &self.release_options);
        if let Err(e) = self.backend.install_comfyui(&base_path, &release).await {
            return Ok(self.abort_with_error(&e.to_string()));
        }
        self.notifier.success("ComfyUI installed successfully");

        // The clone landed in <base>/ComfyUI; rebase the form and the
        // pending input on the installed directory.
        let installed = derive_installed_path(&base_path);
        self.form.set_comfyui_path(installed.clone());
        if let Some(pending) = self.pending.as_mut() {
            pending.comfyui_path = Some(installed);
            pending.options.mount_config = Some(MountConfig {
                mounts: self.form.values.mount_config.clone(),
            });
        }

        self.continue_submit(true, true).await
    }

    /// Proceed without installing: finalize with the original pending input
    #[instrument(skip(self))]
    pub async fn skip_install(&mut self) -> Result<WorkflowEvent> {
        self.expect_state(WorkflowState::AwaitingComfyUIInstall)?;
        self.finalize().await
    }

    /// Cancel out of the install prompt: abort the whole operation, no
    /// environment is created.
    pub fn cancel_install(&mut self) -> Result<WorkflowEvent> {
        self.expect_state(WorkflowState::AwaitingComfyUIInstall)?;
        debug!("Install prompt cancelled, discarding pending environment");
        self.reset_to_idle();
        Ok(WorkflowEvent::Aborted)
    }

    fn resolve_image(&self) -> Option<String> {
        let typed = self
            .form
            .values
            .image
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty());
        if let Some(image) = typed {
            return Some(image.to_string());
        }
        if self.options.synthesize_image_from_release {
            if let Some(branch) = &self.form.values.release {
                let release = resolve_release(branch, &self.release_options);
                return Some(default_image_for_release(&release));
            }
        }
        // Duplicate flow falls back to the source's base image, matching
        // the prefill in duplicate_defaults
        self.form.source().map(|s| s.base_image().to_string())
    }

    async fn continue_submit(
        &mut self,
        check_image: bool,
        check_path: bool,
    ) -> Result<WorkflowEvent> {
        debug_assert_eq!(self.state, WorkflowState::Submitting);
        let Some(pending) = self.pending.clone() else {
            return Ok(self.abort_with_error("no pending environment"));
        };

        if check_image {
            match self.backend.image_exists(&pending.image).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Image '{}' not present, awaiting pull", pending.image);
                    self.state = WorkflowState::AwaitingImagePull;
                    return Ok(WorkflowEvent::ImagePullRequired {
                        image: pending.image.clone(),
                    });
                }
                Err(e) => return Ok(self.abort_with_error(&e.to_string())),
            }
        }

        if check_path {
            let path = pending.comfyui_path.clone().unwrap_or_default();
            match self.backend.valid_comfyui_path(&path).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("No valid ComfyUI installation at '{}'", path);
                    self.state = WorkflowState::AwaitingComfyUIInstall;
                    return Ok(WorkflowEvent::InstallPromptRequired { path });
                }
                Err(e) => return Ok(self.abort_with_error(&e.to_string())),
            }
        }

        self.finalize().await
    }

    async fn finalize(&mut self) -> Result<WorkflowEvent> {
        self.state = WorkflowState::Finalizing;
        let Some(input) = self.pending.clone() else {
            return Ok(self.abort_with_error("no pending environment"));
        };

        let outcome = match self.form.flow() {
            FlowKind::Create => self.backend.create_environment(&input).await,
            FlowKind::Duplicate => {
                let source_id = self
                    .form
                    .source()
                    .and_then(|s| s.id.clone())
                    .unwrap_or_default();
                self.backend.duplicate_environment(&source_id, &input).await
            }
        };

        match outcome {
            Ok(_) => {
                let message = match self.form.flow() {
                    FlowKind::Create => "Environment created successfully",
                    FlowKind::Duplicate => "Environment duplicated successfully",
                };
                self.notifier.success(message);
                self.form.reset();
                self.reset_to_idle();
                Ok(WorkflowEvent::Completed)
            }
            // No automatic retry after a successful install/pull; the user
            // resubmits the form.
            Err(e) => Ok(self.abort_with_error(&e.to_string())),
        }
    }

    fn abort_with_error(&mut self, message: &str) -> WorkflowEvent {
        warn!("Workflow aborted: {}", message);
        self.notifier.error(message);
        self.reset_to_idle();
        WorkflowEvent::Aborted
    }

    fn reset_to_idle(&mut self) {
        self.state = WorkflowState::Idle;
        self.pending = None;
    }

    fn expect_state(&self, expected: WorkflowState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(InternalError::Generic {
                message: format!(
                    "workflow is in state {:?}, expected {:?}",
                    self.state, expected
                ),
            }
            .into())
        }
    }
}
