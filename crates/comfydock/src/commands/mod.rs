//! Command implementations for the ComfyDock CLI

pub mod create;
pub mod delete;
pub mod duplicate;
pub mod list;
pub mod releases;
pub mod restore;
pub mod settings;

use crate::backend::LocalBackend;
use crate::ui::notify::ConsoleNotifier;
use crate::ui::prompt::{self, InstallChoice};
use crate::ui::pull;
use anyhow::{bail, Result};
use comfydock_core::workflow::{WorkflowController, WorkflowEvent};

/// Shared context threaded into every command
pub struct CommandContext {
    /// Backend for Docker, installation, and persistence operations
    pub backend: LocalBackend,
    /// Never prompt; take the safe default at every decision point
    pub non_interactive: bool,
}

/// Drive a submitted workflow to completion, resolving pull and install
/// prompts through the terminal (or their defaults in non-interactive mode).
pub(crate) async fn run_workflow(
    ctx: &CommandContext,
    ctl: &mut WorkflowController<&LocalBackend, ConsoleNotifier>,
) -> Result<()> {
    let mut event = ctl.submit().await?;
    loop {
        match event {
            WorkflowEvent::Completed => return Ok(()),
            WorkflowEvent::ValidationFailed(errors) => {
                for error in &errors {
                    eprintln!("  {}", error);
                }
                bail!("validation failed with {} error(s)", errors.len());
            }
            WorkflowEvent::ImagePullRequired { image } => {
                let pull_it = ctx.non_interactive
                    || prompt::confirm(
                        &format!("Image '{}' is not available locally. Pull it now?", image),
                        true,
                    )?;
                if !pull_it {
                    ctl.pull_cancelled()?;
                    bail!("operation cancelled");
                }
                // A failed pull abandons the pending operation; the
                // controller must be back in idle before the error surfaces
                if let Err(e) = pull::pull_with_progress(&ctx.backend, &image).await {
                    ctl.pull_cancelled()?;
                    return Err(e);
                }
                event = ctl.pull_completed().await?;
            }
            WorkflowEvent::InstallPromptRequired { path } => {
                let choice = if ctx.non_interactive {
                    InstallChoice::Proceed
                } else {
                    prompt::install_choice(&path)?
                };
                event = match choice {
                    InstallChoice::Install(branch) => ctl.install_comfyui(&branch).await?,
                    InstallChoice::Proceed => ctl.skip_install().await?,
                    InstallChoice::Cancel => {
                        ctl.cancel_install()?;
                        bail!("operation cancelled");
                    }
                };
            }
            WorkflowEvent::Aborted => bail!("operation aborted"),
        }
    }
}
