//! Create a new ComfyUI environment

use super::CommandContext;
use crate::ui::notify::ConsoleNotifier;
use anyhow::{Context, Result};
use comfydock_core::backend::ComfyBackend;
use comfydock_core::environment::EnvironmentType;
use comfydock_core::form::EnvironmentForm;
use comfydock_core::releases::ReleaseCache;
use comfydock_core::workflow::WorkflowController;
use tracing::instrument;

/// Arguments for the create command
#[derive(Debug)]
pub struct CreateArgs {
    pub name: Option<String>,
    pub image: Option<String>,
    pub release: Option<String>,
    pub comfyui_path: Option<String>,
    pub port: Option<u16>,
    pub environment_type: Option<String>,
    pub command: Option<String>,
    pub folder: Option<String>,
}

#[instrument(skip(ctx, args), fields(name = ?args.name))]
pub async fn execute(ctx: CommandContext, args: CreateArgs) -> Result<()> {
    let settings = ctx.backend.user_settings().await?;
    let mut form = EnvironmentForm::create_defaults(&settings);

    if let Some(name) = args.name {
        form.values.name = name;
    }
    if let Some(path) = args.comfyui_path {
        form.set_comfyui_path(path);
    }
    if let Some(ty) = &args.environment_type {
        let ty = ty.parse::<EnvironmentType>()?;
        if ty == EnvironmentType::Auto {
            anyhow::bail!("environment type 'Auto' is only available when duplicating");
        }
        form.set_environment_type(ty);
    }
    if let Some(image) = args.image {
        form.values.image = Some(image);
    }
    if let Some(release) = args.release {
        form.values.release = Some(release);
    }
    if let Some(port) = args.port {
        form.values.port = port.to_string();
    }
    if let Some(command) = args.command {
        shell_words::split(&command)
            .with_context(|| format!("Invalid startup command: '{}'", command))?;
        form.values.command = command;
    }

    let mut ctl = WorkflowController::new(&ctx.backend, ConsoleNotifier::new(), form);
    if ctl.form().values.release.is_some() {
        let mut cache = ReleaseCache::new();
        let releases = cache.get_or_fetch(&ctx.backend).await?;
        ctl.set_release_options(releases.to_vec());
    }
    ctl.set_selected_folder(args.folder);

    super::run_workflow(&ctx, &mut ctl).await
}
