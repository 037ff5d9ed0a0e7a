//! Duplicate an existing ComfyUI environment

use super::CommandContext;
use crate::ui::notify::ConsoleNotifier;
use anyhow::Result;
use comfydock_core::backend::ComfyBackend;
use comfydock_core::environment::EnvironmentType;
use comfydock_core::form::EnvironmentForm;
use comfydock_core::workflow::WorkflowController;
use tracing::instrument;

/// Arguments for the duplicate command
#[derive(Debug)]
pub struct DuplicateArgs {
    pub id: String,
    pub name: Option<String>,
    pub environment_type: Option<String>,
    pub port: Option<u16>,
    pub folder: Option<String>,
}

#[instrument(skip(ctx, args), fields(id = %args.id))]
pub async fn execute(ctx: CommandContext, args: DuplicateArgs) -> Result<()> {
    let settings = ctx.backend.user_settings().await?;
    let source = ctx.backend.store()?.get(&args.id)?;
    let mut form = EnvironmentForm::duplicate_defaults(&source, &settings);

    if let Some(name) = args.name {
        form.values.name = name;
    }
    if let Some(ty) = &args.environment_type {
        form.set_environment_type(ty.parse::<EnvironmentType>()?);
    }
    if let Some(port) = args.port {
        form.values.port = port.to_string();
    }

    let mut ctl = WorkflowController::new(&ctx.backend, ConsoleNotifier::new(), form);
    ctl.set_selected_folder(args.folder);

    super::run_workflow(&ctx, &mut ctl).await
}
