//! Show and update user settings

use super::CommandContext;
use crate::cli::SettingsCommands;
use anyhow::{bail, Result};
use comfydock_core::backend::ComfyBackend;
use comfydock_core::settings::{Folder, UserSettingsUpdate};
use tracing::instrument;

#[instrument(skip(ctx, action))]
pub async fn execute(ctx: CommandContext, action: SettingsCommands) -> Result<()> {
    match action {
        SettingsCommands::Show { json } => {
            let settings = ctx.backend.user_settings().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
                return Ok(());
            }
            println!(
                "comfyui_path:             {}",
                settings.comfyui_path.as_deref().unwrap_or("(unset)")
            );
            println!("port:                     {}", settings.effective_port());
            println!("runtime:                  {}", settings.effective_runtime());
            println!(
                "command:                  {}",
                settings.command.as_deref().unwrap_or("(unset)")
            );
            println!(
                "max_deleted_environments: {}",
                settings.effective_max_deleted()
            );
            if !settings.folders.is_empty() {
                println!("folders:");
                for folder in &settings.folders {
                    println!("  {} ({})", folder.name, folder.id);
                }
            }
            Ok(())
        }
        SettingsCommands::Set {
            comfyui_path,
            port,
            runtime,
            command,
            max_deleted_environments,
            add_folder,
            remove_folder,
        } => {
            let folders = if add_folder.is_empty() && remove_folder.is_empty() {
                None
            } else {
                let mut folders = ctx.backend.user_settings().await?.folders;
                for id in &remove_folder {
                    let before = folders.len();
                    folders.retain(|f| &f.id != id);
                    if folders.len() == before {
                        bail!("no folder with id '{}'", id);
                    }
                }
                for name in add_folder {
                    folders.push(Folder::new(name));
                }
                Some(folders)
            };
            let update = UserSettingsUpdate {
                comfyui_path,
                port,
                runtime,
                command,
                folders,
                max_deleted_environments,
            };
            if update == UserSettingsUpdate::default() {
                bail!("nothing to update; pass at least one --<setting> flag");
            }
            ctx.backend.update_user_settings(update).await?;
            println!("Settings updated.");
            Ok(())
        }
    }
}
