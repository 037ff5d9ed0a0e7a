//! Delete an environment

use super::CommandContext;
use crate::ui::prompt;
use anyhow::{bail, Result};
use tracing::instrument;

#[instrument(skip(ctx))]
pub async fn execute(ctx: CommandContext, id: String, yes: bool) -> Result<()> {
    let store = ctx.backend.store()?;
    let env = store.get(&id)?;

    if !yes {
        if ctx.non_interactive {
            bail!("refusing to delete without confirmation; pass --yes");
        }
        let question = format!("Delete environment '{}' ({})?", env.name, id);
        if !prompt::confirm(&question, false)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.delete(&id)?;
    println!(
        "Deleted environment '{}'. Run 'comfydock list --deleted' to see restorable deletions.",
        env.name
    );
    Ok(())
}
