//! Restore a deleted environment

use super::CommandContext;
use anyhow::Result;
use tracing::instrument;

#[instrument(skip(ctx))]
pub async fn execute(ctx: CommandContext, id: String) -> Result<()> {
    let env = ctx.backend.store()?.restore(&id)?;
    println!("Restored environment '{}'.", env.name);
    Ok(())
}
