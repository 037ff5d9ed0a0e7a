//! List environments

use super::CommandContext;
use anyhow::Result;
use console::style;
use tracing::instrument;

#[instrument(skip(ctx))]
pub async fn execute(ctx: CommandContext, json: bool, deleted: bool) -> Result<()> {
    let store = ctx.backend.store()?;
    let records = if deleted { store.deleted()? } else { store.list()? };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No environments found.");
        return Ok(());
    }

    for record in &records {
        let env = &record.environment;
        let id = env.id.as_deref().unwrap_or("-");
        let status = env.status.as_deref().unwrap_or("-");
        println!(
            "{:<24} {:<40} {:<12} {}",
            style(&env.name).bold(),
            env.image,
            status,
            id
        );
    }
    Ok(())
}
