//! List available ComfyUI releases

use super::CommandContext;
use anyhow::Result;
use comfydock_core::releases::ReleaseCache;
use console::style;
use tracing::instrument;

#[instrument(skip(ctx))]
pub async fn execute(ctx: CommandContext, refresh: bool, json: bool) -> Result<()> {
    let mut cache = ReleaseCache::new();
    let releases = if refresh {
        cache.refresh(&ctx.backend).await?
    } else {
        cache.get_or_fetch(&ctx.backend).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&releases)?);
        return Ok(());
    }

    if releases.len() <= 1 {
        println!("No ComfyUI releases found locally.");
        println!("Pull an image first, e.g. 'docker pull akatzai/comfyui-env:<tag>'.");
        return Ok(());
    }

    for release in releases {
        if release == "latest" {
            println!("{}", style(release).bold());
        } else {
            println!("{}", release);
        }
    }
    Ok(())
}
