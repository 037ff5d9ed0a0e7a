use anyhow::Result;
use comfydock_core::backend::ComfyBackend;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}

fn finished_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap()
}

/// Pull an image with a spinner on stderr while the Docker CLI works
pub async fn pull_with_progress<B: ComfyBackend>(backend: &B, image: &str) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_style(spinner_style());
    pb.set_message(style(format!("Pulling {}...", image)).yellow().to_string());

    match backend.pull_image(image).await {
        Ok(()) => {
            pb.set_style(finished_style());
            pb.finish_with_message(style(format!("Pulled {}", image)).green().to_string());
            Ok(())
        }
        Err(e) => {
            pb.set_style(finished_style());
            pb.finish_with_message(
                style(format!("Failed to pull {}", image)).red().to_string(),
            );
            Err(e.into())
        }
    }
}
