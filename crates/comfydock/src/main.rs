use anyhow::Result;
use clap::Parser;

mod backend;
mod cli;
mod commands;
mod ui;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let parsed = cli::Cli::parse();

    // Dispatch to CLI handler and handle special exit codes
    match parsed.dispatch().await {
        Ok(()) => Ok(()),
        Err(err) => {
            // A missing Docker installation gets exit code 2 so scripts can
            // tell it apart from ordinary command failures
            if let Some(core_err) = err.downcast_ref::<comfydock_core::errors::ComfyDockError>() {
                if matches!(
                    core_err,
                    comfydock_core::errors::ComfyDockError::Docker(
                        comfydock_core::errors::DockerError::NotInstalled
                    )
                ) {
                    eprintln!("Error: {}", core_err);
                    std::process::exit(2);
                }
            }

            // For all other errors, return them normally
            Err(err)
        }
    }
}
