//! Interactive terminal prompts
//!
//! Prompts write to stderr and read answers from stdin. Callers are expected
//! to skip these entirely in non-interactive sessions.

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// User decision at the ComfyUI install prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallChoice {
    /// Install the given release under the base path
    Install(String),
    /// Continue without installing
    Proceed,
    /// Abandon the whole operation
    Cancel,
}

/// Yes/no question; empty input takes the default
pub fn confirm(question: &str, default_yes: bool) -> Result<bool> {
    let suffix = if default_yes { "[Y/n]" } else { "[y/N]" };
    eprint!("{} {} ", question, suffix);
    io::stderr().flush()?;
    let answer = read_line()?;
    Ok(match answer.trim().to_ascii_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    })
}

/// Three-way prompt shown when no valid ComfyUI installation was found
pub fn install_choice(path: &str) -> Result<InstallChoice> {
    eprintln!("No valid ComfyUI installation found at '{}'.", path);
    eprint!("[i]nstall ComfyUI, [p]roceed anyway, or [c]ancel? [i/p/C] ");
    io::stderr().flush()?;
    let answer = read_line()?;
    match answer.trim().to_ascii_lowercase().as_str() {
        "i" | "install" => {
            eprint!("Release to install [latest]: ");
            io::stderr().flush()?;
            let branch = read_line()?;
            let branch = branch.trim();
            Ok(InstallChoice::Install(if branch.is_empty() {
                "latest".to_string()
            } else {
                branch.to_string()
            }))
        }
        "p" | "proceed" => Ok(InstallChoice::Proceed),
        _ => Ok(InstallChoice::Cancel),
    }
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
