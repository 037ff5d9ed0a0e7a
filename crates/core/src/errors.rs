//! Error types and handling
//!
//! This module provides domain-specific error types for the environment
//! management core. The taxonomy is structured with specific error enums for
//! each domain (configuration/validation, Docker, ComfyUI installation,
//! environment records) that are then wrapped in the main ComfyDockError enum
//! for unified error handling.
//!
//! Every collaborator failure is locally recoverable: callers convert errors
//! into user-visible notifications and return the workflow to a well-defined
//! idle state rather than aborting the process.

use thiserror::Error;

/// Configuration and form-validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A form field or settings value failed validation
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Settings file I/O error
    #[error("Failed to read or write settings file")]
    Io(#[from] std::io::Error),

    /// Settings file parsing error
    #[error("Failed to parse settings file: {message}")]
    Parsing { message: String },
}

/// Docker/runtime-related errors
#[derive(Error, Debug)]
pub enum DockerError {
    /// Docker is not installed or not accessible
    #[error("Docker is not installed or not accessible")]
    NotInstalled,

    /// Docker CLI command error
    #[error("Docker CLI error: {0}")]
    CLIError(String),

    /// Image not found locally or in the registry
    #[error("Image not found: {image}")]
    ImageNotFound { image: String },

    /// Image pull failed
    #[error("Failed to pull image '{image}': {message}")]
    PullFailed { image: String, message: String },
}

/// ComfyUI installation errors
#[derive(Error, Debug)]
pub enum InstallError {
    /// Git is not installed or not accessible
    #[error("Git is not installed or not accessible")]
    GitNotInstalled,

    /// The target path is not usable for an installation
    #[error("Invalid installation path: {path}")]
    InvalidPath { path: String },

    /// Cloning the ComfyUI repository failed
    #[error("Failed to install ComfyUI: {0}")]
    CloneFailed(String),
}

/// Environment record errors
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// No environment with the given id exists
    #[error("Environment not found: {id}")]
    NotFound { id: String },

    /// Environment store I/O error
    #[error("Failed to read or write environment store")]
    Io(#[from] std::io::Error),

    /// Environment store parsing error
    #[error("Failed to parse environment store: {message}")]
    Parsing { message: String },
}

/// Internal/generic fallback errors
#[derive(Error, Debug)]
pub enum InternalError {
    /// Generic internal error with a message
    #[error("Internal error: {message}")]
    Generic { message: String },
}

/// Main error type wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum ComfyDockError {
    /// Configuration or validation error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Docker error
    #[error("Docker error: {0}")]
    Docker(#[from] DockerError),

    /// ComfyUI installation error
    #[error("Installation error: {0}")]
    Install(#[from] InstallError),

    /// Environment record error
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),
}

/// Result type alias for the core library
pub type Result<T> = std::result::Result<T, ComfyDockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ComfyDockError::Docker(DockerError::ImageNotFound {
            image: "akatzai/comfyui-env:latest".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Docker error: Image not found: akatzai/comfyui-env:latest"
        );
    }

    #[test]
    fn test_validation_error_wrapping() {
        let err: ComfyDockError = ConfigError::Validation {
            message: "Environment name is required".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            ComfyDockError::Config(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ComfyDockError = ConfigError::from(io).into();
        assert!(err.to_string().contains("settings file"));
    }
}
