//! Environment data model
//!
//! Types shared between the form layer, the workflow controller, and the
//! backend collaborators: the closed environment-type enumeration, the
//! runtime options bag, and the input/record shapes for create and duplicate
//! operations.

use crate::errors::ConfigError;
use crate::mount::MountConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Docker Hub repository for prebuilt ComfyUI environment images
pub const COMFYUI_IMAGE_NAME: &str = "akatzai/comfyui-env";

/// Conventional image tag for a ComfyUI release, used when the user leaves
/// the image field empty and a release selector is configured.
pub fn default_image_for_release(release: &str) -> String {
    format!("{}:{}", COMFYUI_IMAGE_NAME, release)
}

/// Preset selecting which directories are mounted or copied by default.
///
/// `Auto` is only offered in the duplicate flow, where it reuses the source
/// environment's mounts minus one-time copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentType {
    /// Duplicate flow only: keep the source environment's mount config,
    /// excluding copied directories
    Auto,
    /// Mount models, output, and input
    Default,
    /// Default plus the user (workflows) directory
    #[serde(rename = "Default+Workflows")]
    DefaultPlusWorkflows,
    /// Default plus a one-time copy of custom_nodes
    #[serde(rename = "Default+CustomNodes")]
    DefaultPlusCustomNodes,
    /// Default plus workflows mount and custom_nodes copy
    #[serde(rename = "Default+Both")]
    DefaultPlusBoth,
    /// No mounts at all
    Isolated,
    /// User-edited mount list, never auto-regenerated wholesale
    Custom,
}

impl EnvironmentType {
    /// Presets offered in the create flow (everything except `Auto`)
    pub const CREATE_CHOICES: &'static [EnvironmentType] = &[
        EnvironmentType::Default,
        EnvironmentType::DefaultPlusWorkflows,
        EnvironmentType::DefaultPlusCustomNodes,
        EnvironmentType::DefaultPlusBoth,
        EnvironmentType::Isolated,
        EnvironmentType::Custom,
    ];

    /// Presets offered in the duplicate flow
    pub const DUPLICATE_CHOICES: &'static [EnvironmentType] = &[
        EnvironmentType::Auto,
        EnvironmentType::Default,
        EnvironmentType::DefaultPlusWorkflows,
        EnvironmentType::DefaultPlusCustomNodes,
        EnvironmentType::DefaultPlusBoth,
        EnvironmentType::Isolated,
        EnvironmentType::Custom,
    ];

    /// Display string matching the persisted representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::Default => "Default",
            Self::DefaultPlusWorkflows => "Default+Workflows",
            Self::DefaultPlusCustomNodes => "Default+CustomNodes",
            Self::DefaultPlusBoth => "Default+Both",
            Self::Isolated => "Isolated",
            Self::Custom => "Custom",
        }
    }

    /// One-line description shown next to the selector
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auto => {
                "Keeps the same mount configuration as the original environment, \
                 excluding copied directories."
            }
            Self::Default => {
                "Mounts models, output, and input directories from your local \
                 ComfyUI installation."
            }
            Self::DefaultPlusWorkflows => {
                "Same as default, but also mounts workflows from your local \
                 ComfyUI installation."
            }
            Self::DefaultPlusCustomNodes => {
                "Same as default, but also copies and installs custom nodes from \
                 your local ComfyUI installation."
            }
            Self::DefaultPlusBoth => {
                "Same as default, but also mounts workflows and copies custom \
                 nodes from your local ComfyUI installation."
            }
            Self::Isolated => "Creates an isolated environment with no mounts.",
            Self::Custom => "Allows for advanced configuration options.",
        }
    }
}

impl FromStr for EnvironmentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Auto" => Ok(Self::Auto),
            "Default" => Ok(Self::Default),
            "Default+Workflows" => Ok(Self::DefaultPlusWorkflows),
            "Default+CustomNodes" => Ok(Self::DefaultPlusCustomNodes),
            "Default+Both" => Ok(Self::DefaultPlusBoth),
            "Isolated" => Ok(Self::Isolated),
            "Custom" => Ok(Self::Custom),
            _ => Err(ConfigError::Validation {
                message: format!(
                    "Unknown environment type: '{}'. Supported types: {}",
                    s,
                    Self::DUPLICATE_CHOICES
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }
}

impl std::fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime options attached to an environment.
///
/// Unknown keys written by other frontends are preserved through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentOptions {
    /// Host port mapped to the ComfyUI server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Container runtime, e.g. "nvidia" or "none"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Mount bindings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_config: Option<MountConfig>,
    /// ComfyUI release the environment was created from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfyui_release: Option<String>,
    /// Forward-compatible catch-all for keys this frontend does not own
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Payload for the create/duplicate collaborators, built from form values at
/// submit time. Never persisted beyond a single operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInput {
    /// Environment name
    pub name: String,
    /// Docker image reference
    pub image: String,
    /// Optional startup command override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Host path of the local ComfyUI installation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfyui_path: Option<String>,
    /// Runtime options including the mount config
    #[serde(default)]
    pub options: EnvironmentOptions,
    /// Folders the new environment is assigned to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folder_ids: Vec<String>,
}

/// A persisted environment record; read-only source for duplicate defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Record id assigned by the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Environment name
    pub name: String,
    /// Docker image the container was created from
    pub image: String,
    /// Lifecycle status reported by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Startup command override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Host path of the local ComfyUI installation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfyui_path: Option<String>,
    /// Runtime options including the mount config
    #[serde(default)]
    pub options: EnvironmentOptions,
    /// Backend-owned metadata, e.g. the original base image
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Folder assignments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folder_ids: Vec<String>,
}

impl Environment {
    /// Image to prefill when duplicating: the recorded base image when the
    /// backend stored one, otherwise the image the container runs.
    pub fn base_image(&self) -> &str {
        self.metadata
            .get("base_image")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.image)
    }
}
