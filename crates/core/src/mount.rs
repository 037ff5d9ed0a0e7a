//! Mount policy and mount-config parsing
//!
//! This module owns the derivation rules that map an environment-type
//! selection to a concrete list of host/container bindings, and the
//! normalization of persisted mount configs. Two persisted shapes are
//! supported:
//!
//! 1. Modern: `{"mounts": [{"container_path": ..., "host_path": ..., "type":
//!    "mount", "read_only": false, "override": false}, ...]}`
//! 2. Legacy: `{"models": "mount", "custom_nodes": "copy"}` where container
//!    and host paths are synthesized from the directory name.
//!
//! Mount lists are created on environment-type selection or on base-path
//! change, held in form state, and serialized into the environment input only
//! at submit time.

use crate::environment::EnvironmentType;
use crate::errors::{ConfigError, Result};
use crate::paths::{container_dir_name, join_paths, CONTAINER_COMFYUI_ROOT};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Whether a directory is bind-mounted into the container or copied once at
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountAction {
    /// Bind mount from the host filesystem
    Mount,
    /// One-time copy into the container at creation
    Copy,
}

impl FromStr for MountAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mount" => Ok(MountAction::Mount),
            "copy" => Ok(MountAction::Copy),
            _ => Err(ConfigError::Validation {
                message: format!(
                    "Unsupported mount action: '{}'. Supported actions: mount, copy",
                    s
                ),
            }),
        }
    }
}

impl std::fmt::Display for MountAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MountAction::Mount => write!(f, "mount"),
            MountAction::Copy => write!(f, "copy"),
        }
    }
}

/// One binding from a host directory into the container filesystem.
///
/// `container_path` is always rooted under [`CONTAINER_COMFYUI_ROOT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Target path inside the container
    pub container_path: String,
    /// Source path on the host
    pub host_path: String,
    /// Mount or one-time copy
    #[serde(rename = "type")]
    pub action: MountAction,
    /// Read-only binding
    #[serde(default)]
    pub read_only: bool,
    /// Freezes `host_path` against recomputation when the base path changes
    #[serde(rename = "override", default)]
    pub pinned: bool,
}

impl Mount {
    /// Build a mount for `dir` under the container ComfyUI root, with the
    /// host path joined against `base_path` in its separator style.
    pub fn for_dir(dir: &str, base_path: &str, action: MountAction) -> Self {
        Mount {
            container_path: format!("{}/{}", CONTAINER_COMFYUI_ROOT, dir),
            host_path: join_paths(base_path, dir),
            action,
            read_only: false,
            pinned: false,
        }
    }

    /// Validate invariants: container path rooted under the ComfyUI root,
    /// non-empty host path.
    pub fn validate(&self) -> Result<()> {
        if !self.container_path.starts_with(CONTAINER_COMFYUI_ROOT) {
            return Err(ConfigError::Validation {
                message: format!(
                    "Mount container path must be rooted under {}, got: '{}'",
                    CONTAINER_COMFYUI_ROOT, self.container_path
                ),
            }
            .into());
        }
        if self.host_path.is_empty() {
            return Err(ConfigError::Validation {
                message: format!("Mount for '{}' has an empty host path", self.container_path),
            }
            .into());
        }
        Ok(())
    }
}

/// Wire shape for the mount list inside environment options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Ordered mount list
    pub mounts: Vec<Mount>,
}

/// Derive the preset mount list for an environment type.
///
/// `Isolated` and `Custom` produce an empty list; for `Custom` the caller is
/// responsible for supplying or preserving the user's list. `Auto` is a
/// duplicate-flow selection handled by [`auto_mounts`], never produced here.
pub fn default_mounts(env_type: EnvironmentType, base_path: &str) -> Vec<Mount> {
    use MountAction::{Copy, Mount as Bind};

    let specs: &[(&str, MountAction)] = match env_type {
        EnvironmentType::Default => &[("models", Bind), ("output", Bind), ("input", Bind)],
        EnvironmentType::DefaultPlusWorkflows => &[
            ("user", Bind),
            ("models", Bind),
            ("output", Bind),
            ("input", Bind),
        ],
        EnvironmentType::DefaultPlusCustomNodes => &[
            ("custom_nodes", Copy),
            ("models", Bind),
            ("output", Bind),
            ("input", Bind),
        ],
        EnvironmentType::DefaultPlusBoth => &[
            ("custom_nodes", Copy),
            ("user", Bind),
            ("models", Bind),
            ("output", Bind),
            ("input", Bind),
        ],
        EnvironmentType::Isolated | EnvironmentType::Custom | EnvironmentType::Auto => &[],
    };

    specs
        .iter()
        .map(|(dir, action)| Mount::for_dir(dir, base_path, *action))
        .collect()
}

/// Duplicate-flow `Auto` derivation: reuse the source environment's mounts,
/// dropping one-time `Copy` entries, leaving the rest unchanged.
pub fn auto_mounts(existing: &[Mount]) -> Vec<Mount> {
    existing
        .iter()
        .filter(|m| m.action == MountAction::Mount)
        .cloned()
        .collect()
}

/// Normalize a persisted mount config (modern or legacy shape) into a mount
/// list. Unknown legacy values and malformed modern entries are skipped with
/// a warning rather than failing the whole parse.
pub fn parse_existing_mount_config(raw: &serde_json::Value, base_path: &str) -> Vec<Mount> {
    let serde_json::Value::Object(map) = raw else {
        if !raw.is_null() {
            warn!("Mount config is not an object, ignoring: {}", raw);
        }
        return Vec::new();
    };

    // Modern shape: {"mounts": [...]}
    if let Some(serde_json::Value::Array(entries)) = map.get("mounts") {
        let mut mounts = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Mount>(entry.clone()) {
                Ok(mount) => match mount.validate() {
                    Ok(()) => mounts.push(mount),
                    Err(e) => warn!("Skipping invalid mount entry: {}", e),
                },
                Err(e) => warn!("Skipping malformed mount entry: {}", e),
            }
        }
        return mounts;
    }

    // Legacy shape: {"models": "mount", "custom_nodes": "copy"}
    let mut mounts = Vec::new();
    for (dir, value) in map {
        let Some(action_str) = value.as_str() else {
            warn!("Skipping legacy mount entry '{}': value is not a string", dir);
            continue;
        };
        match action_str.parse::<MountAction>() {
            Ok(action) => mounts.push(Mount::for_dir(dir, base_path, action)),
            Err(_) => {
                warn!(
                    "Skipping legacy mount entry '{}' with unknown action '{}'",
                    dir, action_str
                );
            }
        }
    }
    mounts
}

/// Re-join every non-pinned host path against a new base path.
///
/// The directory name is re-derived from the container path, so renamed host
/// directories are intentionally not preserved. Pinned mounts are untouched.
pub fn recompute_host_paths(mounts: &mut [Mount], base_path: &str) {
    for mount in mounts.iter_mut() {
        if !mount.pinned {
            mount.host_path = join_paths(base_path, container_dir_name(&mount.container_path));
        }
    }
}
