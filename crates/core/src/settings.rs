//! User settings persistence
//!
//! Process-wide defaults for new environments (installation path, port,
//! runtime, command, folders). Settings are loaded once per dialog open and
//! only mutated through an explicit update, never as a side effect of the
//! create/duplicate workflow.

use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Default host port for the ComfyUI server
pub const DEFAULT_PORT: u16 = 8188;

/// Default container runtime
pub const DEFAULT_RUNTIME: &str = "nvidia";

/// Default number of deleted environments kept for restore
pub const DEFAULT_MAX_DELETED_ENVIRONMENTS: u32 = 10;

/// A user-defined grouping of environments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Folder id
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional icon name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Folder {
    /// Folder with a freshly generated id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("folder-{:08x}", fastrand::u32(..)),
            name: name.into(),
            icon: None,
        }
    }
}

/// Process-wide defaults for new environments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Default local ComfyUI installation path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfyui_path: Option<String>,
    /// Default host port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Default container runtime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Default startup command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// User-defined folders
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<Folder>,
    /// How many deleted environments to keep for restore
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_deleted_environments: Option<u32>,
}

impl UserSettings {
    /// Effective port, falling back to [`DEFAULT_PORT`]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Effective runtime, falling back to [`DEFAULT_RUNTIME`]
    pub fn effective_runtime(&self) -> String {
        self.runtime
            .clone()
            .unwrap_or_else(|| DEFAULT_RUNTIME.to_string())
    }

    /// Effective deleted-environment retention limit
    pub fn effective_max_deleted(&self) -> u32 {
        self.max_deleted_environments
            .unwrap_or(DEFAULT_MAX_DELETED_ENVIRONMENTS)
    }
}

/// Partial settings update, applied field-wise over the current settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettingsUpdate {
    /// New installation path
    pub comfyui_path: Option<String>,
    /// New default port
    pub port: Option<u16>,
    /// New default runtime
    pub runtime: Option<String>,
    /// New default command
    pub command: Option<String>,
    /// Replacement folder list
    pub folders: Option<Vec<Folder>>,
    /// New retention limit
    pub max_deleted_environments: Option<u32>,
}

impl UserSettingsUpdate {
    /// Apply this update over `settings`, leaving unset fields alone
    pub fn apply(self, settings: &mut UserSettings) {
        if let Some(path) = self.comfyui_path {
            settings.comfyui_path = Some(path);
        }
        if let Some(port) = self.port {
            settings.port = Some(port);
        }
        if let Some(runtime) = self.runtime {
            settings.runtime = Some(runtime);
        }
        if let Some(command) = self.command {
            settings.command = Some(command);
        }
        if let Some(folders) = self.folders {
            settings.folders = folders;
        }
        if let Some(max) = self.max_deleted_environments {
            settings.max_deleted_environments = Some(max);
        }
    }
}

/// JSON-file settings store
///
/// A missing file reads as default settings; writes create the parent
/// directory as needed.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Create a store backed by `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, defaulting when the file does not exist
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<UserSettings> {
        if !self.path.exists() {
            debug!("Settings file not found, using defaults: {:?}", self.path);
            return Ok(UserSettings::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(ConfigError::Io)?;
        let settings = serde_json::from_str(&contents).map_err(|e| ConfigError::Parsing {
            message: e.to_string(),
        })?;
        Ok(settings)
    }

    /// Persist settings, creating the parent directory if needed
    #[instrument(skip(self, settings))]
    pub fn save(&self, settings: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents =
            serde_json::to_string_pretty(settings).map_err(|e| ConfigError::Parsing {
                message: e.to_string(),
            })?;
        fs::write(&self.path, contents).map_err(ConfigError::Io)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Load, apply a partial update, save, and return the merged settings
    pub fn update(&self, update: UserSettingsUpdate) -> Result<UserSettings> {
        let mut settings = self.load()?;
        update.apply(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::new(tmp.path().join("settings.json"));
        let settings = store.load().unwrap();
        assert_eq!(settings, UserSettings::default());
        assert_eq!(settings.effective_port(), DEFAULT_PORT);
        assert_eq!(settings.effective_runtime(), "nvidia");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::new(tmp.path().join("nested/settings.json"));

        let settings = UserSettings {
            comfyui_path: Some("/opt/comfy".to_string()),
            port: Some(9000),
            runtime: Some("none".to_string()),
            folders: vec![Folder {
                id: "f1".to_string(),
                name: "Experiments".to_string(),
                icon: None,
            }],
            ..Default::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::new(tmp.path().join("settings.json"));
        store
            .save(&UserSettings {
                comfyui_path: Some("/opt/comfy".to_string()),
                port: Some(9000),
                ..Default::default()
            })
            .unwrap();

        let updated = store
            .update(UserSettingsUpdate {
                port: Some(9001),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.port, Some(9001));
        assert_eq!(updated.comfyui_path.as_deref(), Some("/opt/comfy"));
    }

    #[test]
    fn test_folder_new_generates_distinct_ids() {
        let a = Folder::new("Experiments");
        let b = Folder::new("Experiments");
        assert_eq!(a.name, "Experiments");
        assert!(a.id.starts_with("folder-"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_folder_replacement_via_update() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::new(tmp.path().join("settings.json"));

        let folder = Folder::new("Experiments");
        let updated = store
            .update(UserSettingsUpdate {
                folders: Some(vec![folder.clone()]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.folders, vec![folder]);

        let cleared = store
            .update(UserSettingsUpdate {
                folders: Some(Vec::new()),
                ..Default::default()
            })
            .unwrap();
        assert!(cleared.folders.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonSettingsStore::new(&path);
        assert!(store.load().is_err());
    }
}
