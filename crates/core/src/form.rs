//! Environment form state and validation
//!
//! Holds the user-editable fields for the create and duplicate dialogs and
//! the rules that keep the mount list in sync with the environment-type and
//! base-path fields. Values are only serialized into an
//! [`EnvironmentInput`](crate::environment::EnvironmentInput) at submit time.

use crate::environment::{Environment, EnvironmentInput, EnvironmentOptions, EnvironmentType};
use crate::errors::{ConfigError, Result};
use crate::mount::{
    auto_mounts, default_mounts, parse_existing_mount_config, recompute_host_paths, Mount,
    MountConfig,
};
use crate::settings::UserSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum length of an environment name
pub const MAX_NAME_LEN: usize = 128;

/// Which dialog flow the form is serving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Creating a fresh environment
    Create,
    /// Duplicating an existing environment
    Duplicate,
}

/// A single field-level validation failure, surfaced inline next to the field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field the message belongs to
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// User-editable form values
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentFormValues {
    /// Environment name
    pub name: String,
    /// Local ComfyUI installation path (the mount base path)
    pub comfyui_path: String,
    /// Docker image; `None` until the user picks one
    pub image: Option<String>,
    /// Startup command override, as typed
    pub command: String,
    /// Host port, as typed
    pub port: String,
    /// Container runtime
    pub runtime: String,
    /// Selected environment type
    pub environment_type: EnvironmentType,
    /// Current mount list
    pub mount_config: Vec<Mount>,
    /// Selected ComfyUI release, when the dialog carries a release selector
    pub release: Option<String>,
}

impl EnvironmentFormValues {
    /// Validate all fields for the given flow, collecting every failure.
    ///
    /// Image is required in the create flow only; the duplicate flow falls
    /// back to the source environment's image.
    pub fn validate(&self, flow: FlowKind) -> std::result::Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Environment name is required"));
        } else if self.name.chars().count() > MAX_NAME_LEN {
            errors.push(FieldError::new(
                "name",
                format!("Environment name must be less than {} characters", MAX_NAME_LEN),
            ));
        }

        if self.comfyui_path.trim().is_empty() {
            errors.push(FieldError::new("comfyui_path", "ComfyUI path is required"));
        }

        if flow == FlowKind::Create
            && self.image.as_deref().map_or(true, |i| i.trim().is_empty())
            && self.release.is_none()
        {
            errors.push(FieldError::new("image", "Docker image is required"));
        }

        if !self.port.trim().is_empty() {
            match self.port.trim().parse::<u16>() {
                Ok(0) => errors.push(FieldError::new("port", "Port must be between 1 and 65535")),
                Ok(_) => {}
                Err(_) => {
                    errors.push(FieldError::new("port", "Port must be a number between 1 and 65535"))
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Parsed port, when present and valid
    pub fn parsed_port(&self) -> Option<u16> {
        self.port.trim().parse().ok().filter(|p| *p > 0)
    }
}

/// Form state for one dialog instance.
///
/// Owns the values plus the context needed to re-derive mounts: the flow kind
/// and, for duplication, the source environment.
#[derive(Debug, Clone)]
pub struct EnvironmentForm {
    /// Current values
    pub values: EnvironmentFormValues,
    flow: FlowKind,
    defaults: EnvironmentFormValues,
    source: Option<Environment>,
}

impl EnvironmentForm {
    /// Create-flow form prefilled from user settings: type `Default` with its
    /// derived mounts, port/runtime/command/path from settings.
    pub fn create_defaults(settings: &UserSettings) -> Self {
        let comfyui_path = settings.comfyui_path.clone().unwrap_or_default();
        let values = EnvironmentFormValues {
            name: String::new(),
            comfyui_path: comfyui_path.clone(),
            image: None,
            command: settings.command.clone().unwrap_or_default(),
            port: settings.effective_port().to_string(),
            runtime: settings.effective_runtime(),
            environment_type: EnvironmentType::Default,
            mount_config: default_mounts(EnvironmentType::Default, &comfyui_path),
            release: None,
        };
        Self {
            defaults: values.clone(),
            values,
            flow: FlowKind::Create,
            source: None,
        }
    }

    /// Duplicate-flow form prefilled from the source environment: name gets a
    /// `-copy` suffix, type starts at `Auto` with the source's mount list
    /// parsed from its persisted config.
    pub fn duplicate_defaults(source: &Environment, settings: &UserSettings) -> Self {
        let comfyui_path = source
            .comfyui_path
            .clone()
            .or_else(|| settings.comfyui_path.clone())
            .unwrap_or_default();
        let existing = Self::source_mounts(source, &comfyui_path);
        let values = EnvironmentFormValues {
            name: format!("{}-copy", source.name),
            comfyui_path,
            image: Some(source.base_image().to_string()),
            command: source
                .command
                .clone()
                .or_else(|| settings.command.clone())
                .unwrap_or_default(),
            port: source
                .options
                .port
                .unwrap_or_else(|| settings.effective_port())
                .to_string(),
            runtime: source
                .options
                .runtime
                .clone()
                .unwrap_or_else(|| settings.effective_runtime()),
            environment_type: EnvironmentType::Auto,
            mount_config: auto_mounts(&existing),
            release: None,
        };
        Self {
            defaults: values.clone(),
            values,
            flow: FlowKind::Duplicate,
            source: Some(source.clone()),
        }
    }

    fn source_mounts(source: &Environment, base_path: &str) -> Vec<Mount> {
        match &source.options.mount_config {
            Some(config) => config.mounts.clone(),
            None => source
                .options
                .extra
                .get("mount_config")
                .map(|raw| parse_existing_mount_config(raw, base_path))
                .unwrap_or_default(),
        }
    }

    /// Flow this form serves
    pub fn flow(&self) -> FlowKind {
        self.flow
    }

    /// Source environment, duplicate flow only
    pub fn source(&self) -> Option<&Environment> {
        self.source.as_ref()
    }

    /// Reset all values back to the dialog's defaults
    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
    }

    /// Change the environment type; the single trigger that replaces the
    /// mount list.
    ///
    /// Presets re-derive from policy. `Auto` re-filters the source mounts.
    /// Switching into `Custom` preserves the current list so a preset's
    /// mounts can be used as a starting point for manual edits.
    pub fn set_environment_type(&mut self, new_type: EnvironmentType) {
        let previous = self.values.environment_type;
        self.values.environment_type = new_type;

        match new_type {
            EnvironmentType::Custom => {
                debug!(
                    "Switching {} -> Custom, preserving {} mounts",
                    previous,
                    self.values.mount_config.len()
                );
            }
            EnvironmentType::Auto => {
                let existing = self
                    .source
                    .as_ref()
                    .map(|s| Self::source_mounts(s, &self.values.comfyui_path))
                    .unwrap_or_default();
                self.values.mount_config = auto_mounts(&existing);
            }
            _ => {
                self.values.mount_config =
                    default_mounts(new_type, &self.values.comfyui_path);
            }
        }
    }

    /// Manual edit of the mount list flips the type to `Custom`.
    ///
    /// Every entry must satisfy [`Mount::validate`]; the list is replaced
    /// only when all entries pass.
    pub fn set_mounts(&mut self, mounts: Vec<Mount>) -> Result<()> {
        for mount in &mounts {
            mount.validate()?;
        }
        self.values.mount_config = mounts;
        self.values.environment_type = EnvironmentType::Custom;
        Ok(())
    }

    /// Change the base path and re-derive the mount list.
    ///
    /// Preset types regenerate wholesale; `Custom` and `Auto` keep the list
    /// and only recompute non-pinned host paths.
    pub fn set_comfyui_path(&mut self, path: impl Into<String>) {
        self.values.comfyui_path = path.into();
        match self.values.environment_type {
            EnvironmentType::Custom | EnvironmentType::Auto => {
                recompute_host_paths(&mut self.values.mount_config, &self.values.comfyui_path);
            }
            ty => {
                self.values.mount_config = default_mounts(ty, &self.values.comfyui_path);
            }
        }
    }

    /// Validate and serialize into the submit payload.
    ///
    /// `image` must be resolved by the caller for flows that synthesize a tag
    /// from the release selector; here an empty create-flow image is a
    /// validation error.
    pub fn build_input(&self, image: String) -> Result<EnvironmentInput> {
        if image.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "Docker image is required".to_string(),
            }
            .into());
        }
        let values = &self.values;
        Ok(EnvironmentInput {
            name: values.name.trim().to_string(),
            image,
            command: if values.command.trim().is_empty() {
                None
            } else {
                Some(values.command.clone())
            },
            comfyui_path: Some(values.comfyui_path.clone()),
            options: EnvironmentOptions {
                port: values.parsed_port(),
                runtime: Some(values.runtime.clone()),
                mount_config: Some(MountConfig {
                    mounts: values.mount_config.clone(),
                }),
                comfyui_release: values.release.clone(),
                extra: serde_json::Map::new(),
            },
            folder_ids: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MountAction;
    use serde_json::json;

    fn settings() -> UserSettings {
        UserSettings {
            comfyui_path: Some("/opt/comfy".to_string()),
            port: Some(8188),
            runtime: Some("nvidia".to_string()),
            command: None,
            folders: Vec::new(),
            max_deleted_environments: None,
        }
    }

    fn source_env() -> Environment {
        Environment {
            id: Some("env-1".to_string()),
            name: "main".to_string(),
            image: "akatzai/comfyui-env:v0.3.15".to_string(),
            comfyui_path: Some("/opt/comfy".to_string()),
            options: EnvironmentOptions {
                port: Some(8189),
                runtime: Some("none".to_string()),
                mount_config: Some(MountConfig {
                    mounts: default_mounts(EnvironmentType::DefaultPlusBoth, "/opt/comfy"),
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_create_defaults_derive_default_mounts() {
        let form = EnvironmentForm::create_defaults(&settings());
        assert_eq!(form.values.environment_type, EnvironmentType::Default);
        assert_eq!(form.values.mount_config.len(), 3);
        assert_eq!(form.values.port, "8188");
        assert_eq!(form.values.runtime, "nvidia");
        assert_eq!(form.values.comfyui_path, "/opt/comfy");
    }

    #[test]
    fn test_duplicate_defaults_start_auto_without_copies() {
        let form = EnvironmentForm::duplicate_defaults(&source_env(), &settings());
        assert_eq!(form.values.environment_type, EnvironmentType::Auto);
        assert_eq!(form.values.name, "main-copy");
        assert_eq!(form.values.port, "8189");
        assert_eq!(form.values.runtime, "none");
        // DefaultPlusBoth has 5 entries, the custom_nodes copy is dropped
        assert_eq!(form.values.mount_config.len(), 4);
        assert!(form
            .values
            .mount_config
            .iter()
            .all(|m| m.action == MountAction::Mount));
    }

    #[test]
    fn test_duplicate_defaults_read_legacy_mount_config() {
        let mut source = source_env();
        source.options.mount_config = None;
        source.options.extra.insert(
            "mount_config".to_string(),
            json!({"models": "mount", "custom_nodes": "copy"}),
        );
        let form = EnvironmentForm::duplicate_defaults(&source, &settings());
        assert_eq!(form.values.mount_config.len(), 1);
        assert_eq!(form.values.mount_config[0].container_path, "/app/ComfyUI/models");
    }

    #[test]
    fn test_validate_required_fields() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.values.name = String::new();
        form.values.comfyui_path = String::new();
        let errors = form.values.validate(FlowKind::Create).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"comfyui_path"));
        assert!(fields.contains(&"image"));
    }

    #[test]
    fn test_validate_name_length() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.values.name = "x".repeat(MAX_NAME_LEN + 1);
        form.values.image = Some("img:latest".to_string());
        let errors = form.values.validate(FlowKind::Create).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_validate_image_optional_in_duplicate() {
        let mut form = EnvironmentForm::duplicate_defaults(&source_env(), &settings());
        form.values.image = None;
        assert!(form.values.validate(FlowKind::Duplicate).is_ok());
    }

    #[test]
    fn test_validate_release_satisfies_image_requirement() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.values.name = "env".to_string();
        form.values.image = None;
        form.values.release = Some("latest".to_string());
        assert!(form.values.validate(FlowKind::Create).is_ok());
    }

    #[test]
    fn test_validate_port() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.values.name = "env".to_string();
        form.values.image = Some("img:latest".to_string());

        form.values.port = "0".to_string();
        assert!(form.values.validate(FlowKind::Create).is_err());

        form.values.port = "70000".to_string();
        assert!(form.values.validate(FlowKind::Create).is_err());

        form.values.port = "8188".to_string();
        assert!(form.values.validate(FlowKind::Create).is_ok());

        // Empty port falls back to defaults downstream
        form.values.port = String::new();
        assert!(form.values.validate(FlowKind::Create).is_ok());
    }

    #[test]
    fn test_type_change_regenerates_presets() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.set_environment_type(EnvironmentType::DefaultPlusBoth);
        assert_eq!(form.values.mount_config.len(), 5);
        form.set_environment_type(EnvironmentType::Isolated);
        assert!(form.values.mount_config.is_empty());
    }

    #[test]
    fn test_switch_to_custom_preserves_mounts() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        assert_eq!(form.values.mount_config.len(), 3);
        form.set_environment_type(EnvironmentType::Custom);
        assert_eq!(form.values.environment_type, EnvironmentType::Custom);
        assert_eq!(form.values.mount_config.len(), 3);
    }

    #[test]
    fn test_path_change_regenerates_preset_mounts() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.set_comfyui_path("/new/base");
        assert!(form
            .values
            .mount_config
            .iter()
            .all(|m| m.host_path.starts_with("/new/base/")));
    }

    #[test]
    fn test_path_change_in_custom_respects_pinned() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.set_environment_type(EnvironmentType::Custom);
        form.values.mount_config[1].pinned = true;
        form.values.mount_config[1].host_path = "/pinned/output".to_string();

        form.set_comfyui_path("/new/base");

        assert_eq!(form.values.mount_config[0].host_path, "/new/base/models");
        assert_eq!(form.values.mount_config[1].host_path, "/pinned/output");
        assert_eq!(form.values.mount_config[2].host_path, "/new/base/input");
    }

    #[test]
    fn test_manual_mount_edit_flips_to_custom() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        let mut mounts = form.values.mount_config.clone();
        mounts.pop();
        form.set_mounts(mounts).unwrap();
        assert_eq!(form.values.environment_type, EnvironmentType::Custom);
        assert_eq!(form.values.mount_config.len(), 2);
    }

    #[test]
    fn test_set_mounts_rejects_out_of_root_entries() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        let mut mounts = form.values.mount_config.clone();
        mounts[0].container_path = "/etc/models".to_string();
        assert!(form.set_mounts(mounts).is_err());
        // The list and type are untouched on rejection
        assert_eq!(form.values.environment_type, EnvironmentType::Default);
        assert_eq!(form.values.mount_config.len(), 3);
    }

    #[test]
    fn test_validate_name_length_counts_characters_not_bytes() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.values.image = Some("img:latest".to_string());

        // 100 two-byte characters exceed 128 bytes but not 128 characters
        form.values.name = "é".repeat(100);
        assert!(form.values.validate(FlowKind::Create).is_ok());

        form.values.name = "é".repeat(MAX_NAME_LEN + 1);
        let errors = form.values.validate(FlowKind::Create).unwrap_err();
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_build_input_serializes_once() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        form.values.name = "  my-env  ".to_string();
        form.values.command = "--listen 0.0.0.0".to_string();
        let input = form.build_input("akatzai/comfyui-env:latest".to_string()).unwrap();
        assert_eq!(input.name, "my-env");
        assert_eq!(input.command.as_deref(), Some("--listen 0.0.0.0"));
        assert_eq!(input.options.port, Some(8188));
        assert_eq!(
            input.options.mount_config.as_ref().unwrap().mounts.len(),
            3
        );
    }

    #[test]
    fn test_build_input_requires_image() {
        let form = EnvironmentForm::create_defaults(&settings());
        assert!(form.build_input(String::new()).is_err());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut form = EnvironmentForm::create_defaults(&settings());
        let defaults = form.values.clone();
        form.values.name = "changed".to_string();
        form.set_environment_type(EnvironmentType::Isolated);
        form.reset();
        assert_eq!(form.values, defaults);
    }
}
