//! Environment record persistence
//!
//! JSON-file store for environment records, used by local (non-server)
//! deployments. Records move to a deleted list instead of disappearing, so a
//! mistaken delete can be restored; the deleted list is pruned to the user's
//! retention limit, oldest first.

use crate::environment::{Environment, EnvironmentInput};
use crate::errors::{EnvironmentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// One persisted record with store bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    /// The environment itself; `id` is always set for stored records
    #[serde(flatten)]
    pub environment: Environment,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Deletion timestamp, present on the deleted list only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    environments: Vec<EnvironmentRecord>,
    #[serde(default)]
    deleted: Vec<EnvironmentRecord>,
}

/// JSON-file environment store
#[derive(Debug)]
pub struct EnvironmentStore {
    path: PathBuf,
    max_deleted: u32,
}

impl EnvironmentStore {
    /// Store backed by `path`, keeping at most `max_deleted` deleted records
    pub fn new<P: AsRef<Path>>(path: P, max_deleted: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_deleted,
        }
    }

    fn load(&self) -> Result<StoreFile> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(EnvironmentError::Io)?;
        let file = serde_json::from_str(&contents).map_err(|e| EnvironmentError::Parsing {
            message: e.to_string(),
        })?;
        Ok(file)
    }

    fn save(&self, file: &StoreFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(EnvironmentError::Io)?;
        }
        let contents =
            serde_json::to_string_pretty(file).map_err(|e| EnvironmentError::Parsing {
                message: e.to_string(),
            })?;
        fs::write(&self.path, contents).map_err(EnvironmentError::Io)?;
        Ok(())
    }

    fn new_id(name: &str) -> String {
        // Short random suffix keeps ids readable in `list` output
        format!("{}-{:08x}", name, fastrand::u32(..))
    }

    /// All live environments, in creation order
    pub fn list(&self) -> Result<Vec<EnvironmentRecord>> {
        Ok(self.load()?.environments)
    }

    /// Look up a live environment by id
    pub fn get(&self, id: &str) -> Result<Environment> {
        self.load()?
            .environments
            .into_iter()
            .map(|r| r.environment)
            .find(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| EnvironmentError::NotFound { id: id.to_string() }.into())
    }

    /// Insert a new record built from a finalized input
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub fn insert(&self, input: &EnvironmentInput) -> Result<Environment> {
        let mut file = self.load()?;

        let environment = Environment {
            id: Some(Self::new_id(&input.name)),
            name: input.name.clone(),
            image: input.image.clone(),
            status: Some("created".to_string()),
            command: input.command.clone(),
            comfyui_path: input.comfyui_path.clone(),
            options: input.options.clone(),
            metadata: {
                let mut metadata = serde_json::Map::new();
                metadata.insert(
                    "base_image".to_string(),
                    serde_json::Value::String(input.image.clone()),
                );
                metadata
            },
            folder_ids: input.folder_ids.clone(),
        };

        file.environments.push(EnvironmentRecord {
            environment: environment.clone(),
            created_at: Utc::now(),
            deleted_at: None,
        });
        self.save(&file)?;
        debug!("Stored environment {:?}", environment.id);
        Ok(environment)
    }

    /// Move a live record to the deleted list, pruning it to the retention
    /// limit (oldest deletions dropped first)
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut file = self.load()?;
        let index = file
            .environments
            .iter()
            .position(|r| r.environment.id.as_deref() == Some(id))
            .ok_or_else(|| EnvironmentError::NotFound { id: id.to_string() })?;

        let mut record = file.environments.remove(index);
        record.deleted_at = Some(Utc::now());
        file.deleted.push(record);

        while file.deleted.len() > self.max_deleted as usize {
            file.deleted.remove(0);
        }
        self.save(&file)
    }

    /// Move a deleted record back to the live list
    #[instrument(skip(self))]
    pub fn restore(&self, id: &str) -> Result<Environment> {
        let mut file = self.load()?;
        let index = file
            .deleted
            .iter()
            .position(|r| r.environment.id.as_deref() == Some(id))
            .ok_or_else(|| EnvironmentError::NotFound { id: id.to_string() })?;

        let mut record = file.deleted.remove(index);
        record.deleted_at = None;
        let environment = record.environment.clone();
        file.environments.push(record);
        self.save(&file)?;
        debug!("Restored environment {:?}", environment.id);
        Ok(environment)
    }

    /// Deleted records still within the retention window
    pub fn deleted(&self) -> Result<Vec<EnvironmentRecord>> {
        Ok(self.load()?.deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input(name: &str) -> EnvironmentInput {
        EnvironmentInput {
            name: name.to_string(),
            image: "akatzai/comfyui-env:latest".to_string(),
            comfyui_path: Some("/opt/comfy".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_assigns_id_and_base_image() {
        let tmp = TempDir::new().unwrap();
        let store = EnvironmentStore::new(tmp.path().join("envs.json"), 10);

        let env = store.insert(&input("my-env")).unwrap();
        let id = env.id.clone().unwrap();
        assert!(id.starts_with("my-env-"));
        assert_eq!(env.base_image(), "akatzai/comfyui-env:latest");

        let loaded = store.get(&id).unwrap();
        assert_eq!(loaded.name, "my-env");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = EnvironmentStore::new(tmp.path().join("envs.json"), 10);
        assert!(store.get("nope").is_err());
    }

    #[test]
    fn test_delete_moves_to_deleted_list() {
        let tmp = TempDir::new().unwrap();
        let store = EnvironmentStore::new(tmp.path().join("envs.json"), 10);
        let env = store.insert(&input("doomed")).unwrap();
        let id = env.id.unwrap();

        store.delete(&id).unwrap();
        assert!(store.get(&id).is_err());
        let deleted = store.deleted().unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].deleted_at.is_some());
    }

    #[test]
    fn test_restore_moves_back_to_live_list() {
        let tmp = TempDir::new().unwrap();
        let store = EnvironmentStore::new(tmp.path().join("envs.json"), 10);
        let env = store.insert(&input("phoenix")).unwrap();
        let id = env.id.unwrap();

        store.delete(&id).unwrap();
        assert!(store.get(&id).is_err());

        let restored = store.restore(&id).unwrap();
        assert_eq!(restored.name, "phoenix");
        assert_eq!(store.get(&id).unwrap().name, "phoenix");
        assert!(store.deleted().unwrap().is_empty());

        // Only deleted records can be restored
        assert!(store.restore(&id).is_err());
    }

    #[test]
    fn test_deleted_list_pruned_to_retention_limit() {
        let tmp = TempDir::new().unwrap();
        let store = EnvironmentStore::new(tmp.path().join("envs.json"), 2);

        for i in 0..4 {
            let env = store.insert(&input(&format!("env-{}", i))).unwrap();
            store.delete(&env.id.unwrap()).unwrap();
        }

        let deleted = store.deleted().unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(deleted[0].environment.name, "env-2");
        assert_eq!(deleted[1].environment.name, "env-3");
    }
}
