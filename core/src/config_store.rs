//! On-disk registry of stored UI configs.
//!
//! Layout under the root directory:
//!
//! ```text
//! registry.json            {"<user_id>": {"<config_id>": "<user_id>/<config_id>.json"}}
//! <user_id>/<config_id>.json
//! ```
//!
//! IDs are per user and never reused while a higher ID exists. Every path read
//! back from `registry.json` is checked to stay under the root, since the file
//! may be edited by hand.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ConfigStoreError;

const REGISTRY_FILE: &str = "registry.json";

static USER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("user id regex is valid"));

/// One widget slot in a stored screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WidgetSpec {
    /// Display name; defaults to the function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub function_name: String,
    /// Position on screen, ascending; ties keep insertion order
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output: Option<String>,
    #[serde(default)]
    pub backend_output: serde_json::Value,
}

/// A stored screen: an ordered set of widgets built together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UiConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub widgets: Vec<WidgetSpec>,
}

impl UiConfig {
    pub fn validate(&self) -> Result<(), ConfigStoreError> {
        if self.name.trim().is_empty() {
            return Err(ConfigStoreError::Invalid("name is empty".to_string()));
        }
        if self.widgets.is_empty() {
            return Err(ConfigStoreError::Invalid(
                "config has no widgets".to_string(),
            ));
        }
        if let Some(index) = self
            .widgets
            .iter()
            .position(|w| w.function_name.trim().is_empty())
        {
            return Err(ConfigStoreError::Invalid(format!(
                "widgets[{index}].function_name is empty"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConfigRecord {
    pub id: u64,
    pub user_id: String,
    pub name: String,
    /// Path relative to the config root
    pub path: String,
    pub widget_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Stored body: the config plus bookkeeping.
#[derive(Debug, Serialize, Deserialize)]
struct StoredConfig {
    updated_at: DateTime<Utc>,
    config: UiConfig,
}

type Registry = BTreeMap<String, BTreeMap<u64, String>>;

pub struct ConfigRegistry {
    root: PathBuf,
    registry: Registry,
}

pub fn validate_user_id(user_id: &str) -> Result<(), ConfigStoreError> {
    if USER_ID.is_match(user_id) {
        Ok(())
    } else {
        Err(ConfigStoreError::InvalidUser(user_id.to_string()))
    }
}

/// Reject absolute paths and any `..`, root or prefix component.
fn check_relative(path: &str) -> Result<(), ConfigStoreError> {
    let candidate = Path::new(path);
    let safe = !path.is_empty()
        && candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(())
    } else {
        Err(ConfigStoreError::UnsafePath(path.to_string()))
    }
}

impl ConfigRegistry {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ConfigStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let registry_path = root.join(REGISTRY_FILE);
        let registry: Registry = match std::fs::read_to_string(&registry_path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Registry::new(),
            Err(e) => return Err(e.into()),
        };

        let configs: usize = registry.values().map(BTreeMap::len).sum();
        tracing::info!(root = %root.display(), users = registry.len(), configs, "config registry opened");

        Ok(Self { root, registry })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create(
        &mut self,
        user_id: &str,
        config: UiConfig,
    ) -> Result<ConfigRecord, ConfigStoreError> {
        validate_user_id(user_id)?;
        config.validate()?;

        let id = self
            .registry
            .get(user_id)
            .and_then(|entries| entries.keys().next_back())
            .map_or(1, |max| max + 1);
        let relative = format!("{user_id}/{id}.json");

        let record = self.write_body(user_id, id, &relative, config)?;
        let mut next = self.registry.clone();
        next.entry(user_id.to_string())
            .or_default()
            .insert(id, relative);
        if let Err(e) = self.persist(&next) {
            std::fs::remove_file(self.root.join(&record.path)).ok();
            return Err(e);
        }
        self.registry = next;

        tracing::info!(user_id, config_id = id, "config created");
        Ok(record)
    }

    pub fn get(&self, user_id: &str, id: u64) -> Result<UiConfig, ConfigStoreError> {
        Ok(self.read_body(user_id, id)?.config)
    }

    pub fn record(&self, user_id: &str, id: u64) -> Result<ConfigRecord, ConfigStoreError> {
        let stored = self.read_body(user_id, id)?;
        let relative = self.relative_path(user_id, id)?;
        Ok(ConfigRecord {
            id,
            user_id: user_id.to_string(),
            name: stored.config.name,
            path: relative.to_string(),
            widget_count: stored.config.widgets.len(),
            updated_at: stored.updated_at,
        })
    }

    /// Records for a user in ascending ID order. Unreadable entries are skipped.
    pub fn list(&self, user_id: &str) -> Result<Vec<ConfigRecord>, ConfigStoreError> {
        validate_user_id(user_id)?;
        let Some(entries) = self.registry.get(user_id) else {
            return Ok(Vec::new());
        };

        let mut records = Vec::with_capacity(entries.len());
        for id in entries.keys() {
            match self.record(user_id, *id) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(user_id, config_id = id, error = %e, "skipping unreadable config");
                }
            }
        }
        Ok(records)
    }

    pub fn update(
        &mut self,
        user_id: &str,
        id: u64,
        config: UiConfig,
    ) -> Result<ConfigRecord, ConfigStoreError> {
        config.validate()?;
        let relative = self.relative_path(user_id, id)?.to_string();
        let record = self.write_body(user_id, id, &relative, config)?;
        tracing::info!(user_id, config_id = id, "config updated");
        Ok(record)
    }

    /// The registry entry goes first, so a failed write leaves the config intact.
    pub fn delete(&mut self, user_id: &str, id: u64) -> Result<(), ConfigStoreError> {
        let path = self.resolve(user_id, id)?;

        let mut next = self.registry.clone();
        if let Some(entries) = next.get_mut(user_id) {
            entries.remove(&id);
            if entries.is_empty() {
                next.remove(user_id);
            }
        }
        self.persist(&next)?;
        self.registry = next;

        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(user_id, config_id = id, "config file already gone");
            }
            Err(e) => {
                tracing::warn!(user_id, config_id = id, error = %e, "config unregistered but file left behind");
            }
        }

        tracing::info!(user_id, config_id = id, "config deleted");
        Ok(())
    }

    fn relative_path(&self, user_id: &str, id: u64) -> Result<&str, ConfigStoreError> {
        validate_user_id(user_id)?;
        self.registry
            .get(user_id)
            .and_then(|entries| entries.get(&id))
            .map(String::as_str)
            .ok_or_else(|| ConfigStoreError::NotFound {
                user_id: user_id.to_string(),
                id,
            })
    }

    /// Absolute path of a registered config, verified to stay under the root.
    fn resolve(&self, user_id: &str, id: u64) -> Result<PathBuf, ConfigStoreError> {
        let relative = self.relative_path(user_id, id)?;
        self.checked_path(relative)
    }

    fn checked_path(&self, relative: &str) -> Result<PathBuf, ConfigStoreError> {
        check_relative(relative)?;
        let path = self.root.join(relative);

        // Symlinks inside the root could still point elsewhere.
        if let (Ok(real_root), Ok(real_path)) = (self.root.canonicalize(), path.canonicalize()) {
            if !real_path.starts_with(&real_root) {
                return Err(ConfigStoreError::UnsafePath(relative.to_string()));
            }
        }
        Ok(path)
    }

    fn read_body(&self, user_id: &str, id: u64) -> Result<StoredConfig, ConfigStoreError> {
        let path = self.resolve(user_id, id)?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigStoreError::NotFound {
                    user_id: user_id.to_string(),
                    id,
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_body(
        &self,
        user_id: &str,
        id: u64,
        relative: &str,
        config: UiConfig,
    ) -> Result<ConfigRecord, ConfigStoreError> {
        let path = self.checked_path(relative)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let stored = StoredConfig {
            updated_at: Utc::now(),
            config,
        };
        write_atomic(&path, &serde_json::to_vec_pretty(&stored)?)?;

        Ok(ConfigRecord {
            id,
            user_id: user_id.to_string(),
            name: stored.config.name,
            path: relative.to_string(),
            widget_count: stored.config.widgets.len(),
            updated_at: stored.updated_at,
        })
    }

    fn persist(&self, registry: &Registry) -> Result<(), ConfigStoreError> {
        let raw = serde_json::to_vec_pretty(registry)?;
        write_atomic(&self.root.join(REGISTRY_FILE), &raw)
    }
}

/// Write to a synced sibling temp file, then rename over the target.
/// The temp file is removed when either step fails.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConfigStoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = write_synced(&tmp, contents).and_then(|()| std::fs::rename(&tmp, path));
    if let Err(e) = written {
        std::fs::remove_file(&tmp).ok();
        return Err(e.into());
    }
    Ok(())
}

fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn sample(name: &str) -> UiConfig {
        UiConfig {
            name: name.to_string(),
            description: None,
            widgets: vec![WidgetSpec {
                name: None,
                function_name: "notification".to_string(),
                order: 0,
                llm_output: None,
                backend_output: json!({"title": "Hi", "message": "there"}),
            }],
        }
    }

    #[test]
    fn ids_are_sequential_per_user() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        let mut store = ConfigRegistry::open(&root).expect("open");

        let a = store.create("alice", sample("a")).expect("create a");
        let b = store.create("alice", sample("b")).expect("create b");
        let c = store.create("bob", sample("c")).expect("create c");
        assert_eq!((a.id, b.id, c.id), (1, 2, 1));
        assert_eq!(a.path, "alice/1.json");

        let listed: Vec<u64> = store
            .list("alice")
            .expect("list")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, vec![1, 2]);
    }

    #[test]
    fn registry_survives_reopen() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        {
            let mut store = ConfigRegistry::open(&root).expect("open");
            store.create("alice", sample("screen")).expect("create");
        }
        let store = ConfigRegistry::open(&root).expect("reopen");
        let config = store.get("alice", 1).expect("get");
        assert_eq!(config.name, "screen");
        assert_eq!(config.widgets[0].function_name, "notification");
    }

    #[test]
    fn update_replaces_body_and_keeps_id() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        let mut store = ConfigRegistry::open(&root).expect("open");
        store.create("alice", sample("v1")).expect("create");

        let record = store.update("alice", 1, sample("v2")).expect("update");
        assert_eq!(record.id, 1);
        assert_eq!(store.get("alice", 1).expect("get").name, "v2");

        let err = store
            .update("alice", 9, sample("v3"))
            .expect_err("unknown id must fail");
        assert!(matches!(err, ConfigStoreError::NotFound { id: 9, .. }));
    }

    #[test]
    fn delete_removes_file_and_entry() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        let mut store = ConfigRegistry::open(&root).expect("open");
        store.create("alice", sample("x")).expect("create");
        store.delete("alice", 1).expect("delete");

        assert!(!root.join("alice/1.json").exists());
        assert!(matches!(
            store.get("alice", 1),
            Err(ConfigStoreError::NotFound { .. })
        ));
        assert!(store.list("alice").expect("list").is_empty());

        // The next ID starts over once the user has no configs left.
        let again = store.create("alice", sample("y")).expect("create again");
        assert_eq!(again.id, 1);
    }

    #[test]
    fn invalid_user_ids_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        let mut store = ConfigRegistry::open(&root).expect("open");
        for user in ["../etc", "a/b", "", "with space"] {
            assert!(matches!(
                store.create(user, sample("x")),
                Err(ConfigStoreError::InvalidUser(_))
            ));
        }
    }

    #[test]
    fn tampered_registry_paths_are_refused() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        std::fs::create_dir_all(&root).expect("mkdir");
        std::fs::write(
            root.join(REGISTRY_FILE),
            r#"{"alice": {"1": "../../etc/passwd", "2": "/etc/passwd"}}"#,
        )
        .expect("write registry");

        let store = ConfigRegistry::open(&root).expect("open");
        assert!(matches!(
            store.get("alice", 1),
            Err(ConfigStoreError::UnsafePath(_))
        ));
        assert!(matches!(
            store.get("alice", 2),
            Err(ConfigStoreError::UnsafePath(_))
        ));
        assert!(store.list("alice").expect("list").is_empty());
    }

    #[test]
    fn configs_without_widgets_are_invalid() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        let mut store = ConfigRegistry::open(&root).expect("open");
        let mut config = sample("empty");
        config.widgets.clear();
        assert!(matches!(
            store.create("alice", config),
            Err(ConfigStoreError::Invalid(_))
        ));

        let mut config = sample("blank");
        config.widgets[0].function_name = "  ".to_string();
        assert!(matches!(
            store.create("alice", config),
            Err(ConfigStoreError::Invalid(_))
        ));
    }

    /// A directory squatting on the temp path makes every registry write fail.
    fn block_registry_writes(root: &Path) -> PathBuf {
        let blocker = root.join(format!("{REGISTRY_FILE}.tmp"));
        std::fs::create_dir_all(blocker.join("occupied")).expect("create blocker");
        blocker
    }

    #[test]
    fn failed_registry_write_rolls_back_create() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        let mut store = ConfigRegistry::open(&root).expect("open");
        store.create("alice", sample("kept")).expect("create");

        let blocker = block_registry_writes(&root);
        let err = store
            .create("alice", sample("lost"))
            .expect_err("registry write must fail");
        assert!(matches!(err, ConfigStoreError::Io(_)));
        assert!(!root.join("alice/2.json").exists());
        let ids: Vec<u64> = store
            .list("alice")
            .expect("list")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1]);

        std::fs::remove_dir_all(&blocker).expect("remove blocker");
        assert_eq!(store.create("alice", sample("next")).expect("create").id, 2);
        let reopened = ConfigRegistry::open(&root).expect("reopen");
        assert_eq!(reopened.list("alice").expect("list").len(), 2);
    }

    #[test]
    fn failed_registry_write_keeps_deleted_config() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().join("configs");
        let mut store = ConfigRegistry::open(&root).expect("open");
        store.create("alice", sample("x")).expect("create");

        block_registry_writes(&root);
        assert!(store.delete("alice", 1).is_err());
        assert!(root.join("alice/1.json").exists());
        assert_eq!(store.get("alice", 1).expect("still readable").name, "x");

        let reopened = ConfigRegistry::open(&root).expect("reopen");
        assert_eq!(reopened.get("alice", 1).expect("still registered").name, "x");
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let temp = TempDir::new().expect("tempdir");
        let target = temp.path().join("target");
        std::fs::create_dir_all(target.join("inner")).expect("mkdir");

        assert!(write_atomic(&target, b"{}").is_err());
        assert!(!temp.path().join("target.tmp").exists());
    }

    #[test]
    fn check_relative_accepts_only_plain_paths() {
        assert!(check_relative("alice/1.json").is_ok());
        assert!(check_relative("./alice/1.json").is_ok());
        assert!(check_relative("").is_err());
        assert!(check_relative("alice/../../x").is_err());
        assert!(check_relative("/abs").is_err());
    }
}
