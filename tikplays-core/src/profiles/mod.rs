//! Filesystem-backed profile store.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data>/tikplays/profiles.json            {active, list:[{id,name}]}
//! <data>/tikplays/profiles/<id>/*.json     one document per concern
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};

use tikplays_common::error::ProfileError;
use tikplays_common::models::profile::{DEFAULT_PROFILE_ID, DEFAULT_PROFILE_NAME};
use tikplays_common::models::{ProfileBundle, ProfileEntry, ProfileIndex};
use tikplays_common::traits::ProfileStore;

use crate::persistence::{read_document, save_document};

const APP_DIR: &str = "tikplays";
const INDEX_FILE: &str = "profiles.json";
const PROFILES_DIR: &str = "profiles";
pub const DATA_DIR_ENV: &str = "TIKPLAYS_DATA_DIR";

/// `$TIKPLAYS_DATA_DIR`, then the platform data directory, then the
/// current directory.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Lowercases `name` and collapses every run of characters outside
/// `[a-z0-9-]` into a single `-`.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn is_plain_json_name(name: &str) -> bool {
    name.ends_with(".json") && !name.contains(['/', '\\']) && !name.starts_with('.')
}

fn millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct FsProfileStore {
    root: PathBuf,
    index: Mutex<ProfileIndex>,
}

impl FsProfileStore {
    /// Opens (or initializes) the store under `data_dir/tikplays`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let root = data_dir.as_ref().join(APP_DIR);
        fs::create_dir_all(root.join(PROFILES_DIR)).map_err(|e| ProfileError::Io(e.to_string()))?;

        let index = read_document(&root.join(INDEX_FILE))
            .and_then(|v| serde_json::from_value::<ProfileIndex>(v).ok())
            .map(Self::repair_index)
            .unwrap_or_default();

        let store = Self {
            root,
            index: Mutex::new(index),
        };
        store.save_index(&store.index.lock());
        info!("Profile store opened at {} (active='{}')", store.root.display(), store.active_id());
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repair_index(mut index: ProfileIndex) -> ProfileIndex {
        index.list.retain(|p| is_valid_id(&p.id));
        if !index.contains(DEFAULT_PROFILE_ID) {
            index.list.insert(
                0,
                ProfileEntry {
                    id: DEFAULT_PROFILE_ID.to_string(),
                    name: DEFAULT_PROFILE_NAME.to_string(),
                },
            );
        }
        if !index.contains(&index.active) {
            index.active = DEFAULT_PROFILE_ID.to_string();
        }
        index
    }

    fn profile_dir(&self, id: &str) -> PathBuf {
        self.root.join(PROFILES_DIR).join(id)
    }

    fn save_index(&self, index: &ProfileIndex) {
        save_document(&self.root.join(INDEX_FILE), index);
    }

    fn ensure_dir(&self, id: &str) -> Result<PathBuf, ProfileError> {
        let dir = self.profile_dir(id);
        fs::create_dir_all(&dir).map_err(|e| ProfileError::Io(e.to_string()))?;
        Ok(dir)
    }

    fn existing(index: &ProfileIndex, id: &str) -> Result<(), ProfileError> {
        if !is_valid_id(id) {
            return Err(ProfileError::InvalidId(id.to_string()));
        }
        if !index.contains(id) {
            return Err(ProfileError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl ProfileStore for FsProfileStore {
    fn active_id(&self) -> String {
        self.index.lock().active.clone()
    }

    fn resolve_path(&self, filename: &str) -> PathBuf {
        let active = self.active_id();
        let dir = self.profile_dir(&active);
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Could not create profile dir {}: {}", dir.display(), e);
        }
        dir.join(filename)
    }

    fn list(&self) -> ProfileIndex {
        self.index.lock().clone()
    }

    fn create(&self, name: &str) -> Result<ProfileEntry, ProfileError> {
        let mut index = self.index.lock();
        let mut id = slugify(name);
        if id.is_empty() {
            id = format!("p-{}", millis());
        }
        if index.contains(&id) {
            return Err(ProfileError::IdExists(id));
        }
        let name = match name.trim() {
            "" => id.clone(),
            n => n.to_string(),
        };
        self.ensure_dir(&id)?;
        let entry = ProfileEntry { id, name };
        index.list.push(entry.clone());
        self.save_index(&index);
        info!("Created profile '{}'", entry.id);
        Ok(entry)
    }

    fn rename(&self, id: &str, name: &str) -> Result<ProfileEntry, ProfileError> {
        let mut index = self.index.lock();
        Self::existing(&index, id)?;
        let entry = index
            .list
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        let name = name.trim();
        entry.name = if name.is_empty() { id.to_string() } else { name.to_string() };
        let entry = entry.clone();
        self.save_index(&index);
        Ok(entry)
    }

    fn switch(&self, id: &str) -> Result<ProfileIndex, ProfileError> {
        let mut index = self.index.lock();
        Self::existing(&index, id)?;
        self.ensure_dir(id)?;
        index.active = id.to_string();
        self.save_index(&index);
        info!("Switched active profile to '{}'", id);
        Ok(index.clone())
    }

    fn delete(&self, id: &str) -> Result<ProfileIndex, ProfileError> {
        if id == DEFAULT_PROFILE_ID {
            return Err(ProfileError::CantDeleteDefault);
        }
        let mut index = self.index.lock();
        Self::existing(&index, id)?;
        index.list.retain(|p| p.id != id);
        if index.active == id {
            index.active = DEFAULT_PROFILE_ID.to_string();
        }
        self.save_index(&index);
        info!("Deleted profile '{}' (files kept on disk)", id);
        Ok(index.clone())
    }

    fn export(&self, id: &str) -> Result<ProfileBundle, ProfileError> {
        let index = self.index.lock();
        Self::existing(&index, id)?;
        let meta = index.list.iter().find(|p| p.id == id).cloned();
        drop(index);

        let mut data = BTreeMap::new();
        let dir = self.profile_dir(id);
        if dir.is_dir() {
            let entries = fs::read_dir(&dir).map_err(|e| ProfileError::Io(e.to_string()))?;
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if !is_plain_json_name(&name) {
                    continue;
                }
                let doc = read_document(&entry.path()).unwrap_or(Value::Null);
                data.insert(name, doc);
            }
        }

        Ok(ProfileBundle {
            id: Some(id.to_string()),
            meta,
            data,
        })
    }

    fn import(&self, bundle: ProfileBundle) -> Result<ProfileEntry, ProfileError> {
        let id = bundle
            .id
            .or_else(|| bundle.meta.as_ref().map(|m| m.id.clone()))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("imp-{}", millis()));
        if !is_valid_id(&id) {
            return Err(ProfileError::InvalidId(id));
        }

        let mut index = self.index.lock();
        if index.contains(&id) {
            return Err(ProfileError::IdExists(id));
        }
        let name = bundle
            .meta
            .map(|m| m.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        let dir = self.ensure_dir(&id)?;
        for (file, doc) in &bundle.data {
            if !is_plain_json_name(file) {
                warn!("Import '{}': skipping suspicious file name '{}'", id, file);
                continue;
            }
            save_document(&dir.join(file), doc);
        }

        let entry = ProfileEntry { id, name };
        index.list.push(entry.clone());
        self.save_index(&index);
        info!("Imported profile '{}' ({} documents)", entry.id, bundle.data.len());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsProfileStore) {
        let dir = TempDir::new().unwrap();
        let store = FsProfileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("  Mi Perfil!! 2 "), "mi-perfil-2");
        assert_eq!(slugify("--Stream--"), "stream");
        assert_eq!(slugify("¡¡!!"), "");
    }

    #[test]
    fn fresh_store_has_default_profile() {
        let (_dir, store) = store();
        let index = store.list();
        assert_eq!(index.active, DEFAULT_PROFILE_ID);
        assert_eq!(index.list.len(), 1);
        assert!(store.resolve_path("wins.json").ends_with("profiles/default/wins.json"));
    }

    #[test]
    fn create_switch_and_resolve() {
        let (_dir, store) = store();
        let entry = store.create("Fin de Semana").unwrap();
        assert_eq!(entry.id, "fin-de-semana");
        assert_eq!(store.create("fin de semana"), Err(ProfileError::IdExists("fin-de-semana".into())));

        store.switch("fin-de-semana").unwrap();
        assert_eq!(store.active_id(), "fin-de-semana");
        assert!(store.resolve_path("wins.json").ends_with("profiles/fin-de-semana/wins.json"));
    }

    #[test]
    fn create_with_unusable_name_gets_generated_id() {
        let (_dir, store) = store();
        let entry = store.create("***").unwrap();
        assert!(entry.id.starts_with("p-"));
        assert_eq!(entry.name, "***");
    }

    #[test]
    fn errors_carry_codes() {
        let (_dir, store) = store();
        assert_eq!(store.switch("ghost").unwrap_err().code(), "PROFILE_NOT_FOUND");
        assert_eq!(store.delete(DEFAULT_PROFILE_ID).unwrap_err().code(), "CANT_DELETE_DEFAULT");
        assert_eq!(store.switch("../etc").unwrap_err().code(), "INVALID_PROFILE_ID");
    }

    #[test]
    fn deleting_active_falls_back_to_default() {
        let (_dir, store) = store();
        store.create("b").unwrap();
        store.switch("b").unwrap();
        let index = store.delete("b").unwrap();
        assert_eq!(index.active, DEFAULT_PROFILE_ID);
        assert!(!index.contains("b"));
    }

    #[test]
    fn index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FsProfileStore::open(dir.path()).unwrap();
            store.create("b").unwrap();
            store.switch("b").unwrap();
        }
        let store = FsProfileStore::open(dir.path()).unwrap();
        assert_eq!(store.active_id(), "b");
    }

    #[test]
    fn export_then_import_copies_documents() {
        let (_dir, store) = store();
        save_document(&store.resolve_path("wins.json"), &json!({"wins": 4}));

        let mut bundle = store.export(DEFAULT_PROFILE_ID).unwrap();
        assert_eq!(bundle.data.get("wins.json"), Some(&json!({"wins": 4})));

        bundle.id = Some("copy".into());
        bundle.meta = Some(ProfileEntry { id: "copy".into(), name: "Copia".into() });
        bundle.data.insert("../escape.json".into(), json!({}));
        let entry = store.import(bundle).unwrap();
        assert_eq!(entry.name, "Copia");

        store.switch("copy").unwrap();
        assert_eq!(read_document(&store.resolve_path("wins.json")), Some(json!({"wins": 4})));
        assert!(!store.root().join("profiles").join("escape.json").exists());
    }
}
