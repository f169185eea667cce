//! Flat per-document JSON persistence.
//!
//! Reads never fail: a missing, empty or malformed document yields `None`
//! and the caller falls back to defaults. Writes overwrite the whole
//! document; failures are logged and swallowed, in-memory state stays
//! authoritative.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const RULES_FILE: &str = "webhooks.json";
pub const COUNTDOWN_FILE: &str = "countdown.json";
pub const BATTLE_FILE: &str = "giftBattleState.json";
pub const COIN_BOARD_FILE: &str = "coinBoard.json";
pub const WINS_FILE: &str = "wins.json";
pub const GOALS_FILE: &str = "goals.json";
pub const TOP_GIFT_FILE: &str = "topGift.json";
pub const GIFT_CATALOG_FILE: &str = "giftCatalog.json";
pub const PREFS_FILE: &str = "prefs.json";

pub fn read_document(path: &Path) -> Option<Value> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("persistence: {} not readable ({}), using defaults", path.display(), e);
            return None;
        }
    };
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&text) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("persistence: {} is not valid JSON ({}), using defaults", path.display(), e);
            None
        }
    }
}

/// Loads a document through its sanitizer; absent documents parse as `{}`
/// so every field takes its default.
pub fn load_with<T>(path: &Path, parse: impl FnOnce(&Value) -> T) -> T {
    let raw = read_document(path).unwrap_or_else(|| Value::Object(Default::default()));
    parse(&raw)
}

pub fn save_document<T: Serialize + ?Sized>(path: &Path, doc: &T) {
    if let Err(e) = try_save(path, doc) {
        warn!("persistence: failed to write {}: {}", path.display(), e);
    }
}

fn try_save<T: Serialize + ?Sized>(path: &Path, doc: &T) -> Result<(), crate::Error> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let text = serde_json::to_string_pretty(doc)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_and_malformed_documents_read_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("countdown.json");
        assert!(read_document(&path).is_none());

        fs::write(&path, "   ").unwrap();
        assert!(read_document(&path).is_none());

        fs::write(&path, "{not json").unwrap();
        assert!(read_document(&path).is_none());
    }

    #[test]
    fn save_creates_parent_dirs_and_pretty_prints() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("wins.json");
        save_document(&path, &json!({"wins": 3}));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(read_document(&path), Some(json!({"wins": 3})));
    }

    #[test]
    fn load_with_feeds_empty_object_when_absent() {
        let dir = TempDir::new().unwrap();
        let seen = load_with(&dir.path().join("nope.json"), |v| v.clone());
        assert_eq!(seen, json!({}));
    }
}
