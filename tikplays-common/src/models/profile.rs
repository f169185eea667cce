use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PROFILE_ID: &str = "default";
pub const DEFAULT_PROFILE_NAME: &str = "Perfil principal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub id: String,
    pub name: String,
}

/// Profile index (`profiles.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileIndex {
    pub active: String,
    #[serde(default)]
    pub list: Vec<ProfileEntry>,
}

impl Default for ProfileIndex {
    fn default() -> Self {
        Self {
            active: DEFAULT_PROFILE_ID.to_string(),
            list: vec![ProfileEntry {
                id: DEFAULT_PROFILE_ID.to_string(),
                name: DEFAULT_PROFILE_NAME.to_string(),
            }],
        }
    }
}

impl ProfileIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.list.iter().any(|p| p.id == id)
    }
}

/// Portable copy of a profile: every JSON document in its directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileBundle {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub meta: Option<ProfileEntry>,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}
