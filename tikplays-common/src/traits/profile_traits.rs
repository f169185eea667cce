use std::path::PathBuf;

use crate::error::ProfileError;
use crate::models::{ProfileBundle, ProfileEntry, ProfileIndex};

/// Named, isolated sets of persisted documents; exactly one is active.
///
/// `resolve_path` must be called again after every switch: paths are only
/// valid for the profile that was active when they were resolved.
pub trait ProfileStore: Send + Sync {
    fn active_id(&self) -> String;

    /// Absolute path of `filename` inside the active profile's directory.
    fn resolve_path(&self, filename: &str) -> PathBuf;

    fn list(&self) -> ProfileIndex;
    fn create(&self, name: &str) -> Result<ProfileEntry, ProfileError>;
    fn rename(&self, id: &str, name: &str) -> Result<ProfileEntry, ProfileError>;
    fn switch(&self, id: &str) -> Result<ProfileIndex, ProfileError>;
    fn delete(&self, id: &str) -> Result<ProfileIndex, ProfileError>;
    fn export(&self, id: &str) -> Result<ProfileBundle, ProfileError>;
    fn import(&self, bundle: ProfileBundle) -> Result<ProfileEntry, ProfileError>;
}
