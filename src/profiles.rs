//! Connection profiles and the small settings file that remembers them.
//!
//! The provider only ever reads the selected profile at login time;
//! creating and editing profiles belongs to whatever front end sits on
//! top. State lives in a single JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Saved login details for one Ampache server
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub id: u64,
    pub url: String,
    pub login: String,
    pub password: String,
    pub nickname: String,
    /// When false, the password is blanked before the profile is stored
    pub keep_password: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    profiles: Vec<ConnectionProfile>,
    most_recent: Option<u64>,
    /// Last application version the intro splash was shown for
    splash_version: Option<u32>,
}

/// JSON-file-backed store of connection profiles, the most-recent
/// pointer, and the per-version splash flag
pub struct ProfileStore {
    path: PathBuf,
    file: StoreFile,
}

impl ProfileStore {
    /// Open the store at `path`, starting empty when no file exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            StoreFile::default()
        };
        Ok(Self { path, file })
    }

    /// Write the store back to disk, creating parent directories as
    /// needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.file)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a profile, assigning it a fresh id which is also returned.
    pub fn add(&mut self, mut profile: ConnectionProfile) -> u64 {
        self.file.next_id += 1;
        profile.id = self.file.next_id;
        if !profile.keep_password {
            profile.password.clear();
        }
        let id = profile.id;
        self.file.profiles.push(profile);
        id
    }

    /// Replace the stored profile with the same id. Returns false when
    /// no such profile exists.
    pub fn update(&mut self, mut profile: ConnectionProfile) -> bool {
        if !profile.keep_password {
            profile.password.clear();
        }
        match self.file.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(slot) => {
                *slot = profile;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.file.profiles.len();
        self.file.profiles.retain(|p| p.id != id);
        if self.file.most_recent == Some(id) {
            self.file.most_recent = None;
        }
        self.file.profiles.len() != before
    }

    pub fn get(&self, id: u64) -> Option<&ConnectionProfile> {
        self.file.profiles.iter().find(|p| p.id == id)
    }

    /// All profiles, ordered by nickname, then url, then login.
    pub fn list(&self) -> Vec<&ConnectionProfile> {
        let mut profiles: Vec<&ConnectionProfile> = self.file.profiles.iter().collect();
        profiles.sort_by(|a, b| {
            (&a.nickname, &a.url, &a.login).cmp(&(&b.nickname, &b.url, &b.login))
        });
        profiles
    }

    /// The profile the last login used, if it still exists.
    pub fn most_recent(&self) -> Option<&ConnectionProfile> {
        self.file.most_recent.and_then(|id| self.get(id))
    }

    /// Point the most-recent marker at an existing profile.
    pub fn set_most_recent(&mut self, id: u64) -> bool {
        if self.get(id).is_some() {
            self.file.most_recent = Some(id);
            true
        } else {
            false
        }
    }

    /// Whether the intro splash has already been shown for `version`.
    pub fn splash_shown_for(&self, version: u32) -> bool {
        self.file.splash_version >= Some(version)
    }

    pub fn mark_splash_shown(&mut self, version: u32) {
        self.file.splash_version = Some(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(nickname: &str, url: &str, login: &str) -> ConnectionProfile {
        ConnectionProfile {
            id: 0,
            url: url.into(),
            login: login.into(),
            password: "secret".into(),
            nickname: nickname.into(),
            keep_password: true,
        }
    }

    fn open_in(dir: &tempfile::TempDir) -> ProfileStore {
        ProfileStore::open(dir.path().join("profiles.json")).unwrap()
    }

    #[test]
    fn list_orders_by_nickname_then_url_then_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        store.add(profile("b", "http://h2", "u"));
        store.add(profile("a", "http://h9", "u"));
        store.add(profile("a", "http://h1", "z"));
        store.add(profile("a", "http://h1", "a"));

        let order: Vec<(&str, &str, &str)> = store
            .list()
            .iter()
            .map(|p| (p.nickname.as_str(), p.url.as_str(), p.login.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a", "http://h1", "a"),
                ("a", "http://h1", "z"),
                ("a", "http://h9", "u"),
                ("b", "http://h2", "u"),
            ]
        );
    }

    #[test]
    fn passwords_are_blanked_unless_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        let mut forgetful = profile("n", "http://h", "u");
        forgetful.keep_password = false;
        let id = store.add(forgetful);

        assert_eq!(store.get(id).unwrap().password, "");
    }

    #[test]
    fn round_trip_preserves_pointer_and_splash_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        let mut store = ProfileStore::open(&path).unwrap();
        let id = store.add(profile("home", "http://h/amp", "me"));
        assert!(store.set_most_recent(id));
        store.mark_splash_shown(7);
        store.save().unwrap();

        let reloaded = ProfileStore::open(&path).unwrap();
        assert_eq!(reloaded.most_recent().unwrap().nickname, "home");
        assert_eq!(reloaded.most_recent().unwrap().password, "secret");
        assert!(reloaded.splash_shown_for(7));
        assert!(reloaded.splash_shown_for(6));
        assert!(!reloaded.splash_shown_for(8));
    }

    #[test]
    fn removing_the_most_recent_profile_clears_the_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        let id = store.add(profile("n", "http://h", "u"));
        store.set_most_recent(id);

        assert!(store.remove(id));
        assert!(store.most_recent().is_none());
        assert!(!store.remove(id));
    }

    #[test]
    fn update_replaces_only_matching_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(&dir);
        let id = store.add(profile("old", "http://h", "u"));

        let mut changed = store.get(id).unwrap().clone();
        changed.nickname = "new".into();
        assert!(store.update(changed));
        assert_eq!(store.get(id).unwrap().nickname, "new");

        let mut missing = profile("x", "http://h", "u");
        missing.id = 999;
        assert!(!store.update(missing));
    }
}
