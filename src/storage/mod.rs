use crate::models::Profile;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Profile with name \"{0}\" not found")]
    NotFound(String),

    #[error("Profile with name \"{0}\" already exists")]
    AlreadyExists(String),

    #[error("Profile name is required")]
    MissingName,

    #[error("Profile name mismatch: \"{path}\" vs \"{body}\"")]
    NameMismatch { path: String, body: String },

    #[error("Failed to access profile store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile store {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk layout of profiles.json
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// JSON-file-backed profile store.
///
/// Every read goes to disk, so callers always get a fresh snapshot. Mutations
/// are serialized in-process and replace the file atomically.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default path: ~/.akm/profiles.json
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".akm")
            .join("profiles.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<ProfilesFile, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProfilesFile::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(ProfilesFile::default());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, data: &ProfilesFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(data).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        std::fs::write(&tmp_path, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Run a read-modify-write cycle under the write lock.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<Profile>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut data = self.read()?;
        let out = f(&mut data.profiles)?;
        self.write(&data)?;
        Ok(out)
    }

    pub fn list(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.read()?.profiles)
    }

    pub fn get(&self, name: &str) -> Result<Profile, StoreError> {
        self.read()?
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub fn add(&self, profile: Profile) -> Result<Profile, StoreError> {
        if profile.name.is_empty() {
            return Err(StoreError::MissingName);
        }
        let added = self.mutate(|profiles| {
            if profiles.iter().any(|p| p.name == profile.name) {
                return Err(StoreError::AlreadyExists(profile.name.clone()));
            }
            profiles.push(profile.clone());
            Ok(profile)
        })?;
        tracing::info!("Added profile '{}'", added.name);
        Ok(added)
    }

    /// Replace the whole record stored under `name`.
    pub fn update(&self, name: &str, profile: Profile) -> Result<Profile, StoreError> {
        if profile.name != name {
            return Err(StoreError::NameMismatch {
                path: name.to_string(),
                body: profile.name,
            });
        }
        let updated = self.mutate(|profiles| {
            let slot = profiles
                .iter_mut()
                .find(|p| p.name == name)
                .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
            *slot = profile.clone();
            Ok(profile)
        })?;
        tracing::info!("Updated profile '{}'", name);
        Ok(updated)
    }

    pub fn delete(&self, name: &str) -> Result<Profile, StoreError> {
        let deleted = self.mutate(|profiles| {
            let index = profiles
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
            Ok(profiles.remove(index))
        })?;
        tracing::info!("Deleted profile '{}'", name);
        Ok(deleted)
    }
}
