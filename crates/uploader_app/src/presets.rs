//! Named connection presets persisted as RON.
//!
//! The store keeps a default preset name plus a map of presets. Writes go
//! through a temp file in the same directory and are renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use uploader_core::DEFAULT_SSH_PORT;
use uploader_logging::{uploader_info, uploader_warn};

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("no preset named {0:?}")]
    Unknown(String),
    #[error("preset name must not be empty")]
    EmptyName,
    #[error("failed to serialize presets: {0}")]
    Serialize(#[from] ron::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PresetAuth {
    #[default]
    Password,
    Key,
}

/// One saved set of connection settings.
///
/// Passwords are only present when the user asked to store them.
/// Key passphrases are never stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub auth: PresetAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
    #[serde(default)]
    pub remote_dir: String,
}

impl std::fmt::Debug for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preset")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("auth", &self.auth)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_path", &self.key_path)
            .field("remote_dir", &self.remote_dir)
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl Preset {
    /// One-line description without secrets.
    pub fn describe(&self) -> String {
        let auth = match self.auth {
            PresetAuth::Password => "password".to_string(),
            PresetAuth::Key => match &self.key_path {
                Some(path) => format!("key {}", path.display()),
                None => "key".to_string(),
            },
        };
        let dir = if self.remote_dir.is_empty() {
            "~"
        } else {
            self.remote_dir.as_str()
        };
        format!(
            "{}@{}:{} ({auth}) -> {dir}",
            self.username, self.host, self.port
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetStore {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

impl PresetStore {
    /// Read the store. A missing file yields an empty store; an unreadable
    /// or malformed file is logged and also yields an empty store.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                uploader_warn!("Failed to read presets from {:?}: {}", path, err);
                return Self::default();
            }
        };

        match ron::from_str::<PresetStore>(&content) {
            Ok(mut store) => {
                if let Some(name) = &store.default {
                    if !store.presets.contains_key(name) {
                        uploader_warn!("Default preset {:?} does not exist; ignoring", name);
                        store.default = None;
                    }
                }
                uploader_info!("Loaded {} preset(s) from {:?}", store.presets.len(), path);
                store
            }
            Err(err) => {
                uploader_warn!("Failed to parse presets from {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    /// Write the store atomically next to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PresetError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(self, pretty)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(path).map_err(|e| PresetError::Io(e.error))?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn default_preset(&self) -> Option<(&str, &Preset)> {
        let name = self.default.as_deref()?;
        self.presets.get(name).map(|preset| (name, preset))
    }

    /// Insert or replace a preset. The first preset saved becomes the default.
    pub fn upsert(&mut self, name: &str, preset: Preset) -> Result<(), PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        self.presets.insert(name.to_string(), preset);
        if self.default.is_none() {
            self.default = Some(name.to_string());
        }
        Ok(())
    }

    /// Remove a preset. Removing the default promotes the first remaining one.
    pub fn remove(&mut self, name: &str) -> Result<Preset, PresetError> {
        let removed = self
            .presets
            .remove(name)
            .ok_or_else(|| PresetError::Unknown(name.to_string()))?;
        if self.default.as_deref() == Some(name) {
            self.default = self.presets.keys().next().cloned();
        }
        Ok(removed)
    }

    pub fn set_default(&mut self, name: &str) -> Result<(), PresetError> {
        if !self.presets.contains_key(name) {
            return Err(PresetError::Unknown(name.to_string()));
        }
        self.default = Some(name.to_string());
        Ok(())
    }
}
