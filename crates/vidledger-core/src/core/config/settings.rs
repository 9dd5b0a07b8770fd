use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "LABELBOX_API_KEY";
pub const VIDEO_FOLDER_ENV: &str = "VIDEO_FOLDER_PATH";
pub const INVENTORY_CSV_ENV: &str = "INVENTORY_CSV";
pub const ENDPOINT_ENV: &str = "LABELBOX_ENDPOINT";
pub const FFMPEG_ENV: &str = "VIDLEDGER_FFMPEG";
pub const WORK_DIR_ENV: &str = "VIDLEDGER_WORK_DIR";

pub const DEFAULT_ENDPOINT: &str = "https://api.labelbox.com/graphql";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_WORK_DIR: &str = "converted_videos";
pub const DEFAULT_INVENTORY_OUTPUT: &str = "labelbox_video_inventory.csv";

#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }

    /// Returns the trimmed value of `key`; blank values read as unset.
    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {}", keys.join(", "))]
    Missing { keys: Vec<&'static str> },
    #[error("{key} does not name a usable folder: {}", path.display())]
    InvalidPath { key: &'static str, path: PathBuf },
}

/// Values read from the environment once, before any command runs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub(crate) api_key: Option<String>,
    pub(crate) endpoint: String,
    pub(crate) video_folder: Option<PathBuf>,
    pub(crate) inventory_csv: Option<PathBuf>,
    pub(crate) ffmpeg: String,
    pub(crate) work_dir: PathBuf,
}

impl Settings {
    #[must_use]
    pub fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            api_key: snapshot.var(API_KEY_ENV).map(ToOwned::to_owned),
            endpoint: snapshot
                .var(ENDPOINT_ENV)
                .unwrap_or(DEFAULT_ENDPOINT)
                .to_string(),
            video_folder: snapshot.var(VIDEO_FOLDER_ENV).map(PathBuf::from),
            inventory_csv: snapshot.var(INVENTORY_CSV_ENV).map(PathBuf::from),
            ffmpeg: snapshot.var(FFMPEG_ENV).unwrap_or(DEFAULT_FFMPEG).to_string(),
            work_dir: PathBuf::from(snapshot.var(WORK_DIR_ENV).unwrap_or(DEFAULT_WORK_DIR)),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn ffmpeg(&self) -> &str {
        &self.ffmpeg
    }
}

/// Collects the names of missing required values so they are reported together.
#[derive(Debug, Default)]
pub(crate) struct RequiredKeys {
    missing: Vec<&'static str>,
}

impl RequiredKeys {
    pub(crate) fn take<T: Clone>(&mut self, key: &'static str, value: Option<&T>) -> Option<T> {
        if value.is_none() {
            self.missing.push(key);
        }
        value.cloned()
    }

    pub(crate) fn finish(self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing {
                keys: self.missing,
            })
        }
    }
}
