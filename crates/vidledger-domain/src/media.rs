//! Discovery of source videos and the names they are uploaded under.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "wmv"];

/// Every source is converted into this container before upload.
pub const CONVERTED_EXTENSION: &str = "mp4";

/// How the ledger key and external id are derived from a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingPolicy {
    /// `<stem>.mp4`, i.e. the name of the converted artifact.
    #[default]
    ForceMp4,
    /// The source file name as found on disk.
    SourceName,
}

impl NamingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            NamingPolicy::ForceMp4 => "mp4",
            NamingPolicy::SourceName => "source",
        }
    }
}

impl fmt::Display for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown naming policy `{0}` (expected `mp4` or `source`)")]
pub struct UnknownNamingPolicy(String);

impl FromStr for NamingPolicy {
    type Err = UnknownNamingPolicy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mp4" | "force-mp4" => Ok(NamingPolicy::ForceMp4),
            "source" | "source-name" => Ok(NamingPolicy::SourceName),
            _ => Err(UnknownNamingPolicy(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub stem: String,
}

impl VideoCandidate {
    fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            file_name,
            stem,
        })
    }

    pub fn converted_name(&self) -> String {
        format!("{}.{CONVERTED_EXTENSION}", self.stem)
    }

    pub fn video_name(&self, policy: NamingPolicy) -> String {
        match policy {
            NamingPolicy::ForceMp4 => self.converted_name(),
            NamingPolicy::SourceName => self.file_name.clone(),
        }
    }
}

pub fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Recursively collects video files under `root`, ordered by path.
pub fn discover_videos(root: &Path) -> Vec<VideoCandidate> {
    let mut found = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .follow_links(true)
        .sort_by(|a, b| a.path().cmp(b.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(%err, root = %root.display(), "skipping path during video scan");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_video_path(entry.path()) {
            continue;
        }
        if let Some(candidate) = VideoCandidate::from_path(entry.path()) {
            found.push(candidate);
        }
    }
    found
}

/// Remote dataset name for a source folder: its final path component.
pub fn dataset_name_for(folder: &Path) -> Option<String> {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_video_path(Path::new("clip.MOV")));
        assert!(is_video_path(Path::new("dir/clip.Mkv")));
        assert!(is_video_path(Path::new("clip.wmv")));
        assert!(!is_video_path(Path::new("clip.mp3")));
        assert!(!is_video_path(Path::new("mp4")));
        assert!(!is_video_path(Path::new("notes.txt")));
    }

    #[test]
    fn discovery_walks_subdirectories_in_path_order() -> Result<()> {
        let tmp = tempdir()?;
        let root = tmp.path();
        fs::create_dir_all(root.join("b_day"))?;
        fs::create_dir_all(root.join("a_day").join("deep"))?;
        fs::write(root.join("b_day").join("two.AVI"), b"x")?;
        fs::write(root.join("a_day").join("deep").join("one.mov"), b"x")?;
        fs::write(root.join("a_day").join("readme.txt"), b"x")?;
        fs::write(root.join("zero.mp4"), b"x")?;

        let names: Vec<String> = discover_videos(root)
            .into_iter()
            .map(|candidate| candidate.file_name)
            .collect();
        assert_eq!(names, vec!["one.mov", "two.AVI", "zero.mp4"]);
        Ok(())
    }

    #[test]
    fn directories_with_video_suffixes_are_ignored() -> Result<()> {
        let tmp = tempdir()?;
        fs::create_dir_all(tmp.path().join("folder.mp4"))?;
        assert!(discover_videos(tmp.path()).is_empty());
        Ok(())
    }

    #[test]
    fn naming_policy_controls_the_video_name() {
        let candidate = VideoCandidate::from_path(Path::new("/videos/take.1.MOV")).unwrap();
        assert_eq!(candidate.converted_name(), "take.1.mp4");
        assert_eq!(candidate.video_name(NamingPolicy::ForceMp4), "take.1.mp4");
        assert_eq!(candidate.video_name(NamingPolicy::SourceName), "take.1.MOV");
    }

    #[test]
    fn naming_policy_parses_cli_spellings() {
        assert_eq!("mp4".parse::<NamingPolicy>().unwrap(), NamingPolicy::ForceMp4);
        assert_eq!(
            "Source".parse::<NamingPolicy>().unwrap(),
            NamingPolicy::SourceName
        );
        assert!("webm".parse::<NamingPolicy>().is_err());
    }

    #[test]
    fn dataset_name_is_the_folder_basename() {
        assert_eq!(
            dataset_name_for(Path::new("/data/site_visits")).as_deref(),
            Some("site_visits")
        );
        assert_eq!(
            dataset_name_for(Path::new("relative/clips/")).as_deref(),
            Some("clips")
        );
        assert_eq!(dataset_name_for(Path::new("/")), None);
    }
}
