//! Ledger-checked upload of a folder of videos.
//!
//! Each discovered video is handled to completion (convert, upload, clean up)
//! before the next one is looked at. A failure for one file is recorded in its
//! [`FileOutcome`] and the loop moves on; only configuration, ledger and
//! dataset problems abort the run.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use vidledger_domain::{
    append_records, dataset_name_for, discover_videos, InventoryRecord, Ledger, NamingPolicy,
    VideoCandidate,
};

use crate::config::{
    ConfigError, RequiredKeys, Settings, API_KEY_ENV, INVENTORY_CSV_ENV, VIDEO_FOLDER_ENV,
};
use crate::remote::{get_or_create_dataset, LabelboxClient, LabelingPlatform, RemoteDataset, RemoteError};
use crate::tooling::{config_error, missing_config_outcome, missing_folder_error, unauthorized_outcome};
use crate::transcode::{FfmpegTranscoder, TranscodeError, Transcoder};
use crate::{CommandContext, ExecutionOutcome};

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub folder: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
    pub naming: NamingPolicy,
    pub dry_run: bool,
}

/// Everything the pipeline needs, resolved up front.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub api_key: String,
    pub endpoint: String,
    pub video_folder: PathBuf,
    pub ledger_path: PathBuf,
    pub work_dir: PathBuf,
    pub ffmpeg: String,
    pub naming: NamingPolicy,
    pub dry_run: bool,
}

impl UploadConfig {
    /// Merges request overrides over the environment settings.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] naming every required key without a value.
    pub fn resolve(settings: &Settings, request: &UploadRequest) -> Result<Self, ConfigError> {
        let mut required = RequiredKeys::default();
        let api_key = required.take(API_KEY_ENV, settings.api_key.as_ref());
        let video_folder = required.take(
            VIDEO_FOLDER_ENV,
            request.folder.as_ref().or(settings.video_folder.as_ref()),
        );
        let ledger_path = required.take(
            INVENTORY_CSV_ENV,
            request.ledger.as_ref().or(settings.inventory_csv.as_ref()),
        );
        required.finish()?;
        Ok(Self {
            api_key: api_key.unwrap_or_default(),
            endpoint: settings.endpoint.clone(),
            video_folder: video_folder.unwrap_or_default(),
            ledger_path: ledger_path.unwrap_or_default(),
            work_dir: settings.work_dir.clone(),
            ffmpeg: settings.ffmpeg.clone(),
            naming: request.naming,
            dry_run: request.dry_run,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FileOutcome {
    Uploaded {
        source: PathBuf,
        record: InventoryRecord,
    },
    Skipped {
        source: PathBuf,
        video_name: String,
        dataset_name: String,
    },
    /// Dry run only: the video would have been converted and uploaded.
    Pending {
        source: PathBuf,
        video_name: String,
    },
    TranscodeFailed {
        source: PathBuf,
        video_name: String,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stderr_tail: Option<String>,
    },
    UploadFailed {
        source: PathBuf,
        video_name: String,
        error: String,
    },
}

impl FileOutcome {
    pub fn video_name(&self) -> &str {
        match self {
            FileOutcome::Uploaded { record, .. } => &record.video_name,
            FileOutcome::Skipped { video_name, .. }
            | FileOutcome::Pending { video_name, .. }
            | FileOutcome::TranscodeFailed { video_name, .. }
            | FileOutcome::UploadFailed { video_name, .. } => video_name,
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Uploaded { source, .. }
            | FileOutcome::Skipped { source, .. }
            | FileOutcome::Pending { source, .. }
            | FileOutcome::TranscodeFailed { source, .. }
            | FileOutcome::UploadFailed { source, .. } => source,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Uploaded { .. } => "uploaded",
            FileOutcome::Skipped { .. } => "skipped",
            FileOutcome::Pending { .. } => "pending",
            FileOutcome::TranscodeFailed { .. } => "transcode failed",
            FileOutcome::UploadFailed { .. } => "upload failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FileOutcome::TranscodeFailed { .. } | FileOutcome::UploadFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub dataset_name: String,
    pub dataset: Option<RemoteDataset>,
    pub ledger_path: PathBuf,
    pub dry_run: bool,
    pub found: usize,
    pub outcomes: Vec<FileOutcome>,
    /// Rows in the ledger file after the rewrite, when one happened.
    pub ledger_rows: Option<usize>,
}

impl UploadSummary {
    pub fn uploaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Uploaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Skipped { .. }))
    }

    pub fn pending(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Pending { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(FileOutcome::is_failure)
    }

    pub fn new_records(&self) -> Vec<InventoryRecord> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Uploaded { record, .. } => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Uploads every video under the configured folder that the ledger does not
/// already list, then appends the new rows to the ledger.
///
/// # Errors
/// Returns an error when the folder is missing, the ledger cannot be read or
/// written, or the target dataset cannot be found or created.
pub fn upload_videos(
    config: &UploadConfig,
    platform: &dyn LabelingPlatform,
    transcoder: &dyn Transcoder,
) -> Result<UploadSummary> {
    if !config.video_folder.is_dir() {
        return Err(missing_folder_error(&config.video_folder).into());
    }
    let folder = fs::canonicalize(&config.video_folder)
        .with_context(|| format!("failed to resolve {}", config.video_folder.display()))?;
    // Named after the configured path. The resolved path is used only when the
    // configured one has no final component.
    let dataset_name = dataset_name_for(&config.video_folder)
        .or_else(|| dataset_name_for(&folder))
        .ok_or_else(|| {
            config_error(&ConfigError::InvalidPath {
                key: VIDEO_FOLDER_ENV,
                path: config.video_folder.clone(),
            })
        })?;

    let mut ledger = Ledger::load(&config.ledger_path)?;
    tracing::info!(entries = ledger.len(), ledger = %config.ledger_path.display(), "loaded video inventory");
    tracing::info!(dataset = %dataset_name, "using folder name for dataset");

    let videos = discover_videos(&folder);
    tracing::info!(found = videos.len(), folder = %folder.display(), "scanned for videos");

    if config.dry_run {
        return Ok(plan_dry_run(config, &ledger, dataset_name, &videos));
    }

    let dataset = get_or_create_dataset(platform, &dataset_name)
        .with_context(|| format!("failed to prepare dataset {dataset_name}"))?;
    fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("failed to create {}", config.work_dir.display()))?;
    let work_dir = fs::canonicalize(&config.work_dir)
        .with_context(|| format!("failed to resolve {}", config.work_dir.display()))?;

    let mut outcomes = Vec::with_capacity(videos.len());
    for candidate in &videos {
        let video_name = candidate.video_name(config.naming);
        if let Some(existing) = ledger.get(&video_name) {
            tracing::info!(video = %video_name, dataset = %existing.dataset_name, "skipping, already in inventory");
            outcomes.push(FileOutcome::Skipped {
                source: candidate.path.clone(),
                video_name,
                dataset_name: existing.dataset_name.clone(),
            });
            continue;
        }
        let job = VideoJob {
            candidate,
            video_name,
            dataset_name: &dataset_name,
            dataset: &dataset,
            work_dir: &work_dir,
        };
        let outcome = job.run(platform, transcoder);
        if let FileOutcome::Uploaded { record, .. } = &outcome {
            ledger.insert(record.clone());
        }
        outcomes.push(outcome);
    }

    let mut summary = UploadSummary {
        dataset_name,
        dataset: Some(dataset),
        ledger_path: config.ledger_path.clone(),
        dry_run: false,
        found: videos.len(),
        outcomes,
        ledger_rows: None,
    };
    let new_records = summary.new_records();
    if !new_records.is_empty() {
        let total = append_records(&config.ledger_path, &new_records)?;
        tracing::info!(added = new_records.len(), total, "updated video inventory");
        summary.ledger_rows = Some(total);
    }
    tracing::info!(
        found = summary.found,
        skipped = summary.skipped(),
        uploaded = summary.uploaded(),
        failed = summary.failed(),
        "upload finished"
    );
    Ok(summary)
}

fn plan_dry_run(
    config: &UploadConfig,
    ledger: &Ledger,
    dataset_name: String,
    videos: &[VideoCandidate],
) -> UploadSummary {
    let mut planned = HashSet::new();
    let outcomes = videos
        .iter()
        .map(|candidate| {
            let video_name = candidate.video_name(config.naming);
            let known = ledger
                .get(&video_name)
                .map(|entry| entry.dataset_name.clone())
                .or_else(|| planned.contains(&video_name).then(|| dataset_name.clone()));
            match known {
                Some(existing) => FileOutcome::Skipped {
                    source: candidate.path.clone(),
                    video_name,
                    dataset_name: existing,
                },
                None => {
                    planned.insert(video_name.clone());
                    FileOutcome::Pending {
                        source: candidate.path.clone(),
                        video_name,
                    }
                }
            }
        })
        .collect();
    UploadSummary {
        dataset_name,
        dataset: None,
        ledger_path: config.ledger_path.clone(),
        dry_run: true,
        found: videos.len(),
        outcomes,
        ledger_rows: None,
    }
}

struct VideoJob<'a> {
    candidate: &'a VideoCandidate,
    video_name: String,
    dataset_name: &'a str,
    dataset: &'a RemoteDataset,
    work_dir: &'a Path,
}

impl VideoJob<'_> {
    fn run(self, platform: &dyn LabelingPlatform, transcoder: &dyn Transcoder) -> FileOutcome {
        let source = self.candidate.path.clone();
        let converted = self.work_dir.join(self.candidate.converted_name());
        if overwrites_source(&source, &converted) {
            tracing::warn!(source = %source.display(), "converted file would replace the source, skipping");
            return FileOutcome::TranscodeFailed {
                error: format!(
                    "converted file {} would overwrite the source video",
                    converted.display()
                ),
                source,
                video_name: self.video_name,
                stderr_tail: None,
            };
        }
        tracing::info!(source = %source.display(), target = %converted.display(), "converting");
        if let Err(err) = transcoder.transcode(&source, &converted) {
            tracing::warn!(source = %source.display(), error = %err, "conversion failed, skipping upload");
            remove_converted(&converted);
            let stderr_tail = match &err {
                TranscodeError::Exit { stderr_tail, .. } if !stderr_tail.is_empty() => {
                    Some(stderr_tail.clone())
                }
                _ => None,
            };
            return FileOutcome::TranscodeFailed {
                source,
                video_name: self.video_name,
                error: err.to_string(),
                stderr_tail,
            };
        }

        tracing::info!(video = %self.video_name, "uploading");
        let created = platform.create_video_row(&self.dataset.id, &converted, &self.video_name);
        remove_converted(&converted);
        match created {
            Ok(row) => {
                tracing::info!(video = %self.video_name, data_row = %row.id, "uploaded");
                FileOutcome::Uploaded {
                    source,
                    record: InventoryRecord {
                        dataset_name: self.dataset_name.to_string(),
                        video_name: self.video_name,
                        data_row_id: row.id,
                        dataset_id: self.dataset.id.clone(),
                    },
                }
            }
            Err(err) => {
                tracing::warn!(video = %self.video_name, error = %err, "upload failed");
                FileOutcome::UploadFailed {
                    source,
                    video_name: self.video_name,
                    error: err.to_string(),
                }
            }
        }
    }
}

fn overwrites_source(source: &Path, converted: &Path) -> bool {
    if converted == source {
        return true;
    }
    matches!(
        (fs::canonicalize(source), fs::canonicalize(converted)),
        (Ok(source), Ok(converted)) if source == converted
    )
}

fn remove_converted(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(err) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %err, "could not delete temporary file");
    }
}

/// Runs the upload against Labelbox with ffmpeg as the transcoder.
///
/// # Errors
/// Returns an error for failures that are not attributable to user input.
pub fn upload_command(ctx: &CommandContext, request: &UploadRequest) -> Result<ExecutionOutcome> {
    let config = match UploadConfig::resolve(ctx.settings(), request) {
        Ok(config) => config,
        Err(err) => return Ok(missing_config_outcome(&err)),
    };
    let platform = LabelboxClient::new(&config.endpoint, &config.api_key)?;
    let transcoder = FfmpegTranscoder::new(&config.ffmpeg);
    match upload_videos(&config, &platform, &transcoder) {
        Ok(summary) => Ok(upload_outcome(&summary)),
        Err(err) => match err.downcast_ref::<RemoteError>() {
            Some(RemoteError::Unauthorized { endpoint, .. }) => Ok(unauthorized_outcome(endpoint)),
            _ => Err(err),
        },
    }
}

pub(crate) fn upload_outcome(summary: &UploadSummary) -> ExecutionOutcome {
    let mut details = json!({
        "dataset": summary.dataset_name,
        "dataset_id": summary.dataset.as_ref().map(|dataset| dataset.id.clone()),
        "ledger": summary.ledger_path.display().to_string(),
        "dry_run": summary.dry_run,
        "found": summary.found,
        "uploaded": summary.uploaded(),
        "skipped": summary.skipped(),
        "pending": summary.pending(),
        "failed": summary.failed(),
        "ledger_rows": summary.ledger_rows,
        "files": summary.outcomes,
    });

    if summary.dry_run {
        let message = format!(
            "dry run: {} of {} videos would be uploaded to {}",
            summary.pending(),
            summary.found,
            summary.dataset_name
        );
        return ExecutionOutcome::success(message, details);
    }

    let message = format!(
        "uploaded {} new videos to {} ({} skipped, {} failed)",
        summary.uploaded(),
        summary.dataset_name,
        summary.skipped(),
        summary.failed()
    );
    if summary.failed() > 0 {
        details["hint"] = json!("re-run to retry failed files; uploaded videos are already in the ledger");
        ExecutionOutcome::failure(message, details)
    } else {
        ExecutionOutcome::success(message, details)
    }
}
