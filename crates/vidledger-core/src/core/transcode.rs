//! Conversion of source videos into an upload-friendly mp4.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::runtime::process::run_command;

/// Lines of transcoder stderr kept for reporting a failed conversion.
const STDERR_TAIL_LINES: usize = 12;

pub trait Transcoder {
    /// Converts `source` into `target`, overwriting any existing file.
    fn transcode(&self, source: &Path, target: &Path) -> Result<(), TranscodeError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    #[error("failed to run {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("{program} exited with status {code}")]
    Exit {
        program: String,
        code: i32,
        stderr_tail: String,
    },
    #[error("{program} finished but {} was not created", target.display())]
    MissingOutput { program: String, target: PathBuf },
}

/// Runs ffmpeg forcing H.264 video, AAC audio and a faststart mp4 layout.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

pub fn ffmpeg_args(source: &Path, target: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), source.as_os_str().to_owned()];
    for flag in [
        "-vcodec",
        "libx264",
        "-acodec",
        "aac",
        "-movflags",
        "+faststart",
        "-y",
    ] {
        args.push(flag.into());
    }
    args.push(target.as_os_str().to_owned());
    args
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, source: &Path, target: &Path) -> Result<(), TranscodeError> {
        let args = ffmpeg_args(source, target);
        tracing::debug!(program = %self.program, source = %source.display(), target = %target.display(), "transcoding");
        let output = run_command(&self.program, &args).map_err(|err| TranscodeError::Spawn {
            program: self.program.clone(),
            reason: format!("{err:#}"),
        })?;
        if !output.succeeded() {
            return Err(TranscodeError::Exit {
                program: self.program.clone(),
                code: output.code,
                stderr_tail: tail_lines(&output.stderr, STDERR_TAIL_LINES),
            });
        }
        if !target.exists() {
            return Err(TranscodeError::MissingOutput {
                program: self.program.clone(),
                target: target.to_path_buf(),
            });
        }
        Ok(())
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
