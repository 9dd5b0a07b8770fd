use std::{
    ffi::OsStr,
    io::Read,
    process::{Command, Stdio},
    thread,
};

use anyhow::{Context, Result};

/// Output beyond this many bytes keeps only its tail.
const MAX_CAPTURE_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// Execute a program to completion with stdin closed, capturing stdout/stderr.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or the I/O streams cannot
/// be read entirely.
pub fn run_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> Result<RunOutput> {
    let mut command = Command::new(program);
    command.args(args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("stdout missing for {program}"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow::anyhow!("stderr missing for {program}"))?;
    let stdout_handle = thread::spawn(move || read_to_string_limited(stdout, MAX_CAPTURE_BYTES));
    let stderr_handle = thread::spawn(move || read_to_string_limited(stderr, MAX_CAPTURE_BYTES));

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {program}"))?;
    let code = status.code().unwrap_or(-1);
    let (mut stdout, stdout_truncated) = stdout_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stdout thread panicked"))??;
    let (mut stderr, stderr_truncated) = stderr_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stderr thread panicked"))??;
    if stdout_truncated {
        stdout.insert_str(0, "[...truncated...]\n");
    }
    if stderr_truncated {
        stderr.insert_str(0, "[...truncated...]\n");
    }
    Ok(RunOutput {
        code,
        stdout,
        stderr,
    })
}

fn read_to_string_limited(mut reader: impl Read, limit: usize) -> Result<(String, bool)> {
    let mut buffer = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        append_limited(&mut buffer, &chunk[..read], limit, &mut truncated);
    }
    Ok((String::from_utf8_lossy(&buffer).to_string(), truncated))
}

fn append_limited(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize, truncated: &mut bool) {
    if limit == 0 {
        return;
    }
    if buffer.len().saturating_add(chunk.len()) <= limit {
        buffer.extend_from_slice(chunk);
        return;
    }
    *truncated = true;
    let old_len = buffer.len();
    let excess = old_len.saturating_add(chunk.len()).saturating_sub(limit);
    if excess >= old_len {
        buffer.clear();
        let drop_from_chunk = excess.saturating_sub(old_len).min(chunk.len());
        buffer.extend_from_slice(&chunk[drop_from_chunk..]);
    } else {
        buffer.drain(0..excess);
        buffer.extend_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn run_command_captures_output_and_status_unix() -> Result<()> {
        let output = run_command("/bin/sh", &["-c", "printf out && printf err >&2; exit 7"])?;
        assert_eq!(output.code, 7);
        assert!(!output.succeeded());
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        Ok(())
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = run_command::<&str>("vidledger-definitely-not-a-program", &[])
            .expect_err("spawn should fail");
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn limited_capture_keeps_the_tail() {
        let mut buffer = Vec::new();
        let mut truncated = false;
        append_limited(&mut buffer, b"abcdef", 4, &mut truncated);
        assert!(truncated);
        assert_eq!(buffer, b"cdef");
        append_limited(&mut buffer, b"gh", 4, &mut truncated);
        assert_eq!(buffer, b"efgh");
    }
}
