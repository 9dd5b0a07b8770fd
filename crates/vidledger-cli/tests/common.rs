#![allow(dead_code)]

use std::fs;
use std::panic;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use httptest::Server;
use serde_json::Value;

pub const CONFIG_KEYS: [&str; 6] = [
    "LABELBOX_API_KEY",
    "VIDEO_FOLDER_PATH",
    "INVENTORY_CSV",
    "LABELBOX_ENDPOINT",
    "VIDLEDGER_FFMPEG",
    "VIDLEDGER_WORK_DIR",
];

/// A `vidledger` command run from `cwd` with none of its configuration inherited.
pub fn vidledger(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("vidledger");
    cmd.current_dir(cwd).env("NO_COLOR", "1");
    for key in CONFIG_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

pub fn mock_server(test: &str) -> Option<Server> {
    match panic::catch_unwind(Server::run) {
        Ok(server) => Some(server),
        Err(_) => {
            eprintln!("skipping {test} (httptest server unavailable)");
            None
        }
    }
}

pub fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("json output")
}

pub fn write_videos(folder: &Path, names: &[&str]) {
    fs::create_dir_all(folder).expect("video folder");
    for name in names {
        fs::write(folder.join(name), format!("bytes of {name}")).expect("video");
    }
}

/// Writes a stand-in transcoder that copies its input to its last argument.
#[cfg(unix)]
pub fn fake_ffmpeg(dir: &Path, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg");
    fs::write(&path, script).expect("script");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod");
    path
}

pub const COPYING_FFMPEG: &str = "#!/bin/sh\nfor last; do :; done\ncp \"$2\" \"$last\"\n";

pub const FAILING_FFMPEG: &str = "#!/bin/sh\necho 'Invalid data found when processing input' >&2\nexit 1\n";
