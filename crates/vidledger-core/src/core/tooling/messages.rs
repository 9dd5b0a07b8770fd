use std::path::Path;

use serde_json::json;

use crate::config::ConfigError;
use crate::{ExecutionOutcome, UserError};

pub(crate) fn config_error(err: &ConfigError) -> UserError {
    match err {
        ConfigError::Missing { keys } => UserError::new(
            err.to_string(),
            json!({
                "reason": "missing_config",
                "missing": keys,
                "hint": "export the variables or add them to a .env file in the working directory",
            }),
        ),
        ConfigError::InvalidPath { key, path } => UserError::new(
            err.to_string(),
            json!({
                "reason": "invalid_config",
                "key": key,
                "path": path.display().to_string(),
            }),
        ),
    }
}

pub(crate) fn missing_config_outcome(err: &ConfigError) -> ExecutionOutcome {
    config_error(err).into_outcome()
}

pub(crate) fn missing_folder_error(folder: &Path) -> UserError {
    UserError::new(
        format!("video folder does not exist: {}", folder.display()),
        json!({
            "reason": "missing_folder",
            "folder": folder.display().to_string(),
            "hint": "check VIDEO_FOLDER_PATH or pass --folder",
        }),
    )
}

pub(crate) fn unauthorized_outcome(endpoint: &str) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        format!("{endpoint} rejected the provided API key"),
        json!({
            "reason": "auth_rejected",
            "endpoint": endpoint,
            "hint": "confirm LABELBOX_API_KEY is current and has access to the workspace",
        }),
    )
}
