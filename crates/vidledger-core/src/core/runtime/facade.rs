use std::fmt;

use serde_json::{json, Value};

use crate::context::CommandInfo;
use crate::outcome::{CommandStatus, ExecutionOutcome, UserError};

pub const VIDLEDGER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandGroup {
    Upload,
    Inventory,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Upload => "upload",
            CommandGroup::Inventory => "inventory",
        };
        f.write_str(name)
    }
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let group_name = info.group.to_string();
    let prefix = if group_name == info.name {
        format!("vidledger {}", info.name)
    } else {
        format!("vidledger {} {}", group_name, info.name)
    };
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

/// Turns an error escaping a command into the outcome reported to the user.
#[must_use]
pub fn outcome_from_error(err: &anyhow::Error) -> ExecutionOutcome {
    if let Some(user) = err.downcast_ref::<UserError>() {
        return ExecutionOutcome::user_error(user.message().to_string(), user.details().clone());
    }
    let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
    ExecutionOutcome::failure(
        err.to_string(),
        json!({
            "reason": "internal_error",
            "error": err.to_string(),
            "issues": issues,
            "hint": "re-run with -vv for more detail",
        }),
    )
}
