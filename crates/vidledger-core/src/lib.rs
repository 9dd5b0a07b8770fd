#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod core;

pub mod api;

pub(crate) use crate::core::config;
pub(crate) use crate::core::config::context;
pub(crate) use crate::core::remote;
pub(crate) use crate::core::tooling;
pub(crate) use crate::core::tooling::outcome;
pub(crate) use crate::core::transcode;

pub use crate::core::config::context::{CommandContext, CommandInfo};
pub use crate::core::config::{ConfigError, EnvSnapshot, Settings};
pub use crate::core::runtime::CommandGroup;
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome, UserError};

pub use crate::core::inventory::{
    collect_inventory, inventory_command, write_inventory, InventoryConfig, InventoryRequest,
};
pub use crate::core::upload::{
    upload_command, upload_videos, FileOutcome, UploadConfig, UploadRequest, UploadSummary,
};

pub use crate::core::runtime::VIDLEDGER_VERSION;
pub use crate::core::runtime::{format_status_message, outcome_from_error, to_json_response};

pub use vidledger_domain::NamingPolicy;
