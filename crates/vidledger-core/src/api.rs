// Intended public API surface for `vidledger-core`.
//
// The CLI and integration tests import from here; the crate root re-exports
// the same items for convenience.

pub use crate::core::config::context::{CommandContext, CommandInfo};
pub use crate::core::config::{
    ConfigError, EnvSnapshot, Settings, API_KEY_ENV, DEFAULT_ENDPOINT,
    DEFAULT_FFMPEG, DEFAULT_INVENTORY_OUTPUT, DEFAULT_WORK_DIR, ENDPOINT_ENV, FFMPEG_ENV,
    INVENTORY_CSV_ENV, VIDEO_FOLDER_ENV, WORK_DIR_ENV,
};
pub use crate::core::inventory::{
    collect_inventory, inventory_command, write_inventory, InventoryConfig, InventoryRequest,
};
pub use crate::core::remote::{
    get_or_create_dataset, LabelboxClient, LabelingPlatform, RemoteDataRow, RemoteDataset,
    RemoteError,
};
pub use crate::core::runtime::{
    format_status_message, outcome_from_error, to_json_response, CommandGroup, VIDLEDGER_VERSION,
};
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome, UserError};
pub use crate::core::transcode::{ffmpeg_args, FfmpegTranscoder, TranscodeError, Transcoder};
pub use crate::core::upload::{
    upload_command, upload_videos, FileOutcome, UploadConfig, UploadRequest, UploadSummary,
};
