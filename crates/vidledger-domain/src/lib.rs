#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod ledger;
pub mod media;

pub use ledger::{
    append_records, read_records, write_records, InventoryRecord, Ledger, LedgerEntry,
    LedgerError, LEDGER_HEADER,
};
pub use media::{
    dataset_name_for, discover_videos, is_video_path, NamingPolicy, UnknownNamingPolicy,
    VideoCandidate, CONVERTED_EXTENSION, VIDEO_EXTENSIONS,
};
