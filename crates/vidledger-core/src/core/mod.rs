//! Internal implementation modules for `vidledger-core`.
//!
//! Callers should go through `vidledger_core::api` or the crate root rather
//! than importing these modules directly.

pub mod config;
pub mod inventory;
pub mod remote;
pub mod runtime;
pub mod tooling;
pub mod transcode;
pub mod upload;
