//! The remote labeling platform: datasets and the data rows inside them.

mod http;
pub mod labelbox;

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub(crate) use http::build_http_client;
pub use labelbox::LabelboxClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDataset {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDataRow {
    pub id: String,
    #[serde(rename = "externalId", default)]
    pub external_id: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} rejected the provided API key (HTTP {status})")]
    Unauthorized { endpoint: String, status: u16 },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("remote API error: {0}")]
    GraphQl(String),
    #[error("unexpected response from remote API: {0}")]
    MalformedResponse(String),
    #[error("failed to read {}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait LabelingPlatform {
    fn list_datasets(&self) -> Result<Vec<RemoteDataset>, RemoteError>;

    fn create_dataset(&self, name: &str) -> Result<RemoteDataset, RemoteError>;

    fn list_data_rows(&self, dataset_id: &str) -> Result<Vec<RemoteDataRow>, RemoteError>;

    /// Uploads the local file at `file` and creates a data row for it.
    fn create_video_row(
        &self,
        dataset_id: &str,
        file: &Path,
        external_id: &str,
    ) -> Result<RemoteDataRow, RemoteError>;
}

/// Returns the first dataset named `name`, creating it when none exists.
pub fn get_or_create_dataset(
    platform: &dyn LabelingPlatform,
    name: &str,
) -> Result<RemoteDataset, RemoteError> {
    if let Some(existing) = platform
        .list_datasets()?
        .into_iter()
        .find(|dataset| dataset.name == name)
    {
        tracing::info!(dataset = %existing.name, id = %existing.id, "found existing dataset");
        return Ok(existing);
    }
    tracing::info!(dataset = %name, "creating new dataset");
    platform.create_dataset(name)
}
