//! Labelbox GraphQL client.

use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::http::{build_http_client, MultipartBody};
use super::{LabelingPlatform, RemoteDataRow, RemoteDataset, RemoteError};

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 10_000;
const ERROR_BODY_LIMIT: usize = 512;
/// Per-request timeout for file uploads, replacing the client-wide one.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const LIST_DATASETS: &str = "query ListDatasets($skip: Int!, $first: PageSize!) { \
     datasets(where: {deleted: false}, skip: $skip, first: $first) { id name } }";

const CREATE_DATASET: &str = "mutation CreateDataset($name: String!) { \
     createDataset(data: {name: $name}) { id name } }";

const LIST_DATA_ROWS: &str = "query ListDataRows($datasetId: ID!, $skip: Int!, $first: PageSize!) { \
     dataset(where: {id: $datasetId}) { dataRows(skip: $skip, first: $first) { id externalId } } }";

const CREATE_DATA_ROW: &str = "mutation CreateDataRow($rowData: String!, $externalId: String, $datasetId: ID!) { \
     createDataRow(data: {rowData: $rowData, externalId: $externalId, dataset: {connect: {id: $datasetId}}}) \
     { id externalId } }";

const UPLOAD_FILE: &str = "mutation UploadFile($file: Upload!, $contentLength: Int!, $sign: Boolean) { \
     uploadFile(file: $file, contentLength: $contentLength, sign: $sign) { url filename } }";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DatasetsPage {
    datasets: Vec<RemoteDataset>,
}

#[derive(Debug, Deserialize)]
struct CreatedDataset {
    #[serde(rename = "createDataset")]
    dataset: RemoteDataset,
}

#[derive(Debug, Deserialize)]
struct DatasetRows {
    dataset: Option<DataRowsPage>,
}

#[derive(Debug, Deserialize)]
struct DataRowsPage {
    #[serde(rename = "dataRows")]
    data_rows: Vec<RemoteDataRow>,
}

#[derive(Debug, Deserialize)]
struct CreatedDataRow {
    #[serde(rename = "createDataRow")]
    data_row: RemoteDataRow,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    #[serde(rename = "uploadFile")]
    file: UploadedFileUrl,
}

#[derive(Debug, Deserialize)]
struct UploadedFileUrl {
    url: String,
}

pub struct LabelboxClient {
    http: Client,
    endpoint: String,
    api_key: String,
    page_size: usize,
}

impl LabelboxClient {
    /// Builds a client for the GraphQL `endpoint` authenticated with `api_key`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, RemoteError> {
        let body = json!({ "query": query, "variables": variables });
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|err| self.transport(err))?;
        self.decode(response)
    }

    fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, RemoteError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::Unauthorized {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }
        let text = response.text().map_err(|err| self.transport(err))?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body: truncate(&text, ERROR_BODY_LIMIT),
            });
        }
        let envelope: GraphQlResponse<T> = serde_json::from_str(&text)
            .map_err(|err| RemoteError::MalformedResponse(err.to_string()))?;
        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope
                .errors
                .into_iter()
                .map(|error| error.message)
                .collect();
            return Err(RemoteError::GraphQl(messages.join("; ")));
        }
        envelope
            .data
            .ok_or_else(|| RemoteError::MalformedResponse("response carried no data".into()))
    }

    fn transport(&self, source: reqwest::Error) -> RemoteError {
        RemoteError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        }
    }

    /// Streams a file to the platform and returns the signed URL it was stored under.
    fn upload_file(&self, path: &Path) -> Result<String, RemoteError> {
        let read_error = |source| RemoteError::ReadFile {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(read_error)?;
        let length = file.metadata().map_err(read_error)?.len();
        let filename = path
            .file_name()
            .map_or_else(|| "upload.mp4".to_string(), |name| name.to_string_lossy().into_owned());
        let operations = json!({
            "query": UPLOAD_FILE,
            "variables": { "file": null, "contentLength": length, "sign": true },
        });
        let map = json!({ "1": ["variables.file"] });

        let mut body = MultipartBody::new(multipart_boundary());
        body.text("operations", &operations.to_string());
        body.text("map", &map.to_string());
        let content_type = body.content_type();
        let payload = body.finish_with_file("1", &filename, "video/mp4", file, length);

        tracing::debug!(
            file = %path.display(),
            bytes = length,
            body_bytes = payload.content_length(),
            "uploading file"
        );
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .timeout(UPLOAD_TIMEOUT)
            .body(payload.into_body())
            .send()
            .map_err(|err| self.transport(err))?;
        let uploaded: UploadedFile = self.decode(response)?;
        Ok(uploaded.file.url)
    }

    /// Fetches pages until a short one arrives. A page that starts with the
    /// same item as the one before it means the server ignores `skip`.
    fn paged<T, F>(&self, mut fetch: F) -> Result<Vec<T>, RemoteError>
    where
        T: PartialEq,
        F: FnMut(usize, usize) -> Result<Vec<T>, RemoteError>,
    {
        let mut items: Vec<T> = Vec::new();
        let mut skip = 0;
        let mut previous_start = None;
        for _ in 0..MAX_PAGES {
            let page = fetch(skip, self.page_size)?;
            let count = page.len();
            if let (Some(start), Some(first)) = (previous_start, page.first()) {
                if items.get(start) == Some(first) {
                    return Err(RemoteError::MalformedResponse(format!(
                        "page at skip {skip} repeats the previous page"
                    )));
                }
            }
            previous_start = Some(items.len());
            items.extend(page);
            if count < self.page_size {
                return Ok(items);
            }
            skip += count;
        }
        Err(RemoteError::MalformedResponse(format!(
            "listing did not end after {MAX_PAGES} pages"
        )))
    }
}

impl LabelingPlatform for LabelboxClient {
    fn list_datasets(&self) -> Result<Vec<RemoteDataset>, RemoteError> {
        self.paged(|skip, first| {
            let page: DatasetsPage =
                self.query(LIST_DATASETS, json!({ "skip": skip, "first": first }))?;
            Ok(page.datasets)
        })
    }

    fn create_dataset(&self, name: &str) -> Result<RemoteDataset, RemoteError> {
        let created: CreatedDataset = self.query(CREATE_DATASET, json!({ "name": name }))?;
        Ok(created.dataset)
    }

    fn list_data_rows(&self, dataset_id: &str) -> Result<Vec<RemoteDataRow>, RemoteError> {
        self.paged(|skip, first| {
            let rows: DatasetRows = self.query(
                LIST_DATA_ROWS,
                json!({ "datasetId": dataset_id, "skip": skip, "first": first }),
            )?;
            rows.dataset
                .map(|page| page.data_rows)
                .ok_or_else(|| RemoteError::MalformedResponse(format!("dataset {dataset_id} not found")))
        })
    }

    fn create_video_row(
        &self,
        dataset_id: &str,
        file: &Path,
        external_id: &str,
    ) -> Result<RemoteDataRow, RemoteError> {
        let row_data = self.upload_file(file)?;
        let created: CreatedDataRow = self.query(
            CREATE_DATA_ROW,
            json!({
                "rowData": row_data,
                "externalId": external_id,
                "datasetId": dataset_id,
            }),
        )?;
        Ok(created.data_row)
    }
}

fn multipart_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("----vidledger{nanos:x}")
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
