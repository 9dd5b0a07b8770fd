use std::io::{Cursor, Read};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Body, Client};

use crate::VIDLEDGER_VERSION;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(format!("vidledger/{VIDLEDGER_VERSION}"))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

/// A `multipart/form-data` body. Text parts are buffered, the closing file
/// part is streamed from its reader.
pub(crate) struct MultipartBody {
    boundary: String,
    head: Vec<u8>,
}

impl MultipartBody {
    pub(crate) fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            head: Vec::new(),
        }
    }

    pub(crate) fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub(crate) fn text(&mut self, name: &str, value: &str) {
        let boundary = &self.boundary;
        self.head
            .extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        self.head.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        self.head.extend_from_slice(value.as_bytes());
        self.head.extend_from_slice(b"\r\n");
    }

    /// Appends the file part and closes the body. At most `len` bytes are
    /// read from `reader`.
    pub(crate) fn finish_with_file<R>(
        mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        reader: R,
        len: u64,
    ) -> MultipartPayload
    where
        R: Read + Send + 'static,
    {
        let boundary = &self.boundary;
        let filename = filename.replace('"', "_");
        self.head
            .extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        self.head.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        self.head
            .extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        let tail = format!("\r\n--{boundary}--\r\n").into_bytes();

        let content_length = self.head.len() as u64 + len + tail.len() as u64;
        let reader = Cursor::new(self.head)
            .chain(reader.take(len))
            .chain(Cursor::new(tail));
        MultipartPayload {
            reader: Box::new(reader),
            content_length,
        }
    }
}

pub(crate) struct MultipartPayload {
    reader: Box<dyn Read + Send>,
    content_length: u64,
}

impl MultipartPayload {
    pub(crate) fn content_length(&self) -> u64 {
        self.content_length
    }

    pub(crate) fn into_body(self) -> Body {
        Body::sized(self.reader, self.content_length)
    }
}
