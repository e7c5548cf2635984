use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use http::{
    HeaderValue, Request, Response, StatusCode,
    header::{CONTENT_TYPE, LOCATION},
};
use serde::Deserialize;
use snafu::ResultExt;
use url::Url;

use super::{FileTarget, NetworkSnafu, Operation, TransferError};
use crate::{http::HttpTransport, internal_events::WebHdfsResponseReceived};

/// Longest slice of an unstructured error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    File,
    Directory,
    Symlink,
}

/// The subset of a WebHDFS `FileStatus` object the blocks rely on.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FileStatus {
    pub length: u64,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

#[derive(Deserialize)]
struct FileStatusResponse {
    #[serde(rename = "FileStatus")]
    file_status: FileStatus,
}

#[derive(Deserialize)]
struct RemoteExceptionResponse {
    #[serde(rename = "RemoteException")]
    remote_exception: RemoteException,
}

#[derive(Deserialize)]
struct RemoteException {
    exception: String,
    message: String,
}

/// Issues WebHDFS operations against one [`FileTarget`].
///
/// Holds nothing but the target and a transport handle, so every call is
/// independent of the ones before it.
#[derive(Clone)]
pub struct WebHdfsClient {
    target: FileTarget,
    transport: Arc<dyn HttpTransport>,
}

impl WebHdfsClient {
    pub fn new(target: FileTarget, transport: Arc<dyn HttpTransport>) -> Self {
        Self { target, transport }
    }

    pub const fn target(&self) -> &FileTarget {
        &self.target
    }

    /// Creates the file with an empty body.
    pub fn create(&self, overwrite: bool) -> Result<(), TransferError> {
        let url = self
            .target
            .operation_url(Operation::Create, &[("overwrite", overwrite.to_string())]);
        self.redirected(Operation::Create, &url, Bytes::new())
            .map(drop)
    }

    /// Appends `payload` to the end of the file.
    pub fn append(&self, payload: Bytes) -> Result<(), TransferError> {
        let url = self.target.operation_url(Operation::Append, &[]);
        self.redirected(Operation::Append, &url, payload).map(drop)
    }

    /// Reads from `offset`, at most `length` bytes when given.
    ///
    /// An empty result is a successful read at or past the end of the file.
    pub fn open_range(&self, offset: u64, length: Option<u64>) -> Result<Bytes, TransferError> {
        let mut params = vec![("offset", offset.to_string())];
        if let Some(length) = length {
            params.push(("length", length.to_string()));
        }
        let url = self.target.operation_url(Operation::Open, &params);
        self.redirected(Operation::Open, &url, Bytes::new())
            .map(Response::into_body)
    }

    /// Looks the file up, returning `None` if it does not exist.
    pub fn file_status(&self) -> Result<Option<FileStatus>, TransferError> {
        let operation = Operation::GetFileStatus;
        let url = self.target.operation_url(operation, &[]);
        let response = self.call(operation, &url, Bytes::new())?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                serde_json::from_slice::<FileStatusResponse>(response.body())
                    .map(|parsed| Some(parsed.file_status))
                    .map_err(|error| TransferError::Protocol {
                        operation,
                        reason: format!("malformed FileStatus body: {}", error),
                    })
            }
            status if status.is_redirection() => Err(TransferError::Protocol {
                operation,
                reason: format!("unexpected redirect with status {}", status),
            }),
            _ => Err(remote_error(operation, &response)),
        }
    }

    /// Runs the namenode step, then replays the request with `payload`
    /// against the datanode named in the redirect.
    fn redirected(
        &self,
        operation: Operation,
        url: &Url,
        payload: Bytes,
    ) -> Result<Response<Bytes>, TransferError> {
        let response = self.call(operation, url, Bytes::new())?;
        let location = redirect_location(operation, url, &response)?;

        let response = self.call(operation, &location, payload)?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status.is_redirection() {
            Err(TransferError::Protocol {
                operation,
                reason: format!("datanode answered with a second redirect ({})", status),
            })
        } else {
            Err(remote_error(operation, &response))
        }
    }

    fn call(
        &self,
        operation: Operation,
        url: &Url,
        payload: Bytes,
    ) -> Result<Response<Bytes>, TransferError> {
        let host = url.host_str().unwrap_or_default();

        let mut builder = Request::builder()
            .method(operation.method())
            .uri(url.as_str());
        if operation.is_write() {
            builder = builder.header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
        }
        let request = builder
            .body(payload)
            .map_err(|error| TransferError::Protocol {
                operation,
                reason: format!("invalid request URL {}: {}", url, error),
            })?;

        let started = Instant::now();
        let response = self
            .transport
            .send(request)
            .context(NetworkSnafu { operation, host })?;

        emit!(WebHdfsResponseReceived {
            operation,
            host,
            status: response.status(),
            roundtrip: started.elapsed(),
        });

        Ok(response)
    }
}

fn redirect_location(
    operation: Operation,
    url: &Url,
    response: &Response<Bytes>,
) -> Result<Url, TransferError> {
    let status = response.status();
    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .ok_or_else(|| TransferError::Protocol {
                operation,
                reason: format!("redirect ({}) without a Location header", status),
            })?;
        let location = location.to_str().map_err(|_| TransferError::Protocol {
            operation,
            reason: "Location header is not valid text".to_owned(),
        })?;
        url.join(location).map_err(|error| TransferError::Protocol {
            operation,
            reason: format!("malformed Location {:?}: {}", location, error),
        })
    } else if status.is_success() {
        Err(TransferError::Protocol {
            operation,
            reason: format!("expected a redirect to a datanode, got {}", status),
        })
    } else {
        Err(remote_error(operation, response))
    }
}

fn remote_error(operation: Operation, response: &Response<Bytes>) -> TransferError {
    let status = response.status();
    let message = match serde_json::from_slice::<RemoteExceptionResponse>(response.body()) {
        Ok(parsed) => format!(
            "{}: {}",
            parsed.remote_exception.exception, parsed.remote_exception.message
        ),
        Err(_) => {
            let body = response.body();
            let body = &body[..body.len().min(MAX_ERROR_BODY)];
            String::from_utf8_lossy(body).trim().to_owned()
        }
    };

    if operation.is_write() {
        TransferError::RemoteWrite {
            operation,
            status,
            message,
        }
    } else {
        TransferError::RemoteRead {
            operation,
            status,
            message,
        }
    }
}
