//! The WebHDFS REST operations needed to stream a single file.
//!
//! Data-carrying operations are two HTTP round trips: the namenode answers
//! with a `307` whose `Location` names a datanode, and the datanode receives
//! or returns the payload. [`WebHdfsClient`] hides the redirect so callers see
//! one call per operation.

mod client;
mod target;

use std::fmt;

use http::{Method, StatusCode};
use snafu::Snafu;

pub use self::client::{FileKind, FileStatus, WebHdfsClient};
pub use self::target::{FileTarget, WriteMode};
use crate::http::HttpError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Append,
    Open,
    GetFileStatus,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Append => "APPEND",
            Operation::Open => "OPEN",
            Operation::GetFileStatus => "GETFILESTATUS",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Operation::Create => Method::PUT,
            Operation::Append => Method::POST,
            Operation::Open | Operation::GetFileStatus => Method::GET,
        }
    }

    pub const fn is_write(self) -> bool {
        matches!(self, Operation::Create | Operation::Append)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransferError {
    #[snafu(display("{} request to {} failed: {}", operation, host, source))]
    Network {
        operation: Operation,
        host: String,
        source: HttpError,
    },
    #[snafu(display("{} protocol violation: {}", operation, reason))]
    Protocol { operation: Operation, reason: String },
    #[snafu(display("{} rejected with status {}: {}", operation, status, message))]
    RemoteWrite {
        operation: Operation,
        status: StatusCode,
        message: String,
    },
    #[snafu(display("{} failed with status {}: {}", operation, status, message))]
    RemoteRead {
        operation: Operation,
        status: StatusCode,
        message: String,
    },
}

impl TransferError {
    pub const fn operation(&self) -> Operation {
        match self {
            TransferError::Network { operation, .. }
            | TransferError::Protocol { operation, .. }
            | TransferError::RemoteWrite { operation, .. }
            | TransferError::RemoteRead { operation, .. } => *operation,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Connection failures, timeouts, server errors, `408` and `429` are
    /// transient. Protocol violations and every other status are not.
    pub fn is_transient(&self) -> bool {
        match self {
            TransferError::Network { .. } => true,
            TransferError::Protocol { .. } => false,
            TransferError::RemoteWrite { status, .. } | TransferError::RemoteRead { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }

    pub const fn error_type(&self) -> &'static str {
        match self {
            TransferError::Network { .. } => "network_failed",
            TransferError::Protocol { .. } => "protocol_violation",
            TransferError::RemoteWrite { .. } => "write_failed",
            TransferError::RemoteRead { .. } => "read_failed",
        }
    }
}
