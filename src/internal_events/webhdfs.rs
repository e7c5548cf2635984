use std::time::Duration;

use http::StatusCode;
use metrics::counter;

use super::InternalEvent;
use crate::{
    stream::StreamError,
    webhdfs::{Operation, TransferError},
};

#[derive(Debug)]
pub struct WebHdfsResponseReceived<'a> {
    pub operation: Operation,
    pub host: &'a str,
    pub status: StatusCode,
    pub roundtrip: Duration,
}

impl InternalEvent for WebHdfsResponseReceived<'_> {
    fn emit(self) {
        debug!(
            message = "WebHDFS response received.",
            operation = %self.operation,
            host = self.host,
            status = %self.status,
            roundtrip_ms = self.roundtrip.as_millis() as u64,
        );
        counter!(
            "webhdfs_requests_total",
            "operation" => self.operation.as_str(),
            "status" => self.status.as_str().to_owned(),
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct WebHdfsFileCreated<'a> {
    pub path: &'a str,
    pub overwrite: bool,
}

impl InternalEvent for WebHdfsFileCreated<'_> {
    fn emit(self) {
        info!(
            message = "Created remote file.",
            path = self.path,
            overwrite = self.overwrite,
        );
    }
}

#[derive(Debug)]
pub struct WebHdfsBytesSent<'a> {
    pub byte_size: usize,
    pub path: &'a str,
}

impl InternalEvent for WebHdfsBytesSent<'_> {
    fn emit(self) {
        trace!(
            message = "Bytes sent.",
            byte_size = %self.byte_size,
            protocol = "webhdfs",
            path = self.path,
        );
        counter!(
            "component_sent_bytes_total",
            "protocol" => "webhdfs",
            "path" => self.path.to_owned(),
        )
        .increment(self.byte_size as u64);
    }
}

#[derive(Debug)]
pub struct WebHdfsBytesReceived<'a> {
    pub byte_size: usize,
    pub path: &'a str,
}

impl InternalEvent for WebHdfsBytesReceived<'_> {
    fn emit(self) {
        trace!(
            message = "Bytes received.",
            byte_size = %self.byte_size,
            protocol = "webhdfs",
            path = self.path,
        );
        counter!(
            "component_received_bytes_total",
            "protocol" => "webhdfs",
            "path" => self.path.to_owned(),
        )
        .increment(self.byte_size as u64);
    }
}

#[derive(Debug)]
pub struct WebHdfsEmptyRead<'a> {
    pub path: &'a str,
    pub offset: u64,
    pub file_length: u64,
}

impl InternalEvent for WebHdfsEmptyRead<'_> {
    fn emit(self) {
        warn!(
            message = "Empty read before end of remote file.",
            path = self.path,
            offset = self.offset,
            file_length = self.file_length,
        );
    }
}

#[derive(Debug)]
pub struct WebHdfsEndOfFile<'a> {
    pub path: &'a str,
    pub position: u64,
}

impl InternalEvent for WebHdfsEndOfFile<'_> {
    fn emit(self) {
        info!(
            message = "Reached end of remote file.",
            path = self.path,
            position = self.position,
        );
    }
}

#[derive(Debug)]
pub struct WebHdfsTransferError<'a> {
    pub path: &'a str,
    pub error: &'a TransferError,
}

impl InternalEvent for WebHdfsTransferError<'_> {
    fn emit(self) {
        let stage = if self.error.operation().is_write() {
            "sending"
        } else {
            "receiving"
        };
        error!(
            message = "WebHDFS request failed.",
            path = self.path,
            error = %self.error,
            error_type = self.error.error_type(),
            stage,
        );
        counter!(
            "component_errors_total",
            "error_type" => self.error.error_type(),
            "stage" => stage,
            "path" => self.path.to_owned(),
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct StreamTerminated<'a> {
    pub block: &'static str,
    pub error: &'a StreamError,
}

impl InternalEvent for StreamTerminated<'_> {
    fn emit(self) {
        error!(
            message = "Stream halted.",
            block = self.block,
            error = %self.error,
            error_type = self.error.error_type(),
        );
        counter!(
            "component_errors_total",
            "error_type" => self.error.error_type(),
            "stage" => "processing",
            "block" => self.block,
        )
        .increment(1);
    }
}
