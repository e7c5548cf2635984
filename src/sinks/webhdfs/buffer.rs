use bytes::{Bytes, BytesMut};

use crate::{
    BufferContractError, SampleCodec, Samples,
    internal_events::{WebHdfsBytesSent, WebHdfsFileCreated, WebHdfsTransferError},
    retries::{RetryPolicy, TransferRetryLogic},
    shutdown::ShutdownSignal,
    stream::StreamError,
    webhdfs::{FileKind, Operation, TransferError, WebHdfsClient, WriteMode},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    /// No item has arrived yet and nothing has been sent.
    Unopened,
    /// The remote file exists and is ready for appends.
    Created,
    /// At least one append has succeeded.
    Appending,
    /// The stream ended and the last bytes were flushed.
    Closed,
    /// A transfer failed for good; nothing more is accepted.
    Failed,
}

/// Batches packed samples into appends of exactly `capacity` bytes.
///
/// Every flush is synchronous: the push that fills the buffer blocks until
/// the append succeeds or its retries run out.
pub struct WriteBuffer {
    client: WebHdfsClient,
    codec: SampleCodec,
    capacity: usize,
    buffer: BytesMut,
    state: WriterState,
    retry: RetryPolicy,
    shutdown: ShutdownSignal,
}

impl WriteBuffer {
    pub fn new(
        client: WebHdfsClient,
        codec: SampleCodec,
        capacity: usize,
        retry: RetryPolicy,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            client,
            codec,
            capacity,
            buffer: BytesMut::with_capacity(capacity),
            state: WriterState::Unopened,
            retry,
            shutdown,
        }
    }

    pub const fn state(&self) -> WriterState {
        self.state
    }

    pub const fn codec(&self) -> SampleCodec {
        self.codec
    }

    /// Bytes waiting for the next append.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn path(&self) -> &str {
        self.client.target().path()
    }

    /// Takes as many leading `items` as it needs to reach capacity and
    /// returns how many it took.
    ///
    /// An item whose bytes straddle the capacity boundary is split: its head
    /// completes the flushed payload and its tail starts the next one.
    pub fn push(&mut self, items: Samples<'_>) -> Result<usize, StreamError> {
        self.check_writable()?;
        if items.is_empty() {
            return Ok(0);
        }
        if items.sample_type() != self.codec.sample_type() {
            self.state = WriterState::Failed;
            return Err(BufferContractError::TypeMismatch {
                expected: self.codec.sample_type(),
                actual: items.sample_type(),
            }
            .into());
        }
        if self.state == WriterState::Unopened {
            self.open()?;
        }

        let room = self.capacity - self.buffer.len();
        let count = room.div_ceil(self.codec.width()).min(items.len());
        if let Err(error) = self.codec.pack(items.slice(0..count), &mut self.buffer) {
            self.state = WriterState::Failed;
            return Err(error.into());
        }

        while self.buffer.len() >= self.capacity {
            let payload = self.buffer.split_to(self.capacity).freeze();
            self.flush(payload)?;
        }
        Ok(count)
    }

    /// Flushes whatever is buffered and closes the stream.
    ///
    /// A writer that never received an item closes without touching the
    /// remote file. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), StreamError> {
        match self.state {
            WriterState::Closed => return Ok(()),
            WriterState::Unopened => {
                self.state = WriterState::Closed;
                return Ok(());
            }
            _ => self.check_writable()?,
        }

        if !self.buffer.is_empty() {
            let payload = self.buffer.split().freeze();
            self.flush(payload)?;
        }
        self.state = WriterState::Closed;
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StreamError> {
        let path = self.path().to_owned();
        match self.state {
            WriterState::Closed => Err(StreamError::Closed { path }),
            WriterState::Failed => Err(StreamError::Halted { path }),
            _ => Ok(()),
        }
    }

    /// Makes sure the remote file exists in the shape the mode asks for.
    fn open(&mut self) -> Result<(), StreamError> {
        match self.client.target().mode() {
            WriteMode::Overwrite => self.create(true)?,
            WriteMode::Append => {
                let status = self.with_retries(Operation::GetFileStatus, |client| {
                    client.file_status()
                })?;
                match status {
                    None => self.create(false)?,
                    Some(status) if status.kind == FileKind::Directory => {
                        self.state = WriterState::Failed;
                        return Err(StreamError::NotAFile {
                            path: self.path().to_owned(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        self.state = WriterState::Created;
        Ok(())
    }

    fn create(&mut self, overwrite: bool) -> Result<(), StreamError> {
        self.with_retries(Operation::Create, |client| client.create(overwrite))?;
        emit!(WebHdfsFileCreated {
            path: self.path(),
            overwrite,
        });
        Ok(())
    }

    fn flush(&mut self, payload: Bytes) -> Result<(), StreamError> {
        let byte_size = payload.len();
        self.with_retries(Operation::Append, |client| client.append(payload.clone()))?;
        emit!(WebHdfsBytesSent {
            byte_size,
            path: self.path(),
        });
        self.state = WriterState::Appending;
        Ok(())
    }

    /// Runs `f` under the retry policy; a final failure fails the writer.
    fn with_retries<T>(
        &mut self,
        operation: Operation,
        f: impl Fn(&WebHdfsClient) -> Result<T, TransferError>,
    ) -> Result<T, StreamError> {
        let client = &self.client;
        self.retry
            .call(&TransferRetryLogic, &self.shutdown, operation.as_str(), || {
                f(client)
            })
            .map_err(|error| {
                let source = error.into_inner();
                emit!(WebHdfsTransferError {
                    path: client.target().path(),
                    error: &source,
                });
                self.state = WriterState::Failed;
                StreamError::Transfer {
                    path: client.target().path().to_owned(),
                    source,
                }
            })
    }
}
