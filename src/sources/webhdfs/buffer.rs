use bytes::{Buf, BytesMut};

use crate::{
    BufferContractError, SampleCodec, SamplesMut,
    internal_events::{
        WebHdfsBytesReceived, WebHdfsEmptyRead, WebHdfsEndOfFile, WebHdfsTransferError,
    },
    retries::{RetryPolicy, TransferRetryLogic},
    shutdown::ShutdownSignal,
    stream::{StreamError, Work},
    webhdfs::{FileKind, Operation, TransferError, WebHdfsClient},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    /// Nothing has been requested yet.
    Unopened,
    /// More of the file remains to be fetched.
    Reading,
    /// The whole file has been fetched; buffered samples remain.
    Draining,
    /// Every sample has been handed out.
    Exhausted,
    /// A transfer or accounting failure ended the stream.
    Failed,
}

/// Serves samples out of range reads of at most `capacity` bytes.
///
/// Bytes of an incomplete trailing sample are kept at the front of the buffer
/// and completed by the next read, so no sample is ever decoded from a
/// partial run.
pub struct ReadBuffer {
    client: WebHdfsClient,
    codec: SampleCodec,
    capacity: usize,
    buffer: BytesMut,
    position: u64,
    file_length: u64,
    state: ReaderState,
    retry: RetryPolicy,
    shutdown: ShutdownSignal,
}

impl ReadBuffer {
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
            position: 0,
            file_length: 0,
            state: ReaderState::Unopened,
            retry,
            shutdown,
        }
    }

    pub const fn state(&self) -> ReaderState {
        self.state
    }

    pub const fn codec(&self) -> SampleCodec {
        self.codec
    }

    /// Bytes of the remote file fetched so far.
    pub const fn position(&self) -> u64 {
        self.position
    }

    pub fn path(&self) -> &str {
        self.client.target().path()
    }

    /// Fills a prefix of `out` with buffered samples, fetching more of the
    /// file first if no whole sample is buffered.
    ///
    /// Returns `Done` once the file has been fully handed out.
    pub fn read(&mut self, out: SamplesMut<'_>) -> Result<Work, StreamError> {
        let width = self.codec.width();
        loop {
            match self.state {
                ReaderState::Exhausted => return Ok(Work::Done),
                ReaderState::Failed => {
                    return Err(StreamError::Halted {
                        path: self.path().to_owned(),
                    });
                }
                ReaderState::Unopened => self.open()?,
                ReaderState::Reading if self.buffer.len() < width => self.fill()?,
                ReaderState::Draining if self.buffer.len() < width => {
                    return self.finish_draining();
                }
                ReaderState::Reading | ReaderState::Draining => break,
            }
        }

        let count = self.codec.whole_samples(self.buffer.len()).min(out.len());
        let byte_len = count * width;
        let written = self
            .codec
            .unpack_into(&self.buffer[..byte_len], out)
            .map_err(|error| self.fail(error))?;
        self.buffer.advance(byte_len);
        Ok(Work::Items(written))
    }

    fn finish_draining(&mut self) -> Result<Work, StreamError> {
        if self.buffer.is_empty() {
            self.state = ReaderState::Exhausted;
            return Ok(Work::Done);
        }
        Err(self.fail(BufferContractError::PartialSample {
            remaining: self.buffer.len(),
            sample_type: self.codec.sample_type(),
        }))
    }

    fn fail(&mut self, error: BufferContractError) -> StreamError {
        self.state = ReaderState::Failed;
        error.into()
    }

    /// Learns the file length, refusing missing files and directories.
    fn open(&mut self) -> Result<(), StreamError> {
        let status = self.with_retries(Operation::GetFileStatus, |client| client.file_status())?;
        let path = self.path().to_owned();
        match status {
            None => {
                self.state = ReaderState::Failed;
                Err(StreamError::FileNotFound { path })
            }
            Some(status) if status.kind == FileKind::Directory => {
                self.state = ReaderState::Failed;
                Err(StreamError::NotAFile { path })
            }
            Some(status) => {
                self.file_length = status.length;
                self.state = ReaderState::Reading;
                debug!(
                    message = "Opened remote file.",
                    path = %path,
                    file_length = status.length,
                );
                Ok(())
            }
        }
    }

    /// Requests enough bytes to top the buffer up to capacity.
    fn fill(&mut self) -> Result<(), StreamError> {
        if self.position >= self.file_length {
            self.end_of_file();
            return Ok(());
        }

        let requested = (self.capacity - self.buffer.len()) as u64;
        let mut empty_reads = 0;
        let chunk = loop {
            let position = self.position;
            let chunk = self.with_retries(Operation::Open, |client| {
                client.open_range(position, Some(requested))
            })?;
            if !chunk.is_empty() {
                break chunk;
            }

            emit!(WebHdfsEmptyRead {
                path: self.path(),
                offset: self.position,
                file_length: self.file_length,
            });
            empty_reads += 1;
            if empty_reads == 1 && self.shutdown.wait_timeout(self.retry.backoff(1)) {
                debug!(
                    message = "Shutdown requested while waiting to re-read; reader stops.",
                    path = self.path(),
                    offset = self.position,
                );
                self.buffer.clear();
                self.state = ReaderState::Exhausted;
                return Ok(());
            }
            if empty_reads > 1 {
                self.state = ReaderState::Failed;
                return Err(StreamError::UnexpectedEmptyRead {
                    path: self.path().to_owned(),
                    offset: self.position,
                    length: self.file_length,
                });
            }
        };

        let received = chunk.len() as u64;
        if received > requested {
            let source = TransferError::Protocol {
                operation: Operation::Open,
                reason: format!("asked for {} bytes, received {}", requested, received),
            };
            return Err(self.transfer_failed(source));
        }

        self.buffer.extend_from_slice(&chunk);
        self.position += received;
        emit!(WebHdfsBytesReceived {
            byte_size: chunk.len(),
            path: self.path(),
        });

        if received < requested || self.position >= self.file_length {
            self.end_of_file();
        }
        Ok(())
    }

    fn end_of_file(&mut self) {
        self.state = ReaderState::Draining;
        emit!(WebHdfsEndOfFile {
            path: self.path(),
            position: self.position,
        });
    }

    fn transfer_failed(&mut self, source: TransferError) -> StreamError {
        emit!(WebHdfsTransferError {
            path: self.path(),
            error: &source,
        });
        self.state = ReaderState::Failed;
        StreamError::Transfer {
            path: self.path().to_owned(),
            source,
        }
    }

    fn with_retries<T>(
        &mut self,
        operation: Operation,
        f: impl Fn(&WebHdfsClient) -> Result<T, TransferError>,
    ) -> Result<T, StreamError> {
        let client = &self.client;
        let result = self
            .retry
            .call(&TransferRetryLogic, &self.shutdown, operation.as_str(), || {
                f(client)
            });
        result.map_err(|error| self.transfer_failed(error.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::StatusCode;
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::{
        SampleBuf, SampleType,
        internal_events::{clear_recorded_events, event_recorded},
        test_util::{Call, Fault, MockWebHdfs, NAMENODE},
        webhdfs::FileTarget,
    };

    const PATH: &str = "/user/hadoop/in.bin";

    fn reader(mock: &MockWebHdfs, ty: SampleType, capacity: usize) -> ReadBuffer {
        reader_with_retries(mock, ty, capacity, RetryPolicy::none())
    }

    fn reader_with_retries(
        mock: &MockWebHdfs,
        ty: SampleType,
        capacity: usize,
        retry: RetryPolicy,
    ) -> ReadBuffer {
        let target = FileTarget::new(NAMENODE, "/user/hadoop", "in.bin", "hadoop").unwrap();
        ReadBuffer::new(
            WebHdfsClient::new(target, mock.transport()),
            SampleCodec::new(ty),
            capacity,
            retry,
            ShutdownSignal::new(),
        )
    }

    /// Drains the reader `slots` items at a time, collecting the raw bytes.
    fn drain(reader: &mut ReadBuffer, slots: usize) -> Result<Vec<u8>, StreamError> {
        let ty = reader.codec().sample_type();
        let mut bytes = BytesMut::new();
        loop {
            let mut out = SampleBuf::zeroed(ty, slots);
            match reader.read(out.as_samples_mut())? {
                Work::Items(count) => {
                    out.truncate(count);
                    reader.codec().pack(out.as_samples(), &mut bytes).unwrap();
                }
                Work::Done => return Ok(bytes.to_vec()),
            }
        }
    }

    #[test]
    fn twenty_bytes_of_int16_through_eight_byte_buffer() {
        let values: Vec<i16> = (1..=10).collect();
        let mut contents = BytesMut::new();
        sample_codecs::pack(&values, &mut contents);
        let mock = MockWebHdfs::new().with_file(PATH, contents.to_vec());
        let mut reader = reader(&mock, SampleType::Int16, 8);

        let mut produced = Vec::new();
        loop {
            let mut out = [0i16; 16];
            match reader.read(SamplesMut::from(&mut out[..])).unwrap() {
                Work::Items(count) => produced.extend_from_slice(&out[..count]),
                Work::Done => break,
            }
        }

        assert_eq!(produced, values);
        assert_eq!(mock.opens(), 3);
        assert_eq!(mock.served(), vec![8, 8, 4]);
        assert_eq!(reader.state(), ReaderState::Exhausted);
        assert_eq!(reader.read(SamplesMut::from(&mut [0i16; 4][..])).unwrap(), Work::Done);
        assert_eq!(mock.opens(), 3);
    }

    #[test]
    fn requests_follow_stream_position() {
        let mock = MockWebHdfs::new().with_file(PATH, (0u8..12).collect());
        let mut reader = reader(&mock, SampleType::Int32, 8);
        assert_eq!(drain(&mut reader, 1).unwrap(), (0u8..12).collect::<Vec<_>>());

        let opens: Vec<_> = mock
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Open { offset, length, .. } => Some((offset, length)),
                _ => None,
            })
            .collect();
        assert_eq!(opens, vec![(0, Some(8)), (8, Some(8))]);
        assert_eq!(reader.position(), 12);
    }

    #[test]
    fn exact_multiple_needs_no_trailing_request() {
        let mock = MockWebHdfs::new().with_file(PATH, vec![7; 16]);
        let mut reader = reader(&mock, SampleType::Byte, 8);
        assert_eq!(drain(&mut reader, 3).unwrap(), vec![7; 16]);
        assert_eq!(mock.served(), vec![8, 8]);
    }

    #[test]
    fn holds_partial_samples_over_refills() {
        let contents: Vec<u8> = (0u8..24).collect();
        let mock = MockWebHdfs::new().with_file(PATH, contents.clone());
        let mut reader = reader(&mock, SampleType::Complex64, 10);

        assert_eq!(drain(&mut reader, 4).unwrap(), contents);
        // 10 bytes, then 8 more behind the 2 held over, then the last 6.
        assert_eq!(mock.served(), vec![10, 8, 6]);
    }

    #[test]
    fn trailing_partial_sample_is_a_contract_error() {
        let mock = MockWebHdfs::new().with_file(PATH, vec![1; 9]);
        let mut reader = reader(&mock, SampleType::Int32, 8);

        let error = drain(&mut reader, 8).unwrap_err();
        assert!(matches!(
            error,
            StreamError::BufferContract {
                source: BufferContractError::PartialSample { remaining: 1, .. }
            }
        ));
        assert_eq!(reader.state(), ReaderState::Failed);
        assert!(matches!(
            reader.read(SamplesMut::from(&mut [0i32; 1][..])),
            Err(StreamError::Halted { .. })
        ));
    }

    #[test]
    fn empty_file_ends_without_reading() {
        let mock = MockWebHdfs::new().with_file(PATH, Vec::new());
        let mut reader = reader(&mock, SampleType::Float32, 8);
        assert!(drain(&mut reader, 4).unwrap().is_empty());
        assert_eq!(mock.opens(), 0);
    }

    #[test]
    fn missing_file_and_directory_are_refused() {
        let mock = MockWebHdfs::new();
        let error = drain(&mut reader(&mock, SampleType::Byte, 8), 1).unwrap_err();
        assert!(matches!(error, StreamError::FileNotFound { .. }));

        let mock = MockWebHdfs::new().with_directory(PATH);
        let error = drain(&mut reader(&mock, SampleType::Byte, 8), 1).unwrap_err();
        assert!(matches!(error, StreamError::NotAFile { .. }));
        assert_eq!(error.error_type(), "invalid_target");
    }

    #[test]
    fn empty_read_inside_file_is_retried_once() {
        clear_recorded_events();
        let mock = MockWebHdfs::new().with_file(PATH, vec![3; 8]);
        mock.fail_next(Operation::Open, Fault::EmptyBody);
        let mut reader = reader(&mock, SampleType::Byte, 8);

        assert_eq!(drain(&mut reader, 8).unwrap(), vec![3; 8]);
        assert_eq!(mock.opens(), 2);
        assert!(event_recorded("WebHdfsEmptyRead"));
    }

    #[test]
    fn repeated_empty_reads_fail() {
        let mock = MockWebHdfs::new().with_file(PATH, vec![3; 8]);
        mock.fail_next(Operation::Open, Fault::EmptyBody);
        mock.fail_next(Operation::Open, Fault::EmptyBody);
        let mut reader = reader(&mock, SampleType::Byte, 8);

        let error = drain(&mut reader, 8).unwrap_err();
        assert!(matches!(
            error,
            StreamError::UnexpectedEmptyRead {
                offset: 0,
                length: 8,
                ..
            }
        ));
        assert_eq!(mock.opens(), 2);
    }

    #[test]
    fn shutdown_during_empty_read_wait_ends_stream() {
        let mock = MockWebHdfs::new().with_file(PATH, vec![3; 8]);
        mock.fail_next(Operation::Open, Fault::EmptyBody);
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        let target = FileTarget::new(NAMENODE, "/user/hadoop", "in.bin", "hadoop").unwrap();
        let mut reader = ReadBuffer::new(
            WebHdfsClient::new(target, mock.transport()),
            SampleCodec::new(SampleType::Byte),
            8,
            RetryPolicy::new(0, Duration::from_secs(30), Duration::from_secs(30)),
            shutdown,
        );

        assert_eq!(drain(&mut reader, 8).unwrap(), Vec::<u8>::new());
        assert_eq!(reader.state(), ReaderState::Exhausted);
        assert_eq!(mock.opens(), 1);
    }

    #[test]
    fn transient_read_failures_are_retried() {
        let mock = MockWebHdfs::new().with_file(PATH, vec![5; 4]);
        mock.fail_next(
            Operation::Open,
            Fault::DatanodeStatus(StatusCode::INTERNAL_SERVER_ERROR),
        );
        let retry = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(1));
        let mut reader = reader_with_retries(&mock, SampleType::Byte, 8, retry);

        assert_eq!(drain(&mut reader, 8).unwrap(), vec![5; 4]);
    }

    #[test]
    fn permanent_read_failure_halts() {
        let mock = MockWebHdfs::new().with_file(PATH, vec![5; 4]);
        mock.fail_next(Operation::Open, Fault::Status(StatusCode::FORBIDDEN));
        let retry = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(1));
        let mut reader = reader_with_retries(&mock, SampleType::Byte, 8, retry);

        let error = drain(&mut reader, 8).unwrap_err();
        assert!(matches!(
            error,
            StreamError::Transfer {
                source: TransferError::RemoteRead { .. },
                ..
            }
        ));
        assert_eq!(mock.opens(), 1);
    }

    proptest! {
        #[test]
        fn reads_back_every_byte_once(
            samples in 0usize..120,
            width_index in 0usize..5,
            extra in 0usize..16,
            slots in 1usize..20,
        ) {
            let ty = SampleType::ALL[width_index];
            let capacity = ty.width() + extra;
            let contents: Vec<u8> = (0..samples * ty.width()).map(|i| (i % 251) as u8).collect();
            let mock = MockWebHdfs::new().with_file(PATH, contents.clone());
            let mut reader = reader(&mock, ty, capacity);

            prop_assert_eq!(drain(&mut reader, slots).unwrap(), contents);
            prop_assert!(mock.served().iter().all(|len| *len <= capacity));
            prop_assert_eq!(mock.served().iter().sum::<usize>(), samples * ty.width());
        }
    }
}
