//! The capability pair a scheduler drives.
//!
//! A scheduler hands a consumer runs of input samples and a producer slots to
//! fill, always from one thread at a time. Each call reports how many items it
//! took or wrote, or that the block is done. An `Err` is terminal: the block
//! stops and the scheduler is expected to stop the graph.

use snafu::Snafu;

use crate::{BufferContractError, SampleType, Samples, SamplesMut, webhdfs::TransferError};

/// The result of one work call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Work {
    /// This many items were consumed or produced.
    Items(usize),
    /// The block has nothing more to do; the scheduler should not call again.
    Done,
}

/// A terminal stream failure.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StreamError {
    #[snafu(display("Transfer for {} failed: {}", path, source))]
    Transfer { path: String, source: TransferError },
    #[snafu(display("Buffer accounting failed: {}", source))]
    BufferContract { source: BufferContractError },
    #[snafu(display("Remote path {} is not a file", path))]
    NotAFile { path: String },
    #[snafu(display("Remote file {} does not exist", path))]
    FileNotFound { path: String },
    #[snafu(display(
        "Remote file {} returned no data at offset {} of {} bytes",
        path,
        offset,
        length
    ))]
    UnexpectedEmptyRead { path: String, offset: u64, length: u64 },
    #[snafu(display("Stream for {} is already closed", path))]
    Closed { path: String },
    #[snafu(display("Stream for {} halted after an earlier failure", path))]
    Halted { path: String },
}

impl StreamError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            StreamError::Transfer { source, .. } => source.error_type(),
            StreamError::BufferContract { .. } => "buffer_contract",
            StreamError::NotAFile { .. } | StreamError::FileNotFound { .. } => "invalid_target",
            StreamError::UnexpectedEmptyRead { .. } => "empty_read",
            StreamError::Closed { .. } | StreamError::Halted { .. } => "stream_closed",
        }
    }
}

impl From<BufferContractError> for StreamError {
    fn from(source: BufferContractError) -> Self {
        StreamError::BufferContract { source }
    }
}

/// A block that takes samples from the scheduler.
pub trait StreamConsumer {
    /// The item type of the input stream.
    fn input_type(&self) -> SampleType;

    /// Takes some prefix of `items`, reporting how many.
    fn consume(&mut self, items: Samples<'_>) -> Result<Work, StreamError>;

    /// Called once upstream has no more data.
    fn finish(&mut self) -> Result<(), StreamError>;
}

/// A block that hands samples to the scheduler.
pub trait StreamProducer {
    /// The item type of the output stream.
    fn output_type(&self) -> SampleType;

    /// Fills a prefix of `out`, reporting how many items were written.
    fn produce(&mut self, out: SamplesMut<'_>) -> Result<Work, StreamError>;
}
