use super::{ReadBuffer, ReaderState};
use crate::{
    SampleType, SamplesMut,
    internal_events::StreamTerminated,
    shutdown::ShutdownSignal,
    stream::{StreamError, StreamProducer, Work},
};

const BLOCK: &str = "webhdfs_source";

/// Scheduler-facing source block.
pub struct WebHdfsSource {
    buffer: ReadBuffer,
    shutdown: ShutdownSignal,
}

impl WebHdfsSource {
    pub const fn new(buffer: ReadBuffer, shutdown: ShutdownSignal) -> Self {
        Self { buffer, shutdown }
    }

    pub const fn state(&self) -> ReaderState {
        self.buffer.state()
    }
}

impl StreamProducer for WebHdfsSource {
    fn output_type(&self) -> SampleType {
        self.buffer.codec().sample_type()
    }

    fn produce(&mut self, out: SamplesMut<'_>) -> Result<Work, StreamError> {
        if self.shutdown.is_triggered() {
            debug!(message = "Shutdown requested; source stops producing.", path = self.buffer.path());
            return Ok(Work::Done);
        }
        self.buffer.read(out).inspect_err(|error| {
            emit!(StreamTerminated { block: BLOCK, error });
        })
    }
}
