use super::{WriteBuffer, WriterState};
use crate::{
    SampleType, Samples,
    internal_events::StreamTerminated,
    shutdown::ShutdownSignal,
    stream::{StreamConsumer, StreamError, Work},
};

const BLOCK: &str = "webhdfs_sink";

/// Scheduler-facing sink block.
pub struct WebHdfsSink {
    buffer: WriteBuffer,
    shutdown: ShutdownSignal,
}

impl WebHdfsSink {
    pub const fn new(buffer: WriteBuffer, shutdown: ShutdownSignal) -> Self {
        Self { buffer, shutdown }
    }

    pub const fn state(&self) -> WriterState {
        self.buffer.state()
    }

    fn terminate(&self, error: StreamError) -> StreamError {
        emit!(StreamTerminated {
            block: BLOCK,
            error: &error,
        });
        error
    }
}

impl StreamConsumer for WebHdfsSink {
    fn input_type(&self) -> SampleType {
        self.buffer.codec().sample_type()
    }

    fn consume(&mut self, items: Samples<'_>) -> Result<Work, StreamError> {
        if self.shutdown.is_triggered() {
            debug!(message = "Shutdown requested; sink stops consuming.", path = self.buffer.path());
            return Ok(Work::Done);
        }
        match self.buffer.push(items) {
            Ok(count) => Ok(Work::Items(count)),
            Err(error) => Err(self.terminate(error)),
        }
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        self.buffer.close().map_err(|error| self.terminate(error))?;
        debug!(message = "Sink closed.", path = self.buffer.path());
        Ok(())
    }
}
