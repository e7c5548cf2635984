//! A single-threaded scheduler that drives one block against a byte stream.
//!
//! Stands in for a dataflow runtime: it hands a consumer runs of decoded
//! samples, or gives a producer slots to fill, one call at a time until the
//! block reports `Done` or fails.

use std::io::{self, Read, Write};

use bytes::{Buf, BytesMut};
use snafu::{ResultExt, Snafu};

use crate::{
    BufferContractError, SampleBuf, SampleCodec,
    stream::{StreamConsumer, StreamError, StreamProducer, Work},
};

/// Items handed to a block per work call.
pub const DEFAULT_CHUNK_ITEMS: usize = 8192;

#[derive(Debug, Snafu)]
pub enum RunError {
    #[snafu(display("Failed to read input: {}", source))]
    ReadInput { source: io::Error },
    #[snafu(display("Failed to write output: {}", source))]
    WriteOutput { source: io::Error },
    #[snafu(display("Malformed sample data: {}", source))]
    Codec { source: BufferContractError },
    #[snafu(display("{}", source))]
    Stream { source: StreamError },
}

/// What a finished run moved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub items: u64,
    /// Whether the block stopped before the input or file ran out.
    pub stopped: bool,
}

/// Feeds raw host-order samples from `input` into `sink`, then finishes it.
pub fn run_sink<C: StreamConsumer>(
    sink: &mut C,
    mut input: impl Read,
    chunk_items: usize,
) -> Result<RunSummary, RunError> {
    let codec = SampleCodec::new(sink.input_type());
    let chunk_bytes = chunk_items.max(1) * codec.width();
    let mut pending = BytesMut::with_capacity(chunk_bytes);
    let mut summary = RunSummary::default();

    'input: loop {
        let mut chunk = Vec::with_capacity(chunk_bytes);
        let read = input
            .by_ref()
            .take(chunk_bytes as u64)
            .read_to_end(&mut chunk)
            .context(ReadInputSnafu)?;
        if read == 0 {
            break;
        }
        pending.extend_from_slice(&chunk);

        let count = codec.whole_samples(pending.len());
        let byte_len = count * codec.width();
        let items = codec
            .unpack(&pending[..byte_len], count)
            .context(CodecSnafu)?;
        pending.advance(byte_len);

        let mut offset = 0;
        while offset < items.len() {
            let run = items.as_samples().slice(offset..items.len());
            match sink.consume(run).context(StreamSnafu)? {
                Work::Items(taken) => {
                    offset += taken;
                    summary.items += taken as u64;
                }
                Work::Done => {
                    summary.stopped = true;
                    break 'input;
                }
            }
        }
    }

    if !summary.stopped && !pending.is_empty() {
        // Whole samples already handed to the sink still reach the file.
        sink.finish().context(StreamSnafu)?;
        return Err(RunError::Codec {
            source: BufferContractError::PartialSample {
                remaining: pending.len(),
                sample_type: codec.sample_type(),
            },
        });
    }

    sink.finish().context(StreamSnafu)?;
    info!(message = "Sink stream finished.", items = summary.items, stopped = summary.stopped);
    Ok(summary)
}

/// Writes every sample `source` produces to `output` as raw host-order bytes.
pub fn run_source<P: StreamProducer>(
    source: &mut P,
    mut output: impl Write,
    chunk_items: usize,
) -> Result<RunSummary, RunError> {
    let codec = SampleCodec::new(source.output_type());
    let mut slots = SampleBuf::zeroed(codec.sample_type(), chunk_items.max(1));
    let mut bytes = BytesMut::with_capacity(slots.len() * codec.width());
    let mut summary = RunSummary::default();

    loop {
        match source.produce(slots.as_samples_mut()).context(StreamSnafu)? {
            Work::Items(produced) => {
                codec
                    .pack(slots.as_samples().slice(0..produced), &mut bytes)
                    .context(CodecSnafu)?;
                output.write_all(&bytes).context(WriteOutputSnafu)?;
                bytes.clear();
                summary.items += produced as u64;
            }
            Work::Done => break,
        }
    }

    output.flush().context(WriteOutputSnafu)?;
    info!(message = "Source stream finished.", items = summary.items);
    Ok(summary)
}
