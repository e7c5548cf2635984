//! Stream typed sample data into and out of HDFS over WebHDFS.
//!
//! The crate provides two scheduler-facing blocks: a [`sinks::webhdfs::WebHdfsSink`]
//! that persists a sample stream as appended or overwritten HDFS file content,
//! and a [`sources::webhdfs::WebHdfsSource`] that replays an HDFS file as a
//! sample stream. Both run inside a single-threaded cooperative scheduler and
//! block the calling thread for the duration of each WebHDFS request.

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod internal_events;

pub mod app;
pub mod cli;
pub mod config;
pub mod http;
pub mod retries;
pub mod shutdown;
pub mod sinks;
pub mod sources;
pub mod stream;
#[cfg(test)]
pub mod test_util;
pub mod topology;
pub mod trace;
pub mod webhdfs;

pub use sample_codecs::{
    BufferContractError, Complex32, Sample, SampleBuf, SampleCodec, SampleType, Samples,
    SamplesMut,
};

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
