//! The `webhdfs` source: replays an HDFS file as a sample stream.

mod buffer;
mod config;
mod source;

pub use self::buffer::{ReadBuffer, ReaderState};
pub use self::config::WebHdfsSourceConfig;
pub use self::source::WebHdfsSource;
