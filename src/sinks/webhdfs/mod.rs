//! The `webhdfs` sink: persists a sample stream as HDFS file content.

mod buffer;
mod config;
mod sink;

pub use self::buffer::{WriteBuffer, WriterState};
pub use self::config::WebHdfsSinkConfig;
pub use self::sink::WebHdfsSink;
