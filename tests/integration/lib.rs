//! Round trips against a live WebHDFS endpoint.
//!
//! Run with `--features webhdfs-integration-tests` and `WEBHDFS_ADDRESS`
//! pointing at a namenode, e.g. `127.0.0.1:9870`.
#![cfg(feature = "webhdfs-integration-tests")]

use std::{
    io::Cursor,
    time::{SystemTime, UNIX_EPOCH},
};

use hdfs_stream::{
    SampleType, SamplesMut,
    config::RequestConfig,
    shutdown::ShutdownSignal,
    sinks::webhdfs::WebHdfsSinkConfig,
    sources::webhdfs::WebHdfsSourceConfig,
    stream::{StreamError, StreamProducer},
    topology::{run_sink, run_source},
    webhdfs::WriteMode,
};

fn address() -> String {
    std::env::var("WEBHDFS_ADDRESS").unwrap_or_else(|_| "127.0.0.1:9870".to_owned())
}

fn user() -> String {
    std::env::var("WEBHDFS_USER").unwrap_or_else(|_| "hadoop".to_owned())
}

fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}.bin", prefix, nanos)
}

fn sink_config(file: &str, mode: WriteMode, buffer_size: usize) -> WebHdfsSinkConfig {
    WebHdfsSinkConfig {
        file: file.to_owned(),
        folder: "/tmp/hdfs-stream-it/".to_owned(),
        webhdfs_address: address(),
        user: user(),
        sample_type: SampleType::Float32,
        buffer_size,
        mode,
        request: RequestConfig::default(),
    }
}

fn source_config(file: &str, buffer_size: usize) -> WebHdfsSourceConfig {
    WebHdfsSourceConfig {
        file: file.to_owned(),
        folder: "/tmp/hdfs-stream-it/".to_owned(),
        webhdfs_address: address(),
        user: user(),
        sample_type: SampleType::Float32,
        buffer_size,
        request: RequestConfig::default(),
    }
}

fn floats(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| (i as f32 * 0.25).to_ne_bytes())
        .collect()
}

#[test]
fn overwrite_then_read_back() {
    let file = unique_name("overwrite");
    let input = floats(1000);

    let mut sink = sink_config(&file, WriteMode::Overwrite, 1024)
        .build(ShutdownSignal::new())
        .unwrap();
    run_sink(&mut sink, Cursor::new(input.clone()), 100).unwrap();

    let mut source = source_config(&file, 1000).build(ShutdownSignal::new()).unwrap();
    let mut output = Vec::new();
    let summary = run_source(&mut source, &mut output, 77).unwrap();
    assert_eq!(summary.items, 1000);
    assert_eq!(output, input);
}

#[test]
fn append_extends_existing_file() {
    let file = unique_name("append");
    let first = floats(10);
    let second = floats(6);

    for chunk in [&first, &second] {
        let mut sink = sink_config(&file, WriteMode::Append, 16)
            .build(ShutdownSignal::new())
            .unwrap();
        run_sink(&mut sink, Cursor::new(chunk.clone()), 4).unwrap();
    }

    let mut source = source_config(&file, 8).build(ShutdownSignal::new()).unwrap();
    let mut output = Vec::new();
    run_source(&mut source, &mut output, 3).unwrap();
    assert_eq!(output, [first, second].concat());
}

#[test]
fn missing_file_is_reported() {
    let mut source = source_config(&unique_name("missing"), 8)
        .build(ShutdownSignal::new())
        .unwrap();
    let mut slots = [0f32; 4];
    let error = source
        .produce(SamplesMut::from(&mut slots[..]))
        .unwrap_err();
    assert!(matches!(error, StreamError::FileNotFound { .. }));
}
