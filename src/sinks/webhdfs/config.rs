use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::{WebHdfsSink, WriteBuffer};
use crate::{
    SampleCodec, SampleType,
    config::{
        BuildTransportSnafu, ConfigError, GenerateConfig, RequestConfig, default_buffer_size,
        default_sample_type, default_user, validate_buffer_size,
    },
    http::{HttpClient, HttpTransport},
    shutdown::ShutdownSignal,
    webhdfs::{FileTarget, WebHdfsClient, WriteMode},
};

/// Configuration for the `webhdfs` sink.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WebHdfsSinkConfig {
    /// Name of the remote file.
    #[serde(alias = "filename")]
    pub file: String,

    /// Absolute remote folder holding the file.
    pub folder: String,

    /// Namenode address, `host:port` or a full `http(s)://` base URL.
    #[serde(alias = "webhdfs_addr")]
    pub webhdfs_address: String,

    /// HDFS user the requests run as.
    #[serde(default = "default_user")]
    pub user: String,

    /// Item type of the incoming stream.
    #[serde(default = "default_sample_type", alias = "input_type")]
    pub sample_type: SampleType,

    /// Bytes buffered before each append.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether to append to or replace an existing file.
    #[serde(default)]
    pub mode: WriteMode,

    #[serde(default)]
    pub request: RequestConfig,
}

impl GenerateConfig for WebHdfsSinkConfig {
    fn generate_config() -> Result<toml::Value, toml::ser::Error> {
        toml::Value::try_from(Self {
            file: "samples.bin".to_owned(),
            folder: "/user/hadoop/".to_owned(),
            webhdfs_address: "127.0.0.1:9870".to_owned(),
            user: default_user(),
            sample_type: default_sample_type(),
            buffer_size: default_buffer_size(),
            mode: WriteMode::default(),
            request: RequestConfig::default(),
        })
    }
}

impl WebHdfsSinkConfig {
    /// Checks every field without touching the network.
    pub fn target(&self) -> Result<FileTarget, ConfigError> {
        validate_buffer_size(self.buffer_size, self.sample_type)?;
        self.request.validate()?;
        Ok(
            FileTarget::new(&self.webhdfs_address, &self.folder, &self.file, &self.user)?
                .with_mode(self.mode),
        )
    }

    pub fn build(&self, shutdown: ShutdownSignal) -> Result<WebHdfsSink, ConfigError> {
        let transport = HttpClient::new(self.request.timeout()).context(BuildTransportSnafu)?;
        self.build_with_transport(Arc::new(transport), shutdown)
    }

    pub fn build_with_transport(
        &self,
        transport: Arc<dyn HttpTransport>,
        shutdown: ShutdownSignal,
    ) -> Result<WebHdfsSink, ConfigError> {
        let target = self.target()?;
        let buffer = WriteBuffer::new(
            WebHdfsClient::new(target, transport),
            SampleCodec::new(self.sample_type),
            self.buffer_size,
            self.request.retry_policy(),
            shutdown.clone(),
        );
        Ok(WebHdfsSink::new(buffer, shutdown))
    }
}
