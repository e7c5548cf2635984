use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::{ReadBuffer, WebHdfsSource};
use crate::{
    SampleCodec, SampleType,
    config::{
        BuildTransportSnafu, ConfigError, GenerateConfig, RequestConfig, default_buffer_size,
        default_sample_type, default_user, validate_buffer_size,
    },
    http::{HttpClient, HttpTransport},
    shutdown::ShutdownSignal,
    webhdfs::{FileTarget, WebHdfsClient},
};

/// Configuration for the `webhdfs` source.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WebHdfsSourceConfig {
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

    /// Item type of the produced stream.
    #[serde(default = "default_sample_type", alias = "output_type")]
    pub sample_type: SampleType,

    /// Largest range requested per read.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default)]
    pub request: RequestConfig,
}

impl GenerateConfig for WebHdfsSourceConfig {
    fn generate_config() -> Result<toml::Value, toml::ser::Error> {
        toml::Value::try_from(Self {
            file: "samples.bin".to_owned(),
            folder: "/user/hadoop/".to_owned(),
            webhdfs_address: "127.0.0.1:9870".to_owned(),
            user: default_user(),
            sample_type: default_sample_type(),
            buffer_size: default_buffer_size(),
            request: RequestConfig::default(),
        })
    }
}

impl WebHdfsSourceConfig {
    pub fn target(&self) -> Result<FileTarget, ConfigError> {
        validate_buffer_size(self.buffer_size, self.sample_type)?;
        self.request.validate()?;
        FileTarget::new(&self.webhdfs_address, &self.folder, &self.file, &self.user)
    }

    pub fn build(&self, shutdown: ShutdownSignal) -> Result<WebHdfsSource, ConfigError> {
        let transport = HttpClient::new(self.request.timeout()).context(BuildTransportSnafu)?;
        self.build_with_transport(Arc::new(transport), shutdown)
    }

    pub fn build_with_transport(
        &self,
        transport: Arc<dyn HttpTransport>,
        shutdown: ShutdownSignal,
    ) -> Result<WebHdfsSource, ConfigError> {
        let target = self.target()?;
        let buffer = ReadBuffer::new(
            WebHdfsClient::new(target, transport),
            SampleCodec::new(self.sample_type),
            self.buffer_size,
            self.request.retry_policy(),
            shutdown.clone(),
        );
        Ok(WebHdfsSource::new(buffer, shutdown))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn generate_config() {
        let generated = WebHdfsSourceConfig::generate_config().unwrap();
        let parsed: WebHdfsSourceConfig = generated.try_into().unwrap();
        assert!(parsed.target().is_ok());
    }

    #[test]
    fn parses_minimal_config() {
        let config: WebHdfsSourceConfig = toml::from_str(indoc! {r#"
            file = "in.bin"
            folder = "/user/mxl/output"
            webhdfs_address = "http://192.168.10.20:9870"
            sample_type = "short"
            buffer_size = 8
        "#})
        .unwrap();

        assert_eq!(config.sample_type, SampleType::Int16);
        assert_eq!(config.user, "hadoop");
        assert_eq!(config.target().unwrap().path(), "/user/mxl/output/in.bin");
    }

    #[test]
    fn has_no_write_mode() {
        let result = toml::from_str::<WebHdfsSourceConfig>(indoc! {r#"
            file = "in.bin"
            folder = "/data"
            webhdfs_address = "namenode:9870"
            mode = "append"
        "#});
        assert!(result.is_err());
    }

    #[test]
    fn rejects_relative_folder_before_any_request() {
        let config: WebHdfsSourceConfig = toml::from_str(indoc! {r#"
            file = "in.bin"
            folder = "data"
            webhdfs_address = "namenode:9870"
        "#})
        .unwrap();
        assert!(matches!(
            config.build(ShutdownSignal::new()),
            Err(ConfigError::InvalidFolder { .. })
        ));
    }
}
