use serde::{Deserialize, Serialize};
use snafu::ensure;
use url::Url;

use super::Operation;
use crate::config::{
    ConfigError, InvalidAddressSnafu, InvalidFileNameSnafu, InvalidFolderSnafu, InvalidUserSnafu,
};

/// How a sink treats an existing remote file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Keep existing content and append to it, creating the file if missing.
    #[default]
    #[serde(alias = "Append")]
    Append,

    /// Replace the file with the new stream.
    #[serde(alias = "Overwrite")]
    Overwrite,
}

/// The remote file a block streams to or from.
///
/// Built once at configuration time and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTarget {
    endpoint: Url,
    path: String,
    user: String,
    mode: WriteMode,
}

impl FileTarget {
    /// Validates and joins the configured parts into a single target.
    ///
    /// `address` is `host:port`, optionally prefixed by `http://` or
    /// `https://`. `folder` must be absolute; repeated or trailing separators
    /// are collapsed so that `folder` and `file_name` always join to exactly
    /// one absolute path.
    pub fn new(
        address: &str,
        folder: &str,
        file_name: &str,
        user: &str,
    ) -> Result<Self, ConfigError> {
        let endpoint = parse_endpoint(address)?;
        let path = join_path(folder, file_name)?;

        ensure!(
            !user.is_empty() && !user.chars().any(|c| c.is_whitespace() || c.is_control()),
            InvalidUserSnafu { user }
        );

        Ok(Self {
            endpoint,
            path,
            user: user.to_owned(),
            mode: WriteMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Absolute remote path of the file.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub const fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Namenode base URL.
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The namenode URL for `operation` on this file, with the user identity
    /// and any extra query parameters.
    pub fn operation_url(&self, operation: Operation, params: &[(&str, String)]) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(&format!("/webhdfs/v1{}", self.path));
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("op", operation.as_str())
                .append_pair("user.name", &self.user);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }
}

fn parse_endpoint(address: &str) -> Result<Url, ConfigError> {
    let address = address.trim();
    ensure!(
        !address.is_empty(),
        InvalidAddressSnafu {
            address,
            reason: "address is empty",
        }
    );

    let candidate = if address.contains("://") {
        address.to_owned()
    } else {
        format!("http://{}", address)
    };
    let url = Url::parse(&candidate).map_err(|error| ConfigError::InvalidAddress {
        address: address.to_owned(),
        reason: error.to_string(),
    })?;

    ensure!(
        matches!(url.scheme(), "http" | "https"),
        InvalidAddressSnafu {
            address,
            reason: format!("unsupported scheme {:?}", url.scheme()),
        }
    );
    ensure!(
        url.host_str().is_some_and(|host| !host.is_empty()),
        InvalidAddressSnafu {
            address,
            reason: "missing host",
        }
    );
    ensure!(
        (url.path().is_empty() || url.path() == "/") && url.query().is_none(),
        InvalidAddressSnafu {
            address,
            reason: "address must not carry a path or query",
        }
    );

    Ok(url)
}

fn join_path(folder: &str, file_name: &str) -> Result<String, ConfigError> {
    ensure!(
        folder.starts_with('/'),
        InvalidFolderSnafu {
            folder,
            reason: "folder must be an absolute path",
        }
    );

    let mut path = String::with_capacity(folder.len() + file_name.len() + 1);
    for segment in folder.split('/').filter(|segment| !segment.is_empty()) {
        ensure!(
            segment != "." && segment != "..",
            InvalidFolderSnafu {
                folder,
                reason: "relative segments are not allowed",
            }
        );
        path.push('/');
        path.push_str(segment);
    }

    ensure!(
        !file_name.is_empty() && file_name != "." && file_name != "..",
        InvalidFileNameSnafu {
            file_name,
            reason: "file name is empty or relative",
        }
    );
    ensure!(
        !file_name.contains('/'),
        InvalidFileNameSnafu {
            file_name,
            reason: "file name must not contain '/'",
        }
    );

    path.push('/');
    path.push_str(file_name);
    Ok(path)
}
