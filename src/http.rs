use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum HttpError {
    #[snafu(display("Failed to build HTTP client: {}", source))]
    BuildClient { source: reqwest::Error },
    #[snafu(display("Failed to make HTTP request: {}", source))]
    CallRequest { source: reqwest::Error },
    #[snafu(display("Failed to read HTTP response body: {}", source))]
    ReadBody { source: reqwest::Error },
    #[snafu(display("Request timed out after {:?}", timeout))]
    Timeout { timeout: Duration },
    #[snafu(display("Connection failed: {}", message))]
    Connect { message: String },
}

/// A blocking HTTP round trip.
///
/// Implementations must not follow redirects themselves: WebHDFS encodes the
/// datanode to talk to in the `Location` of a redirect, and the client needs
/// to see it. Every call must be bounded by a timeout.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError>;
}

/// `reqwest` backed transport.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(format!("hdfs-stream/{}", crate::get_version()))
            .build()
            .context(BuildClientSnafu)?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, error: reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout {
                timeout: self.timeout,
            }
        } else if error.is_connect() {
            HttpError::Connect {
                message: error.to_string(),
            }
        } else {
            HttpError::CallRequest { source: error }
        }
    }
}

impl HttpTransport for HttpClient {
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        let (parts, body) = request.into_parts();

        let response = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body.to_vec())
            .send()
            .map_err(|error| self.classify(error))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(|error| {
            if error.is_timeout() {
                self.classify(error)
            } else {
                HttpError::ReadBody { source: error }
            }
        })?;

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
