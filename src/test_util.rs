//! An in-memory WebHDFS cluster for exercising the client and blocks without
//! a network.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use bytes::Bytes;
use http::{
    HeaderValue, Method, Request, Response, StatusCode,
    header::{CONTENT_TYPE, LOCATION},
};
use serde_json::json;
use url::Url;

use crate::{
    http::{HttpError, HttpTransport},
    webhdfs::Operation,
};

/// Address the mock namenode answers on.
pub const NAMENODE: &str = "namenode:9870";

const DATANODE: &str = "http://datanode:9864";

/// A logical WebHDFS operation, as seen by the namenode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Create { path: String, overwrite: bool },
    Append { path: String },
    Open { path: String, offset: u64, length: Option<u64> },
    GetFileStatus { path: String },
}

/// One HTTP request as it reached either node.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub host: String,
    pub query: String,
    pub body_len: usize,
}

/// A failure injected into the next request for an operation.
#[derive(Clone, Debug)]
pub enum Fault {
    /// The namenode never answers.
    Timeout,
    /// The namenode refuses the connection.
    ConnectionRefused,
    /// The namenode answers with this status.
    Status(StatusCode),
    /// The namenode answers `200` instead of redirecting.
    NoRedirect,
    /// The namenode redirects without a `Location`.
    MissingLocation,
    /// The namenode redirects to an unparseable `Location`.
    MalformedLocation,
    /// The datanode answers with this status.
    DatanodeStatus(StatusCode),
    /// The datanode returns no bytes for an `OPEN`.
    EmptyBody,
}

#[derive(Default)]
struct State {
    files: HashMap<String, Vec<u8>>,
    directories: HashSet<String>,
    calls: Vec<Call>,
    requests: Vec<RecordedRequest>,
    appended: Vec<usize>,
    served: Vec<usize>,
    faults: HashMap<Operation, VecDeque<Fault>>,
    datanode_faults: VecDeque<Fault>,
}

#[derive(Clone, Default)]
pub struct MockWebHdfs {
    state: Arc<Mutex<State>>,
}

impl MockWebHdfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, contents: Vec<u8>) -> Self {
        self.lock().files.insert(path.to_owned(), contents);
        self
    }

    pub fn with_directory(self, path: &str) -> Self {
        self.lock().directories.insert(path.to_owned());
        self
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::new(self.clone())
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn creates(&self) -> usize {
        self.count(|call| matches!(call, Call::Create { .. }))
    }

    pub fn opens(&self) -> usize {
        self.count(|call| matches!(call, Call::Open { .. }))
    }

    /// Payload sizes of every successful append, in order.
    pub fn appended(&self) -> Vec<usize> {
        self.lock().appended.clone()
    }

    /// Body sizes of every successful open, in order.
    pub fn served(&self) -> Vec<usize> {
        self.lock().served.clone()
    }

    pub fn fail_next(&self, operation: Operation, fault: Fault) {
        self.lock()
            .faults
            .entry(operation)
            .or_default()
            .push_back(fault);
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl HttpTransport for MockWebHdfs {
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        let url = Url::parse(&request.uri().to_string()).unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let path = url
            .path()
            .strip_prefix("/webhdfs/v1")
            .unwrap()
            .replace("%20", " ");
        let operation = match params["op"].as_str() {
            "CREATE" => Operation::Create,
            "APPEND" => Operation::Append,
            "OPEN" => Operation::Open,
            "GETFILESTATUS" => Operation::GetFileStatus,
            other => panic!("unexpected operation {}", other),
        };
        assert_eq!(request.method(), operation.method());
        assert!(params.contains_key("user.name"));

        let mut state = self.lock();
        let host = url.host_str().unwrap_or_default().to_owned();
        state.requests.push(RecordedRequest {
            method: request.method().clone(),
            host: host.clone(),
            query: url.query().unwrap_or_default().to_owned(),
            body_len: request.body().len(),
        });

        if host == "datanode" {
            datanode(&mut state, operation, &path, &params, request.into_body())
        } else {
            namenode(&mut state, operation, &path, &params, &url)
        }
    }
}

fn namenode(
    state: &mut State,
    operation: Operation,
    path: &str,
    params: &HashMap<String, String>,
    url: &Url,
) -> Result<Response<Bytes>, HttpError> {
    state.calls.push(match operation {
        Operation::Create => Call::Create {
            path: path.to_owned(),
            overwrite: params.get("overwrite").is_some_and(|v| v == "true"),
        },
        Operation::Append => Call::Append {
            path: path.to_owned(),
        },
        Operation::Open => Call::Open {
            path: path.to_owned(),
            offset: params["offset"].parse().unwrap(),
            length: params.get("length").map(|v| v.parse().unwrap()),
        },
        Operation::GetFileStatus => Call::GetFileStatus {
            path: path.to_owned(),
        },
    });

    let fault = state
        .faults
        .get_mut(&operation)
        .and_then(VecDeque::pop_front);
    match fault {
        Some(Fault::Timeout) => {
            return Err(HttpError::Timeout {
                timeout: Duration::from_secs(10),
            });
        }
        Some(Fault::ConnectionRefused) => {
            return Err(HttpError::Connect {
                message: "connection refused".to_owned(),
            });
        }
        Some(Fault::Status(status)) => return Ok(exception(status, "IOException", "injected")),
        Some(Fault::NoRedirect) => return Ok(empty(StatusCode::OK)),
        Some(Fault::MissingLocation) => return Ok(empty(StatusCode::TEMPORARY_REDIRECT)),
        Some(Fault::MalformedLocation) => return Ok(redirect("http://[datanode")),
        Some(fault @ (Fault::DatanodeStatus(_) | Fault::EmptyBody)) => {
            state.datanode_faults.push_back(fault)
        }
        None => {}
    }

    if operation == Operation::GetFileStatus {
        return Ok(if state.directories.contains(path) {
            json_response(json!({"FileStatus": {"length": 0, "type": "DIRECTORY"}}))
        } else if let Some(contents) = state.files.get(path) {
            json_response(json!({"FileStatus": {"length": contents.len(), "type": "FILE"}}))
        } else {
            not_found(path)
        });
    }

    if matches!(operation, Operation::Append | Operation::Open) && !state.files.contains_key(path)
    {
        return Ok(not_found(path));
    }

    Ok(redirect(&format!(
        "{}{}?{}",
        DATANODE,
        url.path(),
        url.query().unwrap_or_default()
    )))
}

fn datanode(
    state: &mut State,
    operation: Operation,
    path: &str,
    params: &HashMap<String, String>,
    body: Bytes,
) -> Result<Response<Bytes>, HttpError> {
    let fault = state.datanode_faults.pop_front();
    if let Some(Fault::DatanodeStatus(status)) = fault {
        return Ok(exception(status, "IOException", "injected"));
    }

    match operation {
        Operation::Create => {
            let overwrite = params.get("overwrite").is_some_and(|v| v == "true");
            if state.files.contains_key(path) && !overwrite {
                return Ok(exception(
                    StatusCode::FORBIDDEN,
                    "FileAlreadyExistsException",
                    path,
                ));
            }
            state.files.insert(path.to_owned(), body.to_vec());
            Ok(empty(StatusCode::CREATED))
        }
        Operation::Append => {
            let Some(contents) = state.files.get_mut(path) else {
                return Ok(not_found(path));
            };
            contents.extend_from_slice(&body);
            state.appended.push(body.len());
            Ok(empty(StatusCode::OK))
        }
        Operation::Open => {
            let contents = state.files.get(path).cloned().unwrap_or_default();
            let offset: usize = params["offset"].parse().unwrap();
            if offset > contents.len() {
                return Ok(exception(
                    StatusCode::FORBIDDEN,
                    "IOException",
                    "Offset out of the range",
                ));
            }
            let end = params
                .get("length")
                .map_or(contents.len(), |length| {
                    offset.saturating_add(length.parse().unwrap())
                })
                .min(contents.len());
            let slice = if matches!(fault, Some(Fault::EmptyBody)) {
                Vec::new()
            } else {
                contents[offset..end].to_vec()
            };
            state.served.push(slice.len());
            Ok(Response::new(Bytes::from(slice)))
        }
        Operation::GetFileStatus => panic!("GETFILESTATUS is never redirected"),
    }
}

fn empty(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

fn redirect(location: &str) -> Response<Bytes> {
    let mut response = empty(StatusCode::TEMPORARY_REDIRECT);
    response
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_str(location).unwrap());
    response
}

fn json_response(body: serde_json::Value) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(body.to_string()));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn exception(status: StatusCode, exception: &str, message: &str) -> Response<Bytes> {
    let mut response = json_response(json!({
        "RemoteException": {
            "exception": exception,
            "javaClassName": format!("java.io.{}", exception),
            "message": message,
        }
    }));
    *response.status_mut() = status;
    response
}

fn not_found(path: &str) -> Response<Bytes> {
    exception(
        StatusCode::NOT_FOUND,
        "FileNotFoundException",
        &format!("File {} does not exist.", path),
    )
}
