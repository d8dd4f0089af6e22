//! HTTP service for the dashboard front end.
//!
//! A single-threaded `tiny_http` loop. Routing and rendering live in
//! [`DashboardService::handle`], which works on plain method/url/body
//! values so it can be exercised without a socket.

use crate::cache::{LoadCache, LoadedDataset};
use crate::dashboard::{assemble, Selections};
use crate::filter::month_options;
use crate::loader::LoadError;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, info, warn};

/// Upload name used when the client sends none.
const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },
}

impl From<ServeError> for td_common::Error {
    fn from(err: ServeError) -> Self {
        match err {
            ServeError::Bind { addr, message } => td_common::Error::Bind { addr, message },
        }
    }
}

/// A rendered response, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => Self::error(500, &format!("serialization failed: {e}")),
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: json!({ "error": message }).to_string().into_bytes(),
        }
    }
}

/// An accepted upload, kept so a refresh can parse it again.
#[derive(Debug, Clone)]
struct Upload {
    name: String,
    bytes: Vec<u8>,
}

/// Dashboard state shared across requests: the load cache and the dataset
/// currently on screen.
#[derive(Debug)]
pub struct DashboardService {
    cache: LoadCache,
    default_path: PathBuf,
    detail_row_limit: Option<usize>,
    active: Option<Arc<LoadedDataset>>,
    upload: Option<Upload>,
}

impl DashboardService {
    pub fn new(default_path: impl Into<PathBuf>, detail_row_limit: Option<usize>) -> Self {
        Self {
            cache: LoadCache::new(),
            default_path: default_path.into(),
            detail_row_limit,
            active: None,
            upload: None,
        }
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    /// Route one request.
    pub fn handle(&mut self, method: &Method, url: &str, body: &[u8]) -> ApiResponse {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let params = match parse_query(query) {
            Ok(params) => params,
            Err(message) => return ApiResponse::error(400, &message),
        };
        debug!(%method, path, "request");

        match (method, path) {
            (Method::Get, "/healthz") => ApiResponse::text(200, "ok"),
            (Method::Get, "/api/dashboard") => self.dashboard(&params),
            (Method::Get, "/api/months") => self.months(&params),
            (Method::Post, "/api/upload") => self.upload(&params, body),
            (Method::Post, "/api/refresh") => self.refresh(),
            _ => ApiResponse::error(404, &format!("no route for {method} {path}")),
        }
    }

    /// The dataset on screen: the last accepted upload, else the default file.
    fn dataset(&mut self) -> Result<Arc<LoadedDataset>, LoadError> {
        if let Some(active) = &self.active {
            return Ok(Arc::clone(active));
        }
        let dataset = match &self.upload {
            Some(upload) => self.cache.get_or_load_bytes(&upload.name, &upload.bytes)?,
            None => self.cache.get_or_load_path(&self.default_path)?,
        };
        self.active = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Make `dataset` the one on screen and evict the one it replaces.
    fn activate(&mut self, dataset: Arc<LoadedDataset>) {
        let replaced = dataset.fingerprint.clone();
        if let Some(previous) = self.active.replace(dataset) {
            if previous.fingerprint != replaced {
                self.cache.invalidate(&previous.fingerprint);
            }
        }
    }

    fn dashboard(&mut self, params: &[(String, String)]) -> ApiResponse {
        let request = match selections(params).into_request(self.detail_row_limit) {
            Ok(request) => request,
            Err(e) => return ApiResponse::error(400, &e.to_string()),
        };
        match self.dataset() {
            Ok(dataset) => ApiResponse::json(200, &assemble(&dataset, &request)),
            Err(e) => load_failure(&e, None),
        }
    }

    fn months(&mut self, params: &[(String, String)]) -> ApiResponse {
        let view = match selections(params).view_filter() {
            Ok(view) => view.without_months(),
            Err(e) => return ApiResponse::error(400, &e.to_string()),
        };
        match self.dataset() {
            Ok(dataset) => ApiResponse::json(
                200,
                &json!({ "months": month_options(&dataset.table, &view) }),
            ),
            Err(e) => load_failure(&e, None),
        }
    }

    fn upload(&mut self, params: &[(String, String)], body: &[u8]) -> ApiResponse {
        let name = first(params, "name").unwrap_or(DEFAULT_UPLOAD_NAME);
        match self.cache.get_or_load_bytes(name, body) {
            Ok(dataset) => {
                info!(
                    name,
                    size = body.len(),
                    team_rows = dataset.table.len(),
                    "upload activated"
                );
                let summary = json!({
                    "source": dataset.source,
                    "fingerprint": dataset.fingerprint,
                    "load": dataset.report,
                    "team_rows": dataset.table.len(),
                });
                self.activate(dataset);
                self.upload = Some(Upload {
                    name: name.to_string(),
                    bytes: body.to_vec(),
                });
                ApiResponse::json(200, &summary)
            }
            Err(e) => {
                warn!(name, size = body.len(), error = %e, "upload rejected");
                load_failure(&e, Some((name, body.len())))
            }
        }
    }

    /// Drop every cached parse and reload the current input.
    fn refresh(&mut self) -> ApiResponse {
        self.cache.clear();
        self.active = None;
        match self.dataset() {
            Ok(dataset) => ApiResponse::json(
                200,
                &json!({ "refreshed": true, "source": dataset.source }),
            ),
            Err(e) => load_failure(&e, None),
        }
    }
}

fn load_failure(err: &LoadError, upload: Option<(&str, usize)>) -> ApiResponse {
    let mut body = json!({
        "error": err.to_string(),
        "diagnostic": err.diagnostic(),
        "code": err.code(),
    });
    if let Some((name, size)) = upload {
        body["upload"] = json!({ "name": name, "size": size });
    }
    ApiResponse::json(422, &body)
}

/// Decode `a=1&b=x+y` into ordered pairs; `+` is a space.
pub fn parse_query(query: &str) -> Result<Vec<(String, String)>, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<(String, String), String> {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Result<String, String> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|e| format!("invalid query encoding in {raw:?}: {e}"))
}

fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn all_values(params: &[(String, String)], key: &str) -> Vec<String> {
    params
        .iter()
        .filter(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.clone())
        .collect()
}

/// A repeated detail key selects its values; `key=` alone selects nothing.
fn detail_values(params: &[(String, String)], key: &str) -> Option<Vec<String>> {
    params
        .iter()
        .any(|(k, _)| k == key)
        .then(|| all_values(params, key))
}

fn selections(params: &[(String, String)]) -> Selections {
    Selections {
        states: all_values(params, "state"),
        months: all_values(params, "month"),
        statuses: detail_values(params, "status"),
        priorities: detail_values(params, "priority"),
        departments: detail_values(params, "department"),
    }
}

/// Bind the listener.
pub fn bind(addr: &str) -> Result<Server, ServeError> {
    Server::http(addr).map_err(|e| ServeError::Bind {
        addr: addr.to_string(),
        message: e.to_string(),
    })
}

/// Serve requests until the listener shuts down.
pub fn run(server: Server, mut service: DashboardService) {
    for mut request in server.incoming_requests() {
        let mut body = Vec::new();
        if let Err(e) = request.as_reader().read_to_end(&mut body) {
            warn!(error = %e, "failed to read request body");
            continue;
        }
        let method = request.method().clone();
        let url = request.url().to_string();
        let reply = service.handle(&method, &url, &body);
        debug!(%method, url = %url, status = reply.status, bytes = reply.body.len(), "response");

        let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
        if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
            response = response.with_header(header);
        }
        if let Err(e) = request.respond(response) {
            warn!(error = %e, "failed to send response");
        }
    }
}

/// Bind `addr` and serve the dashboard.
pub fn serve(addr: &str, service: DashboardService) -> Result<(), ServeError> {
    let server = bind(addr)?;
    info!(addr, "dashboard service listening");
    run(server, service);
    Ok(())
}
