//! Minimal HTTP API over the record store.
//!
//! Uses `std::net::TcpListener` with one thread per connection, so any number
//! of readers can query while the generator keeps writing.
//! Endpoints:
//!
//! - `GET /`: welcome page
//! - `GET /health`: liveness check
//! - `GET /cambrian001/inspection-log/realtime?inspectionID=<round>&recordID=<slot>`: records (JSON)
//! - `GET /cambrian001/inspection-log/info`: store capacity and write position (JSON)
//! - `GET /cambrian001/inspection-log-view/realtime`: viewer page
//! - `GET /cambrian001/static/<file>`: static assets

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use roundlog::{CircularStore, QueryError, Record, RoundlogError};
use serde::Serialize;
use url::form_urlencoded;

/// Realtime records endpoint.
pub const REALTIME_PATH: &str = "/cambrian001/inspection-log/realtime";

/// Store position endpoint.
pub const INFO_PATH: &str = "/cambrian001/inspection-log/info";

/// Viewer page endpoint.
pub const VIEW_PATH: &str = "/cambrian001/inspection-log-view/realtime";

/// Prefix under which `assets_dir` is served.
pub const STATIC_PREFIX: &str = "/cambrian001/static/";

/// Socket read timeout for slow clients.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state handed to every connection thread.
#[derive(Debug)]
pub struct ApiState {
    store: Arc<CircularStore>,
    assets_dir: PathBuf,
    views_dir: PathBuf,
}

impl ApiState {
    /// Creates the API state.
    pub fn new(store: Arc<CircularStore>, assets_dir: PathBuf, views_dir: PathBuf) -> Self {
        Self {
            store,
            assets_dir,
            views_dir,
        }
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Response {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    fn json(status: u16, value: &impl Serialize) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, "application/json", body),
            Err(e) => Self::internal_error(&e.to_string()),
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body.into())
    }

    fn bad_request(reason: &str) -> Self {
        Self::text(400, format!("Bad Request error: {reason}"))
    }

    fn not_found() -> Self {
        Self::json(404, &serde_json::json!({"error": "not found"}))
    }

    fn internal_error(reason: &str) -> Self {
        Self::text(500, format!("Internal server error: {reason}"))
    }
}

/// Wire form of a record, field names as existing clients expect them.
#[derive(Serialize)]
struct RecordView<'a> {
    #[serde(rename = "InspectionID")]
    inspection_id: u64,
    #[serde(rename = "RecordID")]
    record_id: usize,
    #[serde(rename = "DateTime")]
    date_time: &'a str,
    #[serde(rename = "TextContent")]
    text_content: &'a str,
    #[serde(rename = "ImageUrl")]
    image_url: &'a str,
}

impl<'a> From<&'a Record> for RecordView<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            inspection_id: record.round(),
            record_id: record.slot(),
            date_time: record.timestamp(),
            text_content: record.payload(),
            image_url: record.resource_url().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct RealtimeRecords<'a> {
    #[serde(rename = "Records")]
    records: Vec<RecordView<'a>>,
}

/// Binds `0.0.0.0:<port>` and serves requests until the listener fails.
///
/// # Errors
///
/// Returns the I/O error if the port cannot be bound.
pub fn run_api_server(state: Arc<ApiState>, port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)?;
    tracing::info!("API listening on {addr}");
    serve(&listener, &state);
    Ok(())
}

/// Accepts connections and handles each on its own thread.
pub fn serve(listener: &TcpListener, state: &Arc<ApiState>) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("accept error: {e}");
                continue;
            }
        };

        let state = Arc::clone(state);
        let spawned = std::thread::Builder::new()
            .name("roundlog-conn".to_string())
            .spawn(move || {
                // Set a short read timeout so we don't block forever on slow clients
                let _ = stream.set_read_timeout(Some(READ_TIMEOUT));

                if let Err(e) = handle_connection(&stream, &state) {
                    tracing::debug!("request error: {e}");
                }
            });
        if let Err(e) = spawned {
            tracing::warn!("failed to spawn connection thread: {e}");
        }
    }
}

/// Parses an HTTP request line, drains the headers and writes the response.
fn handle_connection(stream: &TcpStream, state: &ApiState) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // Parse: "GET /path?query HTTP/1.x"
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return send_response(stream, &Response::text(400, "Bad Request"));
    }

    let (path, query) = parts[1].split_once('?').unwrap_or((parts[1], ""));

    // Drain remaining headers (we don't need them)
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
    }

    let response = route(state, parts[0], path, query);
    send_response(stream, &response)
}

/// Dispatches a request to its handler.
pub fn route(state: &ApiState, method: &str, path: &str, query: &str) -> Response {
    tracing::info!(method, path, "begin request");

    if method != "GET" {
        return Response::text(405, "Method Not Allowed");
    }

    match path {
        "/" => Response::new(200, "text/html; charset=utf-8", "<h1>Welcome</h1>"),
        "/health" => Response::json(200, &serde_json::json!({"status": "ok"})),
        REALTIME_PATH => handle_realtime(&state.store, query),
        INFO_PATH => handle_info(&state.store),
        VIEW_PATH => serve_file(&state.views_dir, "index.html"),
        _ => match path.strip_prefix(STATIC_PREFIX) {
            Some(relative) => serve_file(&state.assets_dir, relative),
            None => Response::not_found(),
        },
    }
}

/// `GET /cambrian001/inspection-log/realtime?inspectionID=<round>&recordID=<slot>`
fn handle_realtime(store: &CircularStore, query: &str) -> Response {
    let params = parse_query(query);

    let round = match parse_coordinate(&params, "inspectionID", "InspectionID") {
        Ok(round) => round,
        Err(response) => return response,
    };
    let slot = match parse_coordinate(&params, "recordID", "RecordID") {
        Ok(slot) => slot,
        Err(response) => return response,
    };

    match store.query(round, slot) {
        Ok(records) => Response::json(
            200,
            &RealtimeRecords {
                records: records.iter().map(RecordView::from).collect(),
            },
        ),
        Err(RoundlogError::Query(QueryError::InvalidRound { requested, current })) => {
            Response::bad_request(&format!(
                "The InspectionID requested {requested} is too large, current InspectionID is {current}."
            ))
        }
        Err(RoundlogError::Query(QueryError::InvalidSlot { requested, current })) if requested < 0 => {
            Response::bad_request(&format!(
                "The RecordID requested {requested} is negative, current RecordID is {current}."
            ))
        }
        Err(RoundlogError::Query(QueryError::InvalidSlot { requested, current })) => {
            Response::bad_request(&format!(
                "The RecordID requested {requested} is too large, current RecordID is {current}."
            ))
        }
        Err(e) => Response::internal_error(&e.to_string()),
    }
}

/// `GET /cambrian001/inspection-log/info`: returns the store's write position.
fn handle_info(store: &CircularStore) -> Response {
    let position = store.position();
    Response::json(
        200,
        &serde_json::json!({
            "capacity": store.capacity(),
            "round": position.round,
            "cursor": position.cursor,
        }),
    )
}

/// Parses one integer coordinate, mapping failures to a 400 response.
fn parse_coordinate(
    params: &HashMap<String, String>,
    key: &str,
    label: &str,
) -> Result<i64, Response> {
    let raw = params.get(key).map_or("", String::as_str);
    raw.parse()
        .map_err(|e| Response::bad_request(&format!("{label} {raw} is illegal: {e}")))
}

/// Serves `relative` from `root`, refusing anything that escapes it.
fn serve_file(root: &Path, relative: &str) -> Response {
    let relative = Path::new(relative);
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !contained {
        return Response::not_found();
    }

    let path = root.join(relative);
    match std::fs::read(&path) {
        Ok(body) => Response::new(200, content_type(&path), body),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Response::not_found(),
        // Directories and unreadable files look the same to the client.
        Err(e) if path.is_dir() => {
            tracing::debug!("refusing directory {}: {e}", path.display());
            Response::not_found()
        }
        Err(e) => Response::internal_error(&e.to_string()),
    }
}

/// Guesses a content type from the file extension.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Writes an HTTP/1.1 response and closes the exchange.
fn send_response(
    mut stream: &TcpStream,
    response: &Response,
) -> Result<(), Box<dyn std::error::Error>> {
    let status_text = match response.status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    };

    write!(
        stream,
        "HTTP/1.1 {} {status_text}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        response.status,
        response.content_type,
        response.body.len(),
    )?;
    stream.write_all(&response.body)?;
    stream.flush()?;

    Ok(())
}

/// Parses an `application/x-www-form-urlencoded` query string into
/// percent-decoded key-value pairs. A key without `=` maps to `""`.
fn parse_query(query: &str) -> HashMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
