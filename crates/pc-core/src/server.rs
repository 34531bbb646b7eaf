//! HTTP front end for the engine.
//!
//! Serves `POST /api/compute` plus a health check on a fixed pool of worker
//! threads sharing one `tiny_http` listener. Requests are independent; the
//! only shared state is the immutable [`ServeContext`] and the shutdown flag.
//!
//! Status mapping:
//! - 200: evaluation succeeded
//! - 400: validation error (distribution, comparator, parameter, target, body)
//! - 404: unknown path
//! - 405: non-POST on the compute route
//! - 413: body larger than `max_body_bytes`
//! - 500: computation or internal error

use crate::api::{handle_compute, RequestLimits};
use crate::config::ServerConfig;
use crate::logging::generate_request_id;
use pc_common::{Error, ErrorCategory, Result, StructuredError};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Response};
use tracing::{debug, error, info, warn};

/// Route serving the engine.
pub const COMPUTE_PATH: &str = "/api/compute";

/// How often idle workers re-check the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Per-request settings shared by every worker.
#[derive(Debug, Clone, Copy)]
pub struct ServeContext {
    pub limits: RequestLimits,
    pub max_body_bytes: usize,
}

impl From<&ServerConfig> for ServeContext {
    fn from(config: &ServerConfig) -> Self {
        Self {
            limits: config.limits(),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// A fully rendered HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
        }
    }

    fn error(status: u16, err: &Error) -> Self {
        Self::json(status, StructuredError::from(err).to_json())
    }

    fn plain_error(status: u16, category: ErrorCategory, message: &str) -> Self {
        Self::json(
            status,
            StructuredError::plain(u32::from(status), category, message).to_json(),
        )
    }
}

/// Map an engine/API error to its HTTP status.
pub fn status_for(err: &Error) -> u16 {
    if err.is_client_error() {
        400
    } else {
        500
    }
}

fn request_path(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

fn is_compute_path(path: &str) -> bool {
    path.strip_suffix('/').unwrap_or(path) == COMPUTE_PATH
}

/// Only `POST /api/compute` reads a body; every other request is answered
/// from the method and path alone.
pub fn accepts_body(method: &Method, url: &str) -> bool {
    *method == Method::Post && is_compute_path(request_path(url))
}

/// Decide the reply for one request. Pure: no socket access.
pub fn route(method: &Method, url: &str, body: &[u8], ctx: &ServeContext) -> Reply {
    let path = request_path(url);

    if is_compute_path(path) {
        if *method != Method::Post {
            return Reply::plain_error(405, ErrorCategory::Validation, "POST only");
        }
        return match handle_compute(body, &ctx.limits) {
            Ok(evaluation) => match serde_json::to_string(&evaluation) {
                Ok(json) => Reply::json(200, json),
                Err(e) => Reply::error(500, &Error::Json(e)),
            },
            Err(err) => Reply::error(status_for(&err), &err),
        };
    }

    if path == "/health" || path == "/healthz" {
        return Reply::text(200, "ok");
    }

    Reply::plain_error(404, ErrorCategory::Validation, "not found")
}

/// Handle to the running API server.
pub struct ApiServer {
    shutdown: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
    addr: SocketAddr,
}

impl ApiServer {
    /// Bind the listener and start the worker threads.
    pub fn start(config: &ServerConfig) -> Result<Self> {
        let bind_addr = config.socket_addr()?;
        let server = tiny_http::Server::http(bind_addr)
            .map_err(|e| Error::Server(format!("failed to bind {}: {}", bind_addr, e)))?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| Error::Server("listener has no IP address".to_string()))?;
        let server = Arc::new(server);

        let shutdown = Arc::new(AtomicBool::new(false));
        let ctx = ServeContext::from(config);

        let mut workers = Vec::with_capacity(config.workers);
        for i in 0..config.workers {
            let worker_server = Arc::clone(&server);
            let worker_shutdown = Arc::clone(&shutdown);
            let spawned = thread::Builder::new()
                .name(format!("pc-worker-{}", i))
                .spawn(move || serve_loop(&worker_server, &ctx, &worker_shutdown));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Release the workers that did start.
                    let mut partial = Self {
                        shutdown: Arc::clone(&shutdown),
                        workers,
                        addr,
                    };
                    partial.stop();
                    return Err(Error::Server(format!("failed to spawn worker {}: {}", i, e)));
                }
            }
        }

        info!(addr = %addr, workers = config.workers, path = COMPUTE_PATH, "api server started");

        Ok(Self {
            shutdown,
            workers,
            addr,
        })
    }

    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until every worker exits.
    pub fn wait(mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    /// Stop accepting requests and join the workers.
    pub fn shutdown(mut self) {
        self.stop();
        info!("api server stopped");
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker loop: accept, answer, repeat until the shutdown flag flips.
fn serve_loop(server: &tiny_http::Server, ctx: &ServeContext, shutdown: &AtomicBool) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let request = match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(e) => {
                if !shutdown.load(Ordering::SeqCst) {
                    error!(error = %e, "api server accept error");
                }
                break;
            }
        };

        handle_request(request, ctx);
    }
}

fn handle_request(mut request: tiny_http::Request, ctx: &ServeContext) {
    let started = Instant::now();
    let request_id = generate_request_id();
    let method = request.method().clone();
    let url = request.url().to_string();
    debug!(request_id = %request_id, method = %method, url = %url, "request received");

    let reply = if !accepts_body(&method, &url) {
        route(&method, &url, b"", ctx)
    } else {
        match read_body(&mut request, ctx.max_body_bytes) {
            Ok(body) => route(&method, &url, &body, ctx),
            Err(BodyError::TooLarge) => Reply::plain_error(
                413,
                ErrorCategory::Validation,
                &format!("request body exceeds {} bytes", ctx.max_body_bytes),
            ),
            Err(BodyError::Io(e)) => {
                let err = Error::InvalidRequest(format!("unreadable body: {}", e));
                Reply::error(400, &err)
            }
        }
    };

    let status = reply.status;
    let mut response = Response::from_string(reply.body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!(request_id = %request_id, error = %e, "failed to send response");
    }

    info!(
        request_id = %request_id,
        method = %method,
        url = %url,
        status,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "request served"
    );
}

enum BodyError {
    TooLarge,
    Io(std::io::Error),
}

fn read_body(
    request: &mut tiny_http::Request,
    limit: usize,
) -> std::result::Result<Vec<u8>, BodyError> {
    if request.body_length().is_some_and(|len| len > limit) {
        return Err(BodyError::TooLarge);
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(BodyError::Io)?;
    if body.len() > limit {
        return Err(BodyError::TooLarge);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ServeContext {
        ServeContext {
            limits: RequestLimits::default(),
            max_body_bytes: 1024,
        }
    }

    fn json(reply: &Reply) -> serde_json::Value {
        serde_json::from_str(&reply.body).unwrap()
    }

    #[test]
    fn test_compute_ok() {
        let body = br#"{"distribution":"binomial","n":10,"p":0.5,"comparator":"<=","target":5}"#;
        let reply = route(&Method::Post, "/api/compute/", body, &ctx());
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "application/json");
        let value = json(&reply);
        assert_eq!(value["x"].as_array().unwrap().len(), 11);
        assert!((value["probability"].as_f64().unwrap() - 0.623_046_875).abs() < 1e-12);
    }

    #[test]
    fn test_compute_without_trailing_slash_and_query() {
        let body = br#"{"distribution":"geometric","p":0.2,"comparator":"exact","target":1}"#;
        let reply = route(&Method::Post, "/api/compute?debug=1", body, &ctx());
        assert_eq!(reply.status, 200);
        assert_eq!(json(&reply)["probability"], 0.2);
    }

    #[test]
    fn test_post_only() {
        let reply = route(&Method::Get, "/api/compute/", b"", &ctx());
        assert_eq!(reply.status, 405);
        assert_eq!(json(&reply)["error"], "POST only");
    }

    #[test]
    fn test_validation_is_400() {
        let body = br#"{"distribution":"cauchy","comparator":"exact","target":1}"#;
        let reply = route(&Method::Post, "/api/compute/", body, &ctx());
        assert_eq!(reply.status, 400);
        let value = json(&reply);
        assert_eq!(value["code"], 10);
        assert_eq!(value["error"], "unknown distribution: cauchy");
        assert!(value.get("x").is_none());
    }

    #[test]
    fn test_invalid_json_is_400() {
        let reply = route(&Method::Post, "/api/compute/", b"{nope", &ctx());
        assert_eq!(reply.status, 400);
        assert!(json(&reply)["error"].as_str().unwrap().contains("invalid JSON"));
    }

    #[test]
    fn test_computation_error_is_500() {
        let body = br#"{"distribution":"geometric","p":1e-300,"comparator":"exact","target":1}"#;
        let reply = route(&Method::Post, "/api/compute/", body, &ctx());
        assert_eq!(reply.status, 500);
        assert_eq!(json(&reply)["category"], "computation");
    }

    #[test]
    fn test_health_and_not_found() {
        assert_eq!(route(&Method::Get, "/health", b"", &ctx()).body, "ok");
        assert_eq!(route(&Method::Get, "/healthz", b"", &ctx()).status, 200);
        assert_eq!(route(&Method::Get, "/", b"", &ctx()).status, 404);
    }

    #[test]
    fn test_only_compute_post_reads_body() {
        assert!(accepts_body(&Method::Post, "/api/compute"));
        assert!(accepts_body(&Method::Post, "/api/compute/?x=1"));
        assert!(!accepts_body(&Method::Get, "/api/compute/"));
        assert!(!accepts_body(&Method::Put, "/api/compute"));
        assert!(!accepts_body(&Method::Post, "/health"));
        assert!(!accepts_body(&Method::Post, "/api/compute//"));
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(&Error::TargetType("x".into())), 400);
        assert_eq!(status_for(&Error::Computation("x".into())), 500);
    }
}
