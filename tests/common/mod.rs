use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use bytes::Bytes;
use std::collections::HashMap;
use std::process::{Command, ExitStatus};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;

pub const USER: &str = "developer";
pub const USER_PASSWORD: &str = "Developer12345";
pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Harbor12345";
pub const API_PREFIX: &str = "/api/v2.0";

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub location: Option<String>,
}

#[allow(dead_code)]
impl Reply {
    pub fn status(status: u16) -> Self {
        Reply {
            status,
            body: String::new(),
            location: None,
        }
    }

    pub fn ok() -> Self {
        Self::status(200)
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Reply {
            status,
            body: body.to_string(),
            location: None,
        }
    }

    /// 201 pointing at `path` like Harbor does for created resources.
    pub fn created(path: &str) -> Self {
        Reply {
            status: 201,
            body: String::new(),
            location: Some(path.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[allow(dead_code)]
impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is not json")
    }

    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Default)]
struct MockState {
    replies: HashMap<(String, String), Reply>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockState {
    /// Exact path first, then routes ending in `*` as prefixes.
    fn reply_for(&self, method: &str, path: &str) -> Option<Reply> {
        if let Some(reply) = self.replies.get(&(method.to_string(), path.to_string())) {
            return Some(reply.clone());
        }

        self.replies
            .iter()
            .filter(|((m, route), _)| m == method && route.ends_with('*'))
            .find(|((_, route), _)| path.starts_with(route.trim_end_matches('*')))
            .map(|(_, reply)| reply.clone())
    }
}

fn parse_basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let decoded = BASE64_STANDARD
        .decode(value.trim_start_matches("Basic "))
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (user, password) = match parse_basic_auth(&headers) {
        Some((u, p)) => (Some(u), Some(p)),
        None => (None, None),
    };

    let recorded = Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        user,
        password,
        content_type: headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).to_string(),
    };
    state.requests.lock().unwrap().push(recorded);

    let reply = match state.reply_for(method.as_str(), uri.path()) {
        Some(reply) => reply,
        None => {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::from("404 Not Found"))
                .unwrap()
        }
    };

    let mut builder = Response::builder()
        .status(reply.status)
        .header("Content-Type", "application/json");
    if let Some(location) = reply.location {
        builder = builder.header("Location", location);
    }
    builder.body(Body::from(reply.body)).unwrap()
}

/// In-process stand-in for the Harbor API, answering from a fixed table.
pub struct MockHarbor {
    pub origin: String,
    pub base_url: String,
    state: MockState,
    shared: Option<Arc<MockState>>,
    runtime: Option<Runtime>,
}

#[allow(dead_code)]
impl MockHarbor {
    pub fn new() -> Self {
        MockHarbor {
            origin: String::new(),
            base_url: String::new(),
            state: MockState::default(),
            shared: None,
            runtime: None,
        }
    }

    /// Register a reply for `path`, relative to the API prefix.
    pub fn api(self, method: &str, path: &str, reply: Reply) -> Self {
        self.route(method, &format!("{}{}", API_PREFIX, path), reply)
    }

    /// Register a reply for an absolute path.
    pub fn route(mut self, method: &str, path: &str, reply: Reply) -> Self {
        self.state
            .replies
            .insert((method.to_string(), path.to_string()), reply);
        self
    }

    pub fn start(mut self) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();

        let shared = Arc::new(std::mem::take(&mut self.state));
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&shared));

        runtime.spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        self.origin = format!("http://127.0.0.1:{}", port);
        self.base_url = format!("{}{}", self.origin, API_PREFIX);
        self.shared = Some(shared);
        self.runtime = Some(runtime);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        match &self.shared {
            Some(state) => state.requests.lock().unwrap().clone(),
            None => Vec::new(),
        }
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.requests().iter().map(Recorded::line).collect()
    }
}

impl Drop for MockHarbor {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run the permcheck binary for `resource` as [`USER`].
#[allow(dead_code)]
pub fn run_permcheck(harbor: &MockHarbor, resource: &str, with_admin: bool) -> RunOutput {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_permcheck"));
    cmd.env("HARBOR_BASE_URL", &harbor.base_url)
        .env("USER_NAME", USER)
        .env("PASSWORD", USER_PASSWORD)
        .env("RESOURCE", resource)
        .env_remove("HARBOR_INSECURE")
        .env_remove("HARBOR_TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    for proxy in ["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "http_proxy", "https_proxy", "all_proxy"] {
        cmd.env_remove(proxy);
    }

    if with_admin {
        cmd.env("ADMIN_USER_NAME", ADMIN)
            .env("ADMIN_PASSWORD", ADMIN_PASSWORD);
    } else {
        cmd.env_remove("ADMIN_USER_NAME").env_remove("ADMIN_PASSWORD");
    }

    let output = cmd.output().expect("Failed to run permcheck");
    RunOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> reqwest::blocking::Client {
        reqwest::blocking::Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_mock_harbor_records_requests() {
        let harbor = MockHarbor::new()
            .api("GET", "/audit-logs", Reply::json(200, serde_json::json!([])))
            .start();

        let resp = client()
            .get(format!("{}/audit-logs", harbor.base_url))
            .basic_auth(USER, Some(USER_PASSWORD))
            .send()
            .unwrap();
        assert_eq!(resp.status(), 200);

        let resp = client()
            .get(format!("{}/unknown", harbor.base_url))
            .send()
            .unwrap();
        assert_eq!(resp.status(), 404);

        let requests = harbor.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].user.as_deref(), Some(USER));
        assert_eq!(requests[0].password.as_deref(), Some(USER_PASSWORD));
        assert_eq!(requests[1].user, None);
    }

    #[test]
    fn test_prefix_routes() {
        let harbor = MockHarbor::new()
            .api("GET", "/p2p/preheat/instances/*", Reply::status(204))
            .start();

        let resp = client()
            .get(format!("{}/p2p/preheat/instances/abc", harbor.base_url))
            .send()
            .unwrap();
        assert_eq!(resp.status(), 204);
    }
}
