// In-process HTTP mock for the sandbox and chat APIs, plus a sleeper that
// records instead of waiting. Both write to one event log so tests can
// assert the interleaving of delays and requests.

use crate::clock::Sleeper;
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

impl MockResponse {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "application/json",
            body: value.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }
}

struct Route {
    method: Method,
    path_prefix: String,
    responses: VecDeque<MockResponse>,
}

#[derive(Clone)]
struct MockState {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    events: EventLog,
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    state.events.push(format!("{} {}", method, path));
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(|q| q.to_string()),
        headers,
        body,
    });

    let scripted = state
        .routes
        .lock()
        .unwrap()
        .iter_mut()
        .find(|r| r.method == method && path.starts_with(&r.path_prefix))
        .and_then(|r| r.responses.pop_front());

    match scripted {
        Some(response) => Response::builder()
            .status(response.status)
            .header("content-type", response.content_type)
            .body(Body::from(response.body))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Body::from("no scripted response"))
            .unwrap(),
    }
}

pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    events: EventLog,
}

impl MockServer {
    /// Start a server answering `(method, path prefix)` routes from queues
    pub async fn start(routes: Vec<(&str, &str, Vec<MockResponse>)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(method, prefix, responses)| Route {
                method: Method::from_bytes(method.as_bytes()).unwrap(),
                path_prefix: prefix.to_string(),
                responses: responses.into(),
            })
            .collect();

        let state = MockState {
            routes: Arc::new(Mutex::new(routes)),
            requests: Arc::new(Mutex::new(Vec::new())),
            events: EventLog::default(),
        };
        let requests = state.requests.clone();
        let events = state.events.clone();

        let app = Router::new().fallback(handle).with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            requests,
            events,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn events(&self) -> EventLog {
        self.events.clone()
    }
}

/// Sleeper that logs the requested delay and returns immediately
pub struct RecordingSleeper {
    durations: Mutex<Vec<Duration>>,
    events: EventLog,
}

impl RecordingSleeper {
    pub fn new(events: EventLog) -> Self {
        Self {
            durations: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.durations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.durations.lock().unwrap().push(duration);
        self.events.push(format!("sleep {}ms", duration.as_millis()));
    }
}
