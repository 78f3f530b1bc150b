//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use directory_gateway::{DirectoryConfig, HttpServer, Shutdown};

/// Counters and data behind the mock upstream.
#[derive(Default)]
pub struct UpstreamState {
    pub employees: Mutex<Vec<Value>>,
    pub list_calls: AtomicU32,
    pub get_calls: AtomicU32,
    pub create_calls: AtomicU32,
    pub delete_calls: AtomicU32,
    throttle_next: AtomicU32,
}

impl UpstreamState {
    fn take_throttle(&self) -> bool {
        self.throttle_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// An in-process stand-in for the employee directory service.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub state: Arc<UpstreamState>,
}

#[allow(dead_code)]
impl MockUpstream {
    pub async fn start(employees: Vec<Value>) -> Self {
        let state = Arc::new(UpstreamState::default());
        *state.employees.lock().unwrap() = employees;

        let app = Router::new()
            .route(
                "/api/v1/employee",
                get(list_employees).post(create_employee).delete(delete_employee),
            )
            .route("/api/v1/employee/{id}", get(get_employee))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1/", self.addr)
    }

    /// Answer the next `n` requests, on any route, with 429.
    pub fn throttle(&self, n: u32) {
        self.state.throttle_next.store(n, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> u32 {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> u32 {
        self.state.get_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u32 {
        self.state.delete_calls.load(Ordering::SeqCst)
    }

    /// Config pointing at this upstream with millisecond backoff.
    pub fn config(&self) -> DirectoryConfig {
        let mut config = DirectoryConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.upstream.base_url = self.base_url();
        config.retries.max_attempts = 3;
        config.retries.initial_backoff_ms = 10;
        config.retries.max_delay_ms = 100;
        config.retries.max_total_wait_ms = 1_000;
        config.upstream.request_timeout_secs = 1;
        config.timeouts.request_secs = 5;
        config.observability.metrics_enabled = false;
        config
    }
}

fn envelope(data: Value) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "data": data, "status": "Successfully processed request." })),
    )
        .into_response()
}

fn too_many_requests() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response()
}

async fn list_employees(State(state): State<Arc<UpstreamState>>) -> Response {
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    if state.take_throttle() {
        return too_many_requests();
    }
    let employees = state.employees.lock().unwrap().clone();
    envelope(Value::Array(employees))
}

async fn get_employee(State(state): State<Arc<UpstreamState>>, Path(id): Path<String>) -> Response {
    state.get_calls.fetch_add(1, Ordering::SeqCst);
    if state.take_throttle() {
        return too_many_requests();
    }
    let found = state
        .employees
        .lock()
        .unwrap()
        .iter()
        .find(|e| e["id"] == id.as_str())
        .cloned();
    match found {
        Some(employee) => envelope(employee),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_employee(State(state): State<Arc<UpstreamState>>, Json(input): Json<Value>) -> Response {
    state.create_calls.fetch_add(1, Ordering::SeqCst);
    if state.take_throttle() {
        return too_many_requests();
    }
    let name = input["name"].as_str().unwrap_or_default().to_string();
    let employee = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "employee_name": name,
        "employee_salary": input["salary"],
        "employee_age": input["age"],
        "employee_title": input["title"],
        "employee_email": format!("{}@company.com", name.to_lowercase()),
    });
    state.employees.lock().unwrap().push(employee.clone());
    envelope(employee)
}

async fn delete_employee(State(state): State<Arc<UpstreamState>>, Json(input): Json<Value>) -> Response {
    state.delete_calls.fetch_add(1, Ordering::SeqCst);
    if state.take_throttle() {
        return too_many_requests();
    }
    let name = input["name"].as_str().unwrap_or_default();
    let mut employees = state.employees.lock().unwrap();
    match employees.iter().position(|e| e["employee_name"] == name) {
        Some(index) => {
            employees.remove(index);
            envelope(Value::Bool(true))
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[allow(dead_code)]
pub fn employee(id: &str, name: &str, salary: u64) -> Value {
    json!({
        "id": id,
        "employee_name": name,
        "employee_salary": salary,
        "employee_age": 30,
        "employee_title": "Engineer",
        "employee_email": format!("{}@company.com", name.to_lowercase()),
    })
}

/// Alice, Bob and Charlie.
#[allow(dead_code)]
pub fn staff() -> Vec<Value> {
    vec![
        employee("1", "Alice", 50_000),
        employee("2", "Bob", 70_000),
        employee("3", "Charlie", 40_000),
    ]
}

/// Start the gateway on an ephemeral port. Trigger the returned handle to stop it.
#[allow(dead_code)]
pub async fn start_gateway(config: DirectoryConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
