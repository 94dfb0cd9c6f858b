//! In-process fake of the meetings API for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agenda_core::gateway::Gateway;
use agenda_core::session::{
    MemorySessionStorage, Session, SessionStorage, StoredSession,
};
use agenda_core::user::{Role, User};
use agenda_core::AgendaResult;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

pub const TOKEN: &str = "valid-token";
pub const PASSWORD: &str = "secret123";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

pub struct BackendState {
    pub token: String,
    pub users: Vec<Value>,
    pub meetings: Vec<Value>,
    pub next_id: i64,
    /// Wrap list responses in `{results: [...]}`.
    pub wrap_results: bool,
    /// Force a status on GET /auth/me.
    pub me_status: Option<StatusCode>,
    /// Force a status on GET /users.
    pub users_status: Option<StatusCode>,
    /// Answer the next POST/PUT /meetings with a time conflict.
    pub conflict: bool,
    /// Delay GET /meetings when `startDate` starts with this prefix.
    pub slow_window: Option<(String, Duration)>,
    pub requests: Vec<RecordedRequest>,
}

pub type Shared = Arc<Mutex<BackendState>>;

pub struct FakeBackend {
    pub base_url: String,
    pub state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            token: TOKEN.to_string(),
            users: vec![
                user_json(1, "Ana Rojas", "user"),
                user_json(2, "Bruno Díaz", "user"),
                user_json(3, "Sala Wit", "salaWit"),
            ],
            meetings: Vec::new(),
            next_id: 100,
            wrap_results: false,
            me_status: None,
            users_status: None,
            conflict: false,
            slow_window: None,
            requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/users", get(list_users).post(create_user))
            .route("/users/{id}", put(update_user).delete(delete_user))
            .route("/meetings", get(list_meetings).post(create_meeting))
            .route("/meetings/{id}", put(update_meeting).delete(delete_meeting))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeBackend {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.with(|s| {
            s.requests
                .iter()
                .filter(|r| r.method == method && r.path == path)
                .cloned()
                .collect()
        })
    }

    pub fn request_paths(&self) -> Vec<String> {
        self.with(|s| {
            s.requests
                .iter()
                .map(|r| format!("{} {}", r.method, r.path))
                .collect()
        })
    }

    pub fn gateway(&self, session: Session) -> Gateway {
        Gateway::new(&self.base_url, session, Duration::from_secs(5)).unwrap()
    }
}

pub fn user_json(id: i64, name: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{}@wit.cl", name.split(' ').next().unwrap_or(name).to_lowercase()),
        "name": name,
        "role": role,
        "createdAt": "2025-01-01T00:00:00.000Z",
        "updatedAt": "2025-01-01T00:00:00.000Z"
    })
}

pub fn meeting_json(id: i64, title: &str, executive_id: i64, location: &str, start: &str, end: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "client": "ACME",
        "executive_id": executive_id,
        "location": location,
        "start_at": start,
        "end_at": end
    })
}

pub fn profile(id: i64, name: &str, role: Role) -> User {
    User {
        id,
        email: format!("{id}@wit.cl"),
        name: name.to_string(),
        role,
        created_at: None,
        updated_at: None,
    }
}

/// Storage that counts how often it was cleared.
#[derive(Default)]
pub struct CountingStorage {
    pub inner: MemorySessionStorage,
    pub clears: AtomicUsize,
}

impl CountingStorage {
    pub fn with_token(token: &str, user: User) -> Self {
        CountingStorage {
            inner: MemorySessionStorage::new(StoredSession {
                token: Some(token.to_string()),
                current_user: Some(user),
            }),
            clears: AtomicUsize::new(0),
        }
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl SessionStorage for CountingStorage {
    fn load(&self) -> AgendaResult<StoredSession> {
        self.inner.load()
    }

    fn save(&self, session: &StoredSession) -> AgendaResult<()> {
        self.inner.save(session)
    }

    fn clear(&self) -> AgendaResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

/// Session already holding `token` for a user with `role`.
pub fn session_with(token: &str, role: Role) -> Session {
    Session::open(MemorySessionStorage::new(StoredSession {
        token: Some(token.to_string()),
        current_user: Some(profile(1, "Ana Rojas", role)),
    }))
}

// --- handlers ---

fn record(state: &Shared, method: Method, uri: &Uri, body: Option<Value>) {
    let query = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect::<HashMap<_, _>>()
        })
        .unwrap_or_default();

    state.lock().unwrap().requests.push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query,
        body,
    });
}

fn authorized(state: &Shared, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.lock().unwrap().token);
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token inválido"}))).into_response()
}

fn listing(state: &BackendState, items: Vec<Value>) -> Value {
    if state.wrap_results {
        json!({ "results": items })
    } else {
        Value::Array(items)
    }
}

async fn login(State(state): State<Shared>, uri: Uri, Json(body): Json<Value>) -> Response {
    record(&state, Method::POST, &uri, Some(body.clone()));
    let s = state.lock().unwrap();

    let email = body["email"].as_str().unwrap_or_default();
    let user = s.users.iter().find(|u| u["email"] == email).cloned();

    match user {
        Some(user) if body["password"] == PASSWORD => {
            (StatusCode::OK, Json(json!({ "token": s.token, "user": user }))).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Credenciales inválidas"})),
        )
            .into_response(),
    }
}

async fn me(State(state): State<Shared>, uri: Uri, headers: HeaderMap) -> Response {
    record(&state, Method::GET, &uri, None);
    if let Some(status) = state.lock().unwrap().me_status {
        return (status, Json(json!({"message": "forced"}))).into_response();
    }
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let user = state.lock().unwrap().users[0].clone();
    Json(json!({ "user": user })).into_response()
}

async fn list_users(State(state): State<Shared>, uri: Uri, headers: HeaderMap) -> Response {
    record(&state, Method::GET, &uri, None);
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let s = state.lock().unwrap();
    if let Some(status) = s.users_status {
        return (status, Json(json!({"message": "users unavailable"}))).into_response();
    }
    Json(listing(&s, s.users.clone())).into_response()
}

async fn create_user(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, Method::POST, &uri, Some(body.clone()));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut s = state.lock().unwrap();
    if s.users.iter().any(|u| u["email"] == body["email"]) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"errors": ["El email ya está registrado"]})),
        )
            .into_response();
    }
    s.next_id += 1;
    let mut user = user_json(
        s.next_id,
        body["name"].as_str().unwrap_or_default(),
        body["role"].as_str().unwrap_or("user"),
    );
    user["email"] = body["email"].clone();
    s.users.push(user.clone());
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    record(&state, Method::PUT, &uri, Some(body.clone()));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut s = state.lock().unwrap();
    let Some(user) = s.users.iter_mut().find(|u| u["id"] == id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"details": ["Usuario no encontrado"]})),
        )
            .into_response();
    };
    for key in ["name", "email", "role"] {
        if let Some(v) = body.get(key) {
            user[key] = v.clone();
        }
    }
    Json(user.clone()).into_response()
}

async fn delete_user(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    record(&state, Method::DELETE, &uri, None);
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state.lock().unwrap().users.retain(|u| u["id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

fn parse_instant(v: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(v).ok().map(|d| d.with_timezone(&Utc))
}

async fn list_meetings(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&state, Method::GET, &uri, None);
    if !authorized(&state, &headers) {
        return unauthorized();
    }

    let start_param = query.get("startDate").cloned().unwrap_or_default();
    let delay = state
        .lock()
        .unwrap()
        .slow_window
        .as_ref()
        .filter(|(prefix, _)| start_param.starts_with(prefix.as_str()))
        .map(|(_, d)| *d);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let start = query.get("startDate").and_then(|v| parse_instant(v));
    let end = query.get("endDate").and_then(|v| parse_instant(v));
    let location = query.get("location").cloned();

    let s = state.lock().unwrap();
    let items: Vec<Value> = s
        .meetings
        .iter()
        .filter(|m| {
            let at = m["start_at"].as_str().and_then(parse_instant);
            let in_window = match (at, start, end) {
                (Some(at), Some(start), Some(end)) => start <= at && at <= end,
                _ => true,
            };
            let at_location = location.as_ref().is_none_or(|l| m["location"] == l.as_str());
            in_window && at_location
        })
        .cloned()
        .collect();

    Json(listing(&s, items)).into_response()
}

fn conflict_response() -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({
            "error": "time_conflict",
            "message": "La sala ya está reservada",
            "conflicts": [{"id": 1}]
        })),
    )
        .into_response()
}

async fn create_meeting(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, Method::POST, &uri, Some(body.clone()));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut s = state.lock().unwrap();
    if s.conflict {
        s.conflict = false;
        return conflict_response();
    }
    if body.get("executive_id").is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"details": ["executive_id es obligatorio"]})),
        )
            .into_response();
    }
    s.next_id += 1;
    let mut meeting = body.clone();
    meeting["id"] = json!(s.next_id);
    s.meetings.push(meeting.clone());
    (StatusCode::CREATED, Json(meeting)).into_response()
}

async fn update_meeting(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    record(&state, Method::PUT, &uri, Some(body.clone()));
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut s = state.lock().unwrap();
    if s.conflict {
        s.conflict = false;
        return conflict_response();
    }
    let Some(meeting) = s.meetings.iter_mut().find(|m| m["id"] == id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Reunión no encontrada"})),
        )
            .into_response();
    };
    let mut updated = body.clone();
    updated["id"] = json!(id);
    *meeting = updated.clone();
    Json(updated).into_response()
}

async fn delete_meeting(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    record(&state, Method::DELETE, &uri, None);
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut s = state.lock().unwrap();
    let before = s.meetings.len();
    s.meetings.retain(|m| m["id"] != id);
    if s.meetings.len() == before {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}
