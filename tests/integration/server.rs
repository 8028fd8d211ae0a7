//! In-process stand-in for the catalog REST API

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use bookshelf::{config::AppConfig, Services, Session, SharedSession};

/// One request as the server saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct FakeState {
    pub books: Vec<Value>,
    pub next_id: i64,
    pub requests: Vec<Recorded>,
    /// Answer DELETE with `success: false` and this message
    pub refuse_delete: Option<String>,
}

pub type Shared = Arc<Mutex<FakeState>>;

pub struct FakeApi {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl FakeApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            next_id: 1,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/books", get(list_books).post(create_book))
            .route("/books/:id", get(get_book).patch(update_book).delete(delete_book))
            .route("/books/search/books", post(search_books))
            .route("/auth/login", post(login))
            .route("/auth/regist", post(register))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake api");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake api stopped");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.api.base_url = self.base_url();
        config.api.timeout_secs = Some(5);
        config
    }

    pub fn services(&self) -> Services {
        self.services_with(Session::in_memory())
    }

    pub fn services_with(&self, session: SharedSession) -> Services {
        Services::new(self.config(), session).expect("services")
    }

    pub fn seed(&self, books: Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        for mut book in books {
            book["id"] = json!(state.next_id);
            state.next_id += 1;
            state.books.push(book);
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self, method: &str) -> Option<Recorded> {
        self.requests().into_iter().rev().find(|r| r.method == method)
    }
}

pub fn book(title: &str, author: &str, category: &str) -> Value {
    json!({
        "title": title,
        "author": author,
        "isbn": format!("isbn-{}", title.to_lowercase().replace(' ', "-")),
        "publisher": "Ace",
        "quantity": 1,
        "publicationYear": 1965,
        "category": category,
        "isAvailable": true
    })
}

fn record(state: &Shared, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.lock().unwrap().requests.push(Recorded {
        method,
        path,
        authorization,
        body,
    });
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Book not found"}))).into_response()
}

async fn list_books(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, "GET", "/books".into(), &headers, Value::Null);
    Json(Value::Array(state.lock().unwrap().books.clone()))
}

async fn create_book(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, "POST", "/books".into(), &headers, body.clone());
    if body["isbn"].as_str().is_some_and(|isbn| isbn == "duplicate") {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": ["isbn must be unique"]}))).into_response();
    }
    let mut state = state.lock().unwrap();
    let mut created = body;
    created["id"] = json!(state.next_id);
    state.next_id += 1;
    state.books.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn get_book(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, "GET", format!("/books/{}", id), &headers, Value::Null);
    let state = state.lock().unwrap();
    match state.books.iter().find(|b| b["id"] == json!(id)) {
        Some(book) => Json(book.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_book(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "PATCH", format!("/books/{}", id), &headers, body.clone());
    let mut state = state.lock().unwrap();
    let Some(book) = state.books.iter_mut().find(|b| b["id"] == json!(id)) else {
        return not_found();
    };
    if let (Some(target), Some(changes)) = (book.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(book.clone()).into_response()
}

async fn delete_book(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    record(&state, "DELETE", format!("/books/{}", id), &headers, Value::Null);
    let mut state = state.lock().unwrap();
    if let Some(message) = state.refuse_delete.clone() {
        return (StatusCode::CONFLICT, Json(json!({"success": false, "message": message}))).into_response();
    }
    let before = state.books.len();
    state.books.retain(|b| b["id"] != json!(id));
    if state.books.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"success": false, "message": "Book not found"}))).into_response();
    }
    Json(json!({"success": true, "message": "Book deleted"})).into_response()
}

async fn search_books(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    record(&state, "POST", "/books/search/books".into(), &headers, body.clone());
    let needle = body["query"].as_str().unwrap_or_default().to_lowercase();
    let state = state.lock().unwrap();
    let hits: Vec<Value> = state
        .books
        .iter()
        .filter(|b| {
            ["title", "author", "category"]
                .iter()
                .any(|k| b[*k].as_str().unwrap_or_default().to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    Json(json!({ "data": hits }))
}

async fn login(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, "POST", "/auth/login".into(), &headers, body.clone());
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("notoken@example.com"), _) => Json(json!({"message": "Welcome"})).into_response(),
        (Some("missing@example.com"), _) => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "User missing@example.com not found"})),
        )
            .into_response(),
        (Some("html@example.com"), _) => (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response(),
        (Some(_), Some("secret")) => Json(json!({
            "access_token": "tok-123",
            "user": {"username": "ada", "email": body["email"]}
        }))
        .into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"}))).into_response(),
    }
}

async fn register(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, "POST", "/auth/regist".into(), &headers, body.clone());
    if body["email"] == json!("plain@example.com") {
        return (StatusCode::CREATED, "User registered").into_response();
    }
    if body["email"] == json!("taken@example.com") {
        return (StatusCode::CONFLICT, Json(json!({"message": "Email already used"}))).into_response();
    }
    (StatusCode::CREATED, Json(json!({"id": 1, "username": body["username"]}))).into_response()
}
