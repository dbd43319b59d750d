#![allow(dead_code)]

//! In-process Book backend implementing the REST contract the slice talks
//! to, including `link` and `x-total-count` pagination headers.

use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use book_slice::{Book, BookSlice, ClientConfig, EntityId};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const RESOURCE: &str = "/api/books";
const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
    pub status: u16,
}

#[derive(Default)]
struct Inner {
    books: BTreeMap<i64, Book>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
    malformed_links: bool,
    create_status: Option<StatusCode>,
}

#[derive(Clone, Default)]
pub struct Backend {
    inner: Arc<Mutex<Inner>>,
}

impl Backend {
    pub fn insert(&self, book: Book) -> Book {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        let stored = Book {
            id: Some(EntityId::Number(id)),
            ..book
        };
        inner.books.insert(id, stored.clone());
        stored
    }

    pub fn books(&self) -> Vec<Book> {
        self.inner.lock().unwrap().books.values().cloned().collect()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.inner.lock().unwrap().requests.last().cloned()
    }

    pub fn serve_malformed_links(&self, enabled: bool) {
        self.inner.lock().unwrap().malformed_links = enabled;
    }

    /// Answers successful creates with `status` instead of 201.
    pub fn answer_create_with(&self, status: StatusCode) {
        self.inner.lock().unwrap().create_status = Some(status);
    }

    fn record(
        &self,
        method: &'static str,
        path: String,
        query: Option<String>,
        body: Option<Value>,
        status: StatusCode,
    ) {
        self.inner.lock().unwrap().requests.push(RecordedRequest {
            method,
            path,
            query,
            body,
            status: status.as_u16(),
        });
    }
}

pub struct TestBackend {
    pub base_url: String,
    pub backend: Backend,
}

impl TestBackend {
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).expect("test base url is valid")
    }

    pub fn slice(&self) -> BookSlice {
        BookSlice::connect(self.config()).expect("client should build")
    }
}

pub async fn spawn_backend() -> TestBackend {
    let backend = Backend::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("listener has an address");

    let app = router(backend.clone());
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("test backend stopped");
    });

    TestBackend {
        base_url: format!("http://{addr}"),
        backend,
    }
}

fn router(backend: Backend) -> Router {
    Router::new()
        .route(RESOURCE, get(list_books).post(create_book))
        .route(
            "/api/books/:id",
            get(get_book)
                .put(update_book)
                .patch(patch_book)
                .delete(delete_book),
        )
        .with_state(backend)
}

fn problem(status: StatusCode, detail: &str) -> Response {
    let body = json!({
        "title": status.canonical_reason().unwrap_or("Error"),
        "status": status.as_u16(),
        "detail": detail,
    });
    (status, Json(body)).into_response()
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<usize>,
    size: Option<usize>,
    sort: Option<String>,
}

async fn list_books(
    State(backend): State<Backend>,
    Query(params): Query<ListParams>,
    RawQuery(raw): RawQuery,
) -> Response {
    let (items, headers) = {
        let inner = backend.inner.lock().unwrap();
        let mut all: Vec<Book> = inner.books.values().cloned().collect();
        if params.sort.as_deref().is_some_and(|sort| sort.ends_with(",desc")) {
            all.reverse();
        }

        let page = params.page.unwrap_or(0);
        let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total = all.len();
        let items: Vec<Book> = all.into_iter().skip(page * size).take(size).collect();

        let link = if inner.malformed_links {
            format!("<{RESOURCE}?page={page}&size={size}>")
        } else {
            link_header(page, size, total, params.sort.as_deref())
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::LINK, HeaderValue::from_str(&link).unwrap());
        headers.insert("x-total-count", HeaderValue::from(total));
        (items, headers)
    };

    backend.record("GET", RESOURCE.to_string(), raw, None, StatusCode::OK);
    (StatusCode::OK, headers, Json(items)).into_response()
}

fn link_header(page: usize, size: usize, total: usize, sort: Option<&str>) -> String {
    let total_pages = total.div_ceil(size);
    let last = total_pages.saturating_sub(1);
    let sort = sort.map(|sort| format!("&sort={sort}")).unwrap_or_default();
    let target = |p: usize, rel: &str| format!("<{RESOURCE}?page={p}&size={size}{sort}>; rel=\"{rel}\"");

    let mut links = Vec::new();
    if page + 1 < total_pages {
        links.push(target(page + 1, "next"));
    }
    if page > 0 {
        links.push(target(page - 1, "prev"));
    }
    links.push(target(last, "last"));
    links.push(target(0, "first"));
    links.join(",")
}

async fn get_book(State(backend): State<Backend>, Path(id): Path<i64>) -> Response {
    let found = backend.inner.lock().unwrap().books.get(&id).cloned();
    let path = format!("{RESOURCE}/{id}");
    match found {
        Some(book) => {
            backend.record("GET", path, None, None, StatusCode::OK);
            (StatusCode::OK, Json(book)).into_response()
        }
        None => {
            backend.record("GET", path, None, None, StatusCode::NOT_FOUND);
            problem(StatusCode::NOT_FOUND, "Entity not found")
        }
    }
}

async fn create_book(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let book: Book = match serde_json::from_value(body.clone()) {
        Ok(book) => book,
        Err(_) => {
            backend.record("POST", RESOURCE.to_string(), None, Some(body), StatusCode::BAD_REQUEST);
            return problem(StatusCode::BAD_REQUEST, "Malformed book");
        }
    };

    if book.id.is_some() {
        backend.record("POST", RESOURCE.to_string(), None, Some(body), StatusCode::BAD_REQUEST);
        return problem(StatusCode::BAD_REQUEST, "A new book cannot already have an ID");
    }

    let stored = backend.insert(book);
    let status = backend
        .inner
        .lock()
        .unwrap()
        .create_status
        .unwrap_or(StatusCode::CREATED);
    backend.record("POST", RESOURCE.to_string(), None, Some(body), status);

    let location = format!("{RESOURCE}/{}", stored.id.as_ref().map(ToString::to_string).unwrap_or_default());
    (
        status,
        [(header::LOCATION, location)],
        Json(stored),
    )
        .into_response()
}

async fn update_book(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("{RESOURCE}/{id}");
    let book: Book = serde_json::from_value(body.clone()).unwrap_or_default();

    let status = {
        let mut inner = backend.inner.lock().unwrap();
        if book.id != Some(EntityId::Number(id)) {
            StatusCode::BAD_REQUEST
        } else if let Some(stored) = inner.books.get_mut(&id) {
            *stored = book.clone();
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    };

    backend.record("PUT", path, None, Some(body), status);
    match status {
        StatusCode::OK => (StatusCode::OK, Json(book)).into_response(),
        StatusCode::BAD_REQUEST => problem(status, "Invalid ID"),
        _ => problem(status, "Entity not found"),
    }
}

async fn patch_book(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("{RESOURCE}/{id}");
    let patch: Book = serde_json::from_value(body.clone()).unwrap_or_default();

    let outcome = {
        let mut inner = backend.inner.lock().unwrap();
        if patch.id != Some(EntityId::Number(id)) {
            Err(StatusCode::BAD_REQUEST)
        } else if let Some(stored) = inner.books.get_mut(&id) {
            if patch.name.is_some() {
                stored.name = patch.name.clone();
            }
            if patch.price.is_some() {
                stored.price = patch.price;
            }
            Ok(stored.clone())
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    };

    match outcome {
        Ok(book) => {
            backend.record("PATCH", path, None, Some(body), StatusCode::OK);
            (StatusCode::OK, Json(book)).into_response()
        }
        Err(status) => {
            backend.record("PATCH", path, None, Some(body), status);
            problem(status, "Entity not found")
        }
    }
}

async fn delete_book(State(backend): State<Backend>, Path(id): Path<i64>) -> StatusCode {
    backend.inner.lock().unwrap().books.remove(&id);
    backend.record("DELETE", format!("{RESOURCE}/{id}"), None, None, StatusCode::NO_CONTENT);
    StatusCode::NO_CONTENT
}
