use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const TEST_CONSUMER_KEY: &str = "1234-abcd1234abcd1234abcd1234";
pub const TEST_USERNAME: &str = "pocketuser";

/// A saved item as the provider stores it. `status` is `"0"` for unread and
/// `"1"` for archived, matching the wire format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredItem {
    pub item_id: String,
    pub resolved_title: String,
    pub resolved_url: String,
    pub time_added: String,
    pub status: String,
    #[serde(default)]
    pub tags: Option<Value>,
}

impl StoredItem {
    pub fn new(item_id: &str, title: &str, url: &str, time_added: i64, archived: bool) -> Self {
        Self {
            item_id: item_id.to_string(),
            resolved_title: title.to_string(),
            resolved_url: url.to_string(),
            time_added: time_added.to_string(),
            status: if archived { "1" } else { "0" }.to_string(),
            tags: None,
        }
    }

    fn is_archived(&self) -> bool {
        self.status == "1"
    }

    fn added(&self) -> i64 {
        self.time_added.parse().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct PendingCode {
    approved: bool,
    used: bool,
}

/// In-memory provider state shared by all handlers.
#[derive(Debug, Default)]
pub struct Provider {
    consumer_keys: HashSet<String>,
    username: String,
    codes: HashMap<String, PendingCode>,
    access_tokens: HashSet<String>,
    items: Vec<StoredItem>,
}

impl Provider {
    pub fn new(consumer_key: &str, username: &str) -> Self {
        Self {
            consumer_keys: HashSet::from([consumer_key.to_string()]),
            username: username.to_string(),
            ..Default::default()
        }
    }

    /// Accept another application's consumer key.
    pub fn with_consumer_key(mut self, consumer_key: &str) -> Self {
        self.consumer_keys.insert(consumer_key.to_string());
        self
    }

    pub fn with_item(mut self, item: StoredItem) -> Self {
        self.items.push(item);
        self
    }

    /// Provider preloaded with the test key and three items: two unread, one
    /// archived.
    pub fn seeded() -> Self {
        Self::new(TEST_CONSUMER_KEY, TEST_USERNAME)
            .with_item(StoredItem::new("1", "Rust Book", "https://doc.rust-lang.org/book/", 100, false))
            .with_item(StoredItem::new("2", "Axum", "https://docs.rs/axum", 200, true))
            .with_item(StoredItem::new("3", "Tokio", "https://tokio.rs", 300, false))
    }

    fn knows_key(&self, consumer_key: &str) -> bool {
        self.consumer_keys.contains(consumer_key)
    }
}

pub type Db = Arc<RwLock<Provider>>;

pub fn app() -> Router {
    app_with(Provider::seeded())
}

pub fn app_with(provider: Provider) -> Router {
    let db: Db = Arc::new(RwLock::new(provider));
    Router::new()
        .route("/v3/oauth/request", post(request_token))
        .route("/auth/authorize", get(authorize_page))
        .route("/v3/oauth/authorize", post(access_token))
        .route("/v3/get", post(retrieve))
        .with_state(db)
}

pub async fn run(listener: TcpListener, provider: Provider) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(provider)).await
}

/// Rejection in the provider's style: status plus `X-Error-Code`/`X-Error`.
fn provider_error(status: StatusCode, code: u16, message: &'static str) -> Response {
    let mut response = (status, message).into_response();
    let headers = response.headers_mut();
    headers.insert("x-error-code", HeaderValue::from(code));
    headers.insert("x-error", HeaderValue::from_static(message));
    response
}

/// JSON when the caller asked for it, form encoding otherwise.
fn reply(headers: &HeaderMap, body: Value) -> Response {
    let wants_json = headers
        .get("x-accept")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("application/json"));
    if wants_json {
        return Json(body).into_response();
    }
    let form = body
        .as_object()
        .into_iter()
        .flatten()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join("&");
    (
        [(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        form,
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct RequestTokenInput {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub redirect_uri: String,
}

async fn request_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<RequestTokenInput>,
) -> Response {
    if input.consumer_key.is_empty() {
        return provider_error(StatusCode::BAD_REQUEST, 138, "Missing consumer key.");
    }
    if input.redirect_uri.is_empty() {
        return provider_error(StatusCode::BAD_REQUEST, 140, "Missing redirect url.");
    }
    let mut provider = db.write().await;
    if !provider.knows_key(&input.consumer_key) {
        return provider_error(StatusCode::FORBIDDEN, 152, "Invalid consumer key.");
    }
    let code = Uuid::new_v4().to_string();
    provider.codes.insert(code.clone(), PendingCode::default());
    reply(&headers, json!({ "code": code, "state": null }))
}

#[derive(Deserialize)]
pub struct AuthorizePageParams {
    pub request_token: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// Stands in for the user clicking "Authorize" in a browser.
async fn authorize_page(
    State(db): State<Db>,
    Query(params): Query<AuthorizePageParams>,
) -> Result<String, StatusCode> {
    let mut provider = db.write().await;
    let pending = provider
        .codes
        .get_mut(&params.request_token)
        .ok_or(StatusCode::NOT_FOUND)?;
    pending.approved = true;
    Ok(format!(
        "Authorized. Return to {}",
        params.redirect_uri.as_deref().unwrap_or("the application")
    ))
}

#[derive(Deserialize)]
pub struct AccessTokenInput {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub code: String,
}

async fn access_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<AccessTokenInput>,
) -> Response {
    if input.code.is_empty() {
        return provider_error(StatusCode::BAD_REQUEST, 182, "Missing code.");
    }
    let mut provider = db.write().await;
    if !provider.knows_key(&input.consumer_key) {
        return provider_error(StatusCode::FORBIDDEN, 152, "Invalid consumer key.");
    }
    let Some(pending) = provider.codes.get_mut(&input.code) else {
        return provider_error(StatusCode::BAD_REQUEST, 185, "Code not found.");
    };
    if pending.used {
        return provider_error(StatusCode::FORBIDDEN, 159, "Already used code.");
    }
    pending.used = true;
    if !pending.approved {
        return provider_error(StatusCode::FORBIDDEN, 158, "User rejected code.");
    }

    let token = Uuid::new_v4().to_string();
    provider.access_tokens.insert(token.clone());
    let username = provider.username.clone();
    reply(&headers, json!({ "access_token": token, "username": username }))
}

#[derive(Deserialize)]
pub struct RetrieveInput {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub access_token: String,
    pub state: Option<String>,
    pub count: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<String>,
    #[serde(rename = "detailType")]
    pub detail_type: Option<String>,
}

async fn retrieve(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<RetrieveInput>,
) -> Response {
    let provider = db.read().await;
    if !provider.knows_key(&input.consumer_key) {
        return provider_error(StatusCode::FORBIDDEN, 152, "Invalid consumer key.");
    }
    if !provider.access_tokens.contains(&input.access_token) {
        return provider_error(StatusCode::UNAUTHORIZED, 107, "Invalid access token.");
    }

    let mut items: Vec<&StoredItem> = provider
        .items
        .iter()
        .filter(|item| match input.state.as_deref().unwrap_or("unread") {
            "archive" => item.is_archived(),
            "all" => true,
            _ => !item.is_archived(),
        })
        .collect();
    match input.sort.as_deref() {
        Some("oldest") => items.sort_by_key(|item| item.added()),
        Some("title") => items.sort_by(|a, b| a.resolved_title.cmp(&b.resolved_title)),
        Some("site") => items.sort_by(|a, b| a.resolved_url.cmp(&b.resolved_url)),
        _ => items.sort_by_key(|item| std::cmp::Reverse(item.added())),
    }

    let complete = input.detail_type.as_deref() == Some("complete");
    let list: Map<String, Value> = items
        .into_iter()
        .skip(input.offset.unwrap_or(0))
        .take(input.count.unwrap_or(usize::MAX))
        .map(|item| {
            let mut value = json!({
                "item_id": item.item_id,
                "resolved_title": item.resolved_title,
                "resolved_url": item.resolved_url,
                "time_added": item.time_added,
                "status": item.status,
            });
            if let (true, Some(tags), Some(object)) =
                (complete, item.tags.as_ref(), value.as_object_mut())
            {
                object.insert("tags".to_string(), tags.clone());
            }
            (item.item_id.clone(), value)
        })
        .collect();

    // The provider encodes an empty list as an array.
    let list = if list.is_empty() {
        json!([])
    } else {
        Value::Object(list)
    };
    reply(&headers, json!({ "status": 1, "complete": 1, "list": list }))
}
