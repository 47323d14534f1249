//! Handshake and retrieval against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `SavesRetriever`
//! over real HTTP using ureq. The authorization gate plays the user by
//! opening the authorization page itself, so the whole flow runs unattended.

use mock_server::{Provider, TEST_CONSUMER_KEY, TEST_USERNAME};
use pocket_core::{
    ApiError, AuthStage, AuthorizationGate, Credentials, FlowState, HttpMethod, HttpRequest,
    HttpResponse, ItemState, PocketClient, RetrieveQuery, SavesRetriever, Sort, Transport,
};
use url::Url;

/// Executes `HttpRequest`s with ureq.
///
/// Status-code-as-error is disabled so 4xx/5xx responses come back as data
/// and the core client interprets them.
struct Ureq {
    agent: ureq::Agent,
}

impl Ureq {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for Ureq {
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = match (req.method, req.body) {
            (HttpMethod::Get, _) => self.agent.get(&req.path).call(),
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(&req.path);
                for (key, value) in &req.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.send(body.unwrap_or_default().as_bytes())
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.body_mut().read_to_string().unwrap_or_default();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Plays the user: opens the authorization page, which approves the code.
struct ClickThrough;

impl AuthorizationGate for ClickThrough {
    fn wait_for_approval(&mut self, authorize_url: &Url) -> Result<(), ApiError> {
        let response = Ureq::new().execute(HttpRequest {
            method: HttpMethod::Get,
            path: authorize_url.to_string(),
            headers: Vec::new(),
            body: None,
        })?;
        assert_eq!(response.status, 200, "authorize page: {}", response.body);
        Ok(())
    }
}

/// Plays a user who confirms without ever visiting the page.
struct WalkAway;

impl AuthorizationGate for WalkAway {
    fn wait_for_approval(&mut self, _: &Url) -> Result<(), ApiError> {
        Ok(())
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, Provider::seeded()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn retriever(base_url: &str, consumer_key: &str) -> SavesRetriever<Ureq> {
    SavesRetriever::new(
        PocketClient::new(base_url),
        Credentials::new(consumer_key, "https://getpocket.com"),
        Ureq::new(),
    )
}

#[test]
fn handshake_then_fetch() {
    let base_url = start_server();
    let mut retriever = retriever(&base_url, TEST_CONSUMER_KEY);

    // Step 1: request token.
    let code = retriever.obtain_request_token().unwrap();
    assert!(!code.as_str().is_empty());
    assert_eq!(retriever.state(), FlowState::RequestTokenObtained);

    // Step 2: the user approves.
    let url = retriever.authorization_url().unwrap();
    assert!(url.as_str().starts_with(&format!("{base_url}/auth/authorize?")));
    retriever.authorize(&mut ClickThrough).unwrap();

    // Step 3: exchange.
    let access = retriever.obtain_access_token().unwrap();
    assert_eq!(access.username(), TEST_USERNAME);

    // Step 4: default query returns unread items only.
    let unread = retriever.fetch(&RetrieveQuery::default()).unwrap();
    let ids: Vec<&str> = unread.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
    let first = unread.get("1").unwrap();
    assert_eq!(first.resolved_title.as_deref(), Some("Rust Book"));
    assert_eq!(first.time_added.as_deref(), Some("100"));
    assert_eq!(first.extra["status"], "0");

    // Step 5: manual paging over everything.
    let page = RetrieveQuery::default()
        .with_state(ItemState::All)
        .with_sort(Sort::Oldest)
        .with_count(2);
    let first_page = retriever.fetch(&page).unwrap();
    assert_eq!(first_page.len(), 2);
    let second_page = retriever.fetch(&page.next_page()).unwrap();
    assert_eq!(second_page.into_vec()[0].id, "3");

    // Step 6: past the end the provider sends `[]`.
    let past_end = retriever.fetch(&page.with_offset(10)).unwrap();
    assert!(past_end.is_empty());
}

#[test]
fn authenticate_runs_all_stages() {
    let base_url = start_server();
    let mut retriever = retriever(&base_url, TEST_CONSUMER_KEY);

    let access = retriever.authenticate(&mut ClickThrough).unwrap();
    assert_eq!(access.username(), TEST_USERNAME);
    assert_eq!(retriever.state(), FlowState::AccessTokenObtained);
}

#[test]
fn unknown_consumer_key_fails_first_stage() {
    let base_url = start_server();
    let mut retriever = retriever(&base_url, "not-a-key");

    let err = retriever.obtain_request_token().unwrap_err();
    match err {
        ApiError::Authentication {
            stage,
            status,
            reason,
        } => {
            assert_eq!(stage, AuthStage::RequestToken);
            assert_eq!(status, 403);
            assert_eq!(reason, "Invalid consumer key.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn skipped_authorization_fails_at_exchange() {
    let base_url = start_server();
    let mut retriever = retriever(&base_url, TEST_CONSUMER_KEY);

    let err = retriever.authenticate(&mut WalkAway).unwrap_err();
    assert!(matches!(
        err,
        ApiError::Authentication {
            stage: AuthStage::AccessToken,
            status: 403,
            ..
        }
    ));
}

#[test]
fn revoked_token_fails_retrieval() {
    let base_url = start_server();
    let retriever = SavesRetriever::with_access_token(
        PocketClient::new(&base_url),
        Credentials::new(TEST_CONSUMER_KEY, "https://getpocket.com"),
        Ureq::new(),
        pocket_core::AccessToken::new("revoked", TEST_USERNAME),
    );

    let err = retriever.fetch(&RetrieveQuery::default()).unwrap_err();
    assert!(matches!(err, ApiError::Retrieval { status: 401, .. }));
}
