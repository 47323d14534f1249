//! Stateless HTTP request builder and response parser for the Pocket v3 API.
//!
//! # Design
//! `PocketClient` holds only the provider's base URL and carries no token
//! state. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Token bookkeeping and stage ordering live in `SavesRetriever`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{ApiError, AuthStage};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AccessToken, Credentials, RequestToken, RetrieveQuery, SavedItems};

/// Production host of the Pocket API and its authorization page.
pub const DEFAULT_BASE_URL: &str = "https://getpocket.com";

const REQUEST_TOKEN_PATH: &str = "/v3/oauth/request";
const ACCESS_TOKEN_PATH: &str = "/v3/oauth/authorize";
const RETRIEVE_PATH: &str = "/v3/get";
const AUTHORIZE_PAGE_PATH: &str = "/auth/authorize";

#[derive(Serialize)]
struct RequestTokenBody<'a> {
    consumer_key: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct RequestTokenReply {
    code: String,
}

#[derive(Serialize)]
struct AccessTokenBody<'a> {
    consumer_key: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct RetrieveBody<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    #[serde(flatten)]
    query: &'a RetrieveQuery,
}

#[derive(Deserialize)]
struct RetrieveReply {
    #[serde(default)]
    list: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Synchronous, stateless client for the Pocket v3 API.
#[derive(Debug, Clone)]
pub struct PocketClient {
    base_url: String,
}

impl Default for PocketClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl PocketClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_request_token(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.post(
            REQUEST_TOKEN_PATH,
            &RequestTokenBody {
                consumer_key: &credentials.consumer_key,
                redirect_uri: &credentials.redirect_uri,
            },
        )
    }

    pub fn parse_request_token(&self, response: HttpResponse) -> Result<RequestToken, ApiError> {
        check_status(&response, |status, reason| ApiError::Authentication {
            stage: AuthStage::RequestToken,
            status,
            reason,
        })?;
        let reply: RequestTokenReply = decode(&response)?;
        Ok(RequestToken::new(reply.code))
    }

    /// The page the user opens in a browser to approve `token`.
    pub fn authorize_url(&self, token: &RequestToken, redirect_uri: &str) -> Result<Url, ApiError> {
        Url::parse_with_params(
            &format!("{}{AUTHORIZE_PAGE_PATH}", self.base_url),
            [("request_token", token.as_str()), ("redirect_uri", redirect_uri)],
        )
        .map_err(|e| ApiError::Serialization(format!("invalid authorization url: {e}")))
    }

    pub fn build_access_token(
        &self,
        credentials: &Credentials,
        token: &RequestToken,
    ) -> Result<HttpRequest, ApiError> {
        self.post(
            ACCESS_TOKEN_PATH,
            &AccessTokenBody {
                consumer_key: &credentials.consumer_key,
                code: token.as_str(),
            },
        )
    }

    pub fn parse_access_token(&self, response: HttpResponse) -> Result<AccessToken, ApiError> {
        check_status(&response, |status, reason| ApiError::Authentication {
            stage: AuthStage::AccessToken,
            status,
            reason,
        })?;
        decode(&response)
    }

    pub fn build_retrieve(
        &self,
        credentials: &Credentials,
        access_token: &AccessToken,
        query: &RetrieveQuery,
    ) -> Result<HttpRequest, ApiError> {
        self.post(
            RETRIEVE_PATH,
            &RetrieveBody {
                consumer_key: &credentials.consumer_key,
                access_token: access_token.as_str(),
                query,
            },
        )
    }

    pub fn parse_retrieve(&self, response: HttpResponse) -> Result<SavedItems, ApiError> {
        let retrieval_error = |status, reason| ApiError::Retrieval { status, reason };
        check_status(&response, retrieval_error)?;
        let reply: RetrieveReply = decode(&response)?;
        if let Some(reason) = reply.error {
            return Err(retrieval_error(response.status, reason));
        }
        SavedItems::from_list(reply.list).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{path}", self.base_url),
            headers: json_headers(),
            body: Some(body),
        })
    }
}

/// Without `X-Accept` the provider answers form-encoded.
fn json_headers() -> Vec<(String, String)> {
    vec![
        ("content-type".to_string(), "application/json".to_string()),
        ("x-accept".to_string(), "application/json".to_string()),
    ]
}

/// Map any status other than 200 through `to_error`.
///
/// The provider explains rejections in `X-Error`; the body is the fallback.
fn check_status(
    response: &HttpResponse,
    to_error: impl FnOnce(u16, String) -> ApiError,
) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    let reason = response
        .header("x-error")
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .or_else(|| Some(response.body.trim()).filter(|body| !body.is_empty()))
        .unwrap_or("no detail given")
        .to_string();
    Err(to_error(response.status, reason))
}

fn decode<T: for<'de> Deserialize<'de>>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
