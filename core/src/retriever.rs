//! The handshake-then-fetch flow.
//!
//! # Design
//! `SavesRetriever` owns the token state and walks it through
//! `Uninitialized → RequestTokenObtained → UserAuthorized →
//! AccessTokenObtained`. Each token lives inside the stage that holds it, so
//! a stage that needs a token cannot run before the stage that produced it.
//! Precondition checks happen before any request is built.
//!
//! Network I/O goes through `Transport`; waiting for the user goes through
//! `AuthorizationGate`. Both are supplied by the host.

use tracing::{debug, info};
use url::Url;

use crate::client::PocketClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::{AccessToken, Credentials, RequestToken, RetrieveQuery, SavedItems};

/// Suspends the flow until the user has acted on the authorization page.
///
/// Returning `Ok` is taken on trust as "authorization granted"; if the user
/// actually declined, the following access-token exchange is rejected by the
/// provider.
pub trait AuthorizationGate {
    fn wait_for_approval(&mut self, authorize_url: &Url) -> Result<(), ApiError>;
}

/// Where a `SavesRetriever` is in the authentication sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Uninitialized,
    RequestTokenObtained,
    UserAuthorized,
    AccessTokenObtained,
}

#[derive(Debug)]
enum Stage {
    Uninitialized,
    RequestTokenObtained(RequestToken),
    UserAuthorized(RequestToken),
    AccessTokenObtained(AccessToken),
}

/// Authenticates one user against the provider and fetches their saves.
///
/// One instance serves one user; run several instances for several users.
#[derive(Debug)]
pub struct SavesRetriever<T> {
    client: PocketClient,
    credentials: Credentials,
    transport: T,
    stage: Stage,
}

impl<T: Transport> SavesRetriever<T> {
    pub fn new(client: PocketClient, credentials: Credentials, transport: T) -> Self {
        Self {
            client,
            credentials,
            transport,
            stage: Stage::Uninitialized,
        }
    }

    /// Start from an access token obtained earlier, skipping the handshake.
    pub fn with_access_token(
        client: PocketClient,
        credentials: Credentials,
        transport: T,
        access_token: AccessToken,
    ) -> Self {
        Self {
            client,
            credentials,
            transport,
            stage: Stage::AccessTokenObtained(access_token),
        }
    }

    pub fn state(&self) -> FlowState {
        match self.stage {
            Stage::Uninitialized => FlowState::Uninitialized,
            Stage::RequestTokenObtained(_) => FlowState::RequestTokenObtained,
            Stage::UserAuthorized(_) => FlowState::UserAuthorized,
            Stage::AccessTokenObtained(_) => FlowState::AccessTokenObtained,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        match &self.stage {
            Stage::AccessTokenObtained(token) => Some(token),
            _ => None,
        }
    }

    /// Run the three handshake stages in order.
    pub fn authenticate(
        &mut self,
        gate: &mut impl AuthorizationGate,
    ) -> Result<AccessToken, ApiError> {
        self.obtain_request_token()?;
        self.authorize(gate)?;
        self.obtain_access_token()
    }

    pub fn obtain_request_token(&mut self) -> Result<RequestToken, ApiError> {
        if !matches!(self.stage, Stage::Uninitialized) {
            return Err(ApiError::Precondition(
                "a request token was already issued for this session",
            ));
        }

        debug!(base_url = self.client.base_url(), "requesting request token");
        let request = self.client.build_request_token(&self.credentials)?;
        let token = self
            .client
            .parse_request_token(self.transport.execute(request)?)?;
        info!("request token obtained");

        self.stage = Stage::RequestTokenObtained(token.clone());
        Ok(token)
    }

    /// The page the user must visit to approve the pending request token.
    pub fn authorization_url(&self) -> Result<Url, ApiError> {
        match &self.stage {
            Stage::RequestTokenObtained(token) | Stage::UserAuthorized(token) => self
                .client
                .authorize_url(token, &self.credentials.redirect_uri),
            _ => Err(ApiError::Precondition(
                "no pending request token to authorize",
            )),
        }
    }

    pub fn authorize(&mut self, gate: &mut impl AuthorizationGate) -> Result<(), ApiError> {
        let Stage::RequestTokenObtained(token) = &self.stage else {
            return Err(ApiError::Precondition(
                "authorization requires a freshly issued request token",
            ));
        };

        let url = self
            .client
            .authorize_url(token, &self.credentials.redirect_uri)?;
        debug!(%url, "waiting for user authorization");
        gate.wait_for_approval(&url)?;
        info!("user reported authorization complete");

        if let Stage::RequestTokenObtained(token) =
            std::mem::replace(&mut self.stage, Stage::Uninitialized)
        {
            self.stage = Stage::UserAuthorized(token);
        }
        Ok(())
    }

    /// Exchange the authorized request token. The request token is spent
    /// whether or not the exchange succeeds.
    pub fn obtain_access_token(&mut self) -> Result<AccessToken, ApiError> {
        let token = match std::mem::replace(&mut self.stage, Stage::Uninitialized) {
            Stage::UserAuthorized(token) => token,
            other => {
                let reason = match other {
                    Stage::Uninitialized => "no request token has been issued",
                    Stage::RequestTokenObtained(_) => "the request token has not been authorized",
                    _ => "an access token is already held",
                };
                self.stage = other;
                return Err(ApiError::Precondition(reason));
            }
        };

        debug!("exchanging request token for access token");
        let request = self.client.build_access_token(&self.credentials, &token)?;
        let access_token = self
            .client
            .parse_access_token(self.transport.execute(request)?)?;
        info!(username = access_token.username(), "access token obtained");

        self.stage = Stage::AccessTokenObtained(access_token.clone());
        Ok(access_token)
    }

    /// Retrieve one page of saved items. May be called any number of times
    /// once an access token is held.
    pub fn fetch(&self, query: &RetrieveQuery) -> Result<SavedItems, ApiError> {
        let access_token = self.access_token().ok_or(ApiError::Precondition(
            "saved items cannot be fetched before an access token is held",
        ))?;

        debug!(
            state = %query.state,
            count = query.count,
            offset = query.offset,
            "fetching saved items"
        );
        let request = self
            .client
            .build_retrieve(&self.credentials, access_token, query)?;
        let items = self.client.parse_retrieve(self.transport.execute(request)?)?;
        info!(items = items.len(), "saved items retrieved");
        Ok(items)
    }
}
