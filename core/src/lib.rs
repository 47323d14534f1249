//! Synchronous client core for the Pocket v3 API.
//!
//! # Overview
//! Performs the three-legged handshake (request token → user authorization →
//! access token) and then retrieves the user's saved items. Requests are
//! built and responses parsed without touching the network; the host
//! supplies a `Transport` for the round-trip and an `AuthorizationGate` for
//! the human-in-the-loop wait.
//!
//! # Design
//! - `PocketClient` is stateless and holds only the base URL. Each endpoint
//!   is split into `build_*` and `parse_*`, so the I/O boundary is explicit.
//! - `SavesRetriever` owns the token state machine and refuses out-of-order
//!   stages before any request is built.
//! - Wire DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod retriever;
pub mod types;

pub use client::{PocketClient, DEFAULT_BASE_URL};
pub use error::{ApiError, AuthStage};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use retriever::{AuthorizationGate, FlowState, SavesRetriever};
pub use types::{
    AccessToken, Credentials, DetailType, ItemState, RequestToken, RetrieveQuery, SavedItem,
    SavedItems, Sort,
};
