//! Application state shared across all request handlers.
//!
//! Initialized once during startup and cloned for each request handler
//! through Axum's state extraction. All fields are cheap to clone:
//! `reqwest::Client` and the store handle are reference-counted internally,
//! and the OAuth2 client is designed to be cloned.

use std::sync::Arc;

use oauth2::basic::{BasicErrorResponseType, BasicTokenType};
use oauth2::{
    Client, EmptyExtraTokenFields, EndpointNotSet, EndpointSet, RevocationErrorResponseType,
    StandardErrorResponse, StandardRevocableToken, StandardTokenIntrospectionResponse,
    StandardTokenResponse,
};

use crate::store::DataStore;

/// Type alias for the OAuth2 client configured for Discord authentication.
pub(crate) type OAuth2Client = Client<
    StandardErrorResponse<BasicErrorResponseType>,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[derive(Clone)]
pub struct AppState {
    /// HTTP client for identity-provider API requests.
    ///
    /// Configured with redirects disabled to prevent SSRF vulnerabilities.
    pub http_client: reqwest::Client,

    /// OAuth2 client for the Discord authentication flow.
    pub oauth_client: OAuth2Client,

    /// Handle to the external time-series/search store.
    pub store: Arc<dyn DataStore>,
}

impl AppState {
    pub fn new(
        http_client: reqwest::Client,
        oauth_client: OAuth2Client,
        store: Arc<dyn DataStore>,
    ) -> Self {
        Self {
            http_client,
            oauth_client,
            store,
        }
    }
}
