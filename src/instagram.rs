//! Instagram Graph API client
//!
//! Thin reqwest wrapper around the three provider calls the sync core
//! performs (token refresh, profile fetch, media list) plus the two OAuth
//! exchange calls used at connect time. Base URLs are configurable so a
//! mock server can stand in during tests.
//!
//! The provider authenticates every call through query-string or form
//! credentials; there is no header-based auth.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Maximum number of characters of an upstream error body carried in an
/// [`InstagramError::Api`]; anything longer is truncated before it can
/// reach logs or API responses.
const ERROR_BODY_SNIPPET_CHARS: usize = 200;

/// Errors returned by the Instagram client.
#[derive(Debug, Error)]
pub enum InstagramError {
    /// Non-2xx response from the provider. The message carries the status
    /// and a body snippet so callers can classify it.
    #[error("Instagram API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure before a status code was obtained.
    #[error("Instagram request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Closed classification of provider failures, parsed from the Graph
/// error payload (`error.code` / `error.type`) with a substring fallback
/// for unparseable bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The token has been revoked or invalidated; retrying is pointless.
    TokenRevoked,
    /// The provider is throttling us.
    RateLimited,
    /// Temporary failure worth retrying on the next run.
    Transient,
    /// Anything we cannot place.
    Unknown,
}

/// Shape of the structured error payload Graph returns on failures.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl InstagramError {
    /// Classify this error for the orchestrator's failure handling.
    pub fn classify(&self) -> ErrorClass {
        match self {
            InstagramError::Api { status, body } => classify_api_error(*status, body),
            InstagramError::Network(err) => {
                if err.is_timeout() || err.is_connect() {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Unknown
                }
            }
        }
    }
}

fn classify_api_error(status: u16, body: &str) -> ErrorClass {
    if let Ok(envelope) = serde_json::from_str::<GraphErrorEnvelope>(body) {
        // code 190 is the provider's invalid/expired token code; any
        // OAuthException means the credential itself was rejected.
        if envelope.error.code == Some(190)
            || envelope.error.kind.as_deref() == Some("OAuthException")
        {
            return ErrorClass::TokenRevoked;
        }
        // Application- and user-level throttling codes.
        if matches!(envelope.error.code, Some(4) | Some(17) | Some(613)) {
            return ErrorClass::RateLimited;
        }
    }

    if status == 429 {
        return ErrorClass::RateLimited;
    }
    if status >= 500 {
        return ErrorClass::Transient;
    }

    classify_error_text(body)
}

/// Fallback classification by the provider's known revocation markers in
/// free text. Used for bodies that are not the structured Graph payload
/// and for errors that reach the orchestrator as plain strings.
pub fn classify_error_text(text: &str) -> ErrorClass {
    if text.contains("190") || text.contains("expired") || text.contains("OAuthException") {
        ErrorClass::TokenRevoked
    } else {
        ErrorClass::Unknown
    }
}

fn snippet(body: String) -> String {
    if body.chars().count() > ERROR_BODY_SNIPPET_CHARS {
        let truncated: String = body.chars().take(ERROR_BODY_SNIPPET_CHARS).collect();
        format!("{}...", truncated)
    } else {
        body
    }
}

/// Short-lived token obtained from the code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ShortLivedToken {
    pub access_token: String,
}

/// Long-lived token from the exchange/refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct LongLivedToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Token lifetime in seconds as reported by the provider.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Profile fields returned by the `/me` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountDetails {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub media_count: i32,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// One entry of the media list response.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaEntry {
    pub id: String,
    pub media_type: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub permalink: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub like_count: Option<i32>,
    #[serde(default)]
    pub comments_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct MediaEnvelope {
    #[serde(default)]
    data: Vec<MediaEntry>,
}

/// Instagram Graph API client.
#[derive(Debug, Clone)]
pub struct InstagramClient {
    http: reqwest::Client,
    /// Base for graph.instagram.com calls
    graph_base: String,
    /// Base for api.instagram.com (code exchange)
    oauth_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl InstagramClient {
    /// Build a client from application configuration.
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(
            config.graph_api_base.clone(),
            config.oauth_api_base.clone(),
            config.instagram_client_id.clone().unwrap_or_default(),
            config.instagram_client_secret.clone().unwrap_or_default(),
            config.instagram_redirect_uri.clone().unwrap_or_default(),
        )
    }

    pub fn new(
        graph_base: String,
        oauth_base: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            graph_base: graph_base.trim_end_matches('/').to_string(),
            oauth_base: oauth_base.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Exchange an authorization code for a short-lived token.
    pub async fn exchange_code(&self, code: &str) -> Result<ShortLivedToken, InstagramError> {
        let url = format!("{}/oauth/access_token", self.oauth_base);
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = self.http.post(&url).form(&params).send().await?;
        Self::read_json(response).await
    }

    /// Upgrade a short-lived token to a long-lived one.
    pub async fn exchange_long_lived(
        &self,
        short_lived_token: &str,
    ) -> Result<LongLivedToken, InstagramError> {
        let url = format!("{}/access_token", self.graph_base);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("grant_type", "ig_exchange_token"),
                ("client_secret", self.client_secret.as_str()),
                ("access_token", short_lived_token),
            ])
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Refresh a long-lived token before it expires. The endpoint accepts
    /// recently-expired tokens as well, so callers need no special branch
    /// for an already-negative validity window.
    pub async fn refresh_access_token(
        &self,
        access_token: &str,
    ) -> Result<LongLivedToken, InstagramError> {
        let url = format!("{}/refresh_access_token", self.graph_base);
        debug!("Refreshing Instagram access token");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("grant_type", "ig_exchange_token"),
                ("access_token", access_token),
            ])
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Fetch profile metadata for the token's account.
    pub async fn account_details(
        &self,
        access_token: &str,
    ) -> Result<AccountDetails, InstagramError> {
        let url = format!("{}/me", self.graph_base);
        let response = self
            .http
            .get(&url)
            .query(&[
                (
                    "fields",
                    "id,username,account_type,media_count,profile_picture_url",
                ),
                ("access_token", access_token),
            ])
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Fetch the most recent media page for an account, provider ordering
    /// (newest first) preserved.
    pub async fn media_page(
        &self,
        account_id: &str,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<MediaEntry>, InstagramError> {
        let url = format!("{}/{}/media", self.graph_base, account_id);
        let response = self
            .http
            .get(&url)
            .query(&[
                (
                    "fields",
                    "id,media_type,media_url,thumbnail_url,permalink,caption,timestamp,like_count,comments_count",
                ),
                ("limit", limit.to_string().as_str()),
                ("access_token", access_token),
            ])
            .send()
            .await?;
        let envelope: MediaEnvelope = Self::read_json(response).await?;
        Ok(envelope.data)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, InstagramError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InstagramError::Api {
                status: status.as_u16(),
                body: snippet(body),
            });
        }
        Ok(response.json().await?)
    }
}
