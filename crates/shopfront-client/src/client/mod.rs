//! HTTP client for the storefront backend's versioned JSON API.

mod auth;
mod cart;
mod orders;
mod products;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use shopfront_core::{AppConfig, EntityId, ValidationError, DEFAULT_ORDER_CREATE_ENDPOINTS};

use crate::envelope::error_message;
use crate::error::ApiError;
use crate::session::Session;

pub use products::ProductQuery;

pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 12_000;
const DEFAULT_USER_AGENT: &str = "shopfront/0.1 (storefront-client)";

/// Client for the storefront backend.
///
/// Attaches the session's bearer token to every request and clears the
/// session when the backend answers 401. Cloning is cheap: clones share the
/// connection pool and the session.
///
/// Use [`ApiClient::new`] with loaded configuration, or
/// [`ApiClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    /// Base URL with the API prefix already applied, e.g. `https://shop/api`.
    base: Url,
    timeout_ms: u64,
    session: Session,
    order_create_endpoints: Arc<[String]>,
}

impl ApiClient {
    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] if the underlying `reqwest::Client` cannot be built.
    /// - [`ApiError::InvalidBaseUrl`] if the base URL does not parse.
    pub fn new(config: &AppConfig, session: Session) -> Result<Self, ApiError> {
        let client = Self::with_options(
            &config.api_base_url,
            &config.api_prefix,
            Duration::from_millis(config.request_timeout_ms),
            &config.user_agent,
            session,
        )?;
        Ok(client.with_order_create_endpoints(config.order_create_endpoints.clone()))
    }

    /// Creates a client against `base_url` with the default prefix, timeout,
    /// and order endpoints.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::with_options`].
    pub fn with_base_url(base_url: &str, session: Session) -> Result<Self, ApiError> {
        Self::with_options(
            base_url,
            DEFAULT_API_PREFIX,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
            DEFAULT_USER_AGENT,
            session,
        )
    }

    /// # Errors
    ///
    /// - [`ApiError::Http`] if the underlying `reqwest::Client` cannot be built.
    /// - [`ApiError::InvalidBaseUrl`] if `base_url` is not an absolute http(s) URL.
    pub fn with_options(
        base_url: &str,
        prefix: &str,
        timeout: Duration,
        user_agent: &str,
        session: Session,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()
            .map_err(ApiError::Http)?;

        let invalid = |reason: String| ApiError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };
        let mut base = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", base.scheme())));
        }
        base.set_query(None);
        base.set_fragment(None);
        {
            let mut segments = base
                .path_segments_mut()
                .map_err(|()| invalid("URL cannot be a base".to_owned()))?;
            segments.pop_if_empty();
            for segment in prefix.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }

        Ok(Self {
            http,
            base,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            session,
            order_create_endpoints: DEFAULT_ORDER_CREATE_ENDPOINTS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        })
    }

    /// Replaces the order-creation candidates. An empty list keeps the
    /// current ones.
    #[must_use]
    pub fn with_order_create_endpoints(mut self, endpoints: Vec<String>) -> Self {
        if !endpoints.is_empty() {
            self.order_create_endpoints = endpoints.into();
        }
        self
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fails fast for calls that need a signed-in user.
    fn require_session(&self) -> Result<(), ApiError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::NotAuthenticated)
        }
    }

    /// Resolves `path` against the base URL and appends `query`. Path
    /// segments are percent-encoded individually, so an id containing `/` or
    /// `?` stays one segment.
    fn build_url(&self, path: &ApiPath, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidBaseUrl {
                    base_url: self.base.to_string(),
                    reason: "URL cannot be a base".to_owned(),
                })?;
            segments.extend(&path.segments);
        }

        let mut pairs = path
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(query.iter().copied())
            .peekable();
        if pairs.peek().is_some() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn get(
        &self,
        path: impl Into<ApiPath>,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let url = self.build_url(&path.into(), query)?;
        self.execute(Method::GET, url, None::<&()>).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: impl Into<ApiPath>,
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.build_url(&path.into(), &[])?;
        self.execute(Method::POST, url, Some(body)).await
    }

    async fn put<B: Serialize + ?Sized>(
        &self,
        path: impl Into<ApiPath>,
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.build_url(&path.into(), &[])?;
        self.execute(Method::PUT, url, Some(body)).await
    }

    async fn delete(&self, path: impl Into<ApiPath>) -> Result<Value, ApiError> {
        let url = self.build_url(&path.into(), &[])?;
        self.execute(Method::DELETE, url, None::<&()>).await
    }

    /// Sends one request and returns the parsed JSON body.
    ///
    /// `Content-Type: application/json` is only set when there is a body.
    /// 204 and empty bodies come back as `Value::Null`. A 401 clears the
    /// session before the error is returned.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let mut request: RequestBuilder = self
            .http
            .request(method.clone(), url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(method = %method, url = %url, "sending request");
        let response = request.send().await.map_err(|e| self.transport_error(e, &url))?;
        let status = response.status();
        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "response received");

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, &url))?;

        if status == StatusCode::UNAUTHORIZED {
            if self.session.is_authenticated() {
                tracing::info!(url = %url, "backend rejected the session token");
            }
            self.session.clear();
            return Err(ApiError::Unauthorized {
                url: url.to_string(),
                message: error_message(status.as_u16(), &text),
            });
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message: error_message(status.as_u16(), &text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Deserialize {
            context: format!("{method} {url}"),
            source: e,
        })
    }

    fn transport_error(&self, err: reqwest::Error, url: &Url) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            ApiError::Http(err)
        }
    }
}

/// A request path relative to the API base.
///
/// Template text is split on `/` and may carry a `?query`. Ids are appended
/// whole, one segment each, and never parsed as path or query syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ApiPath {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl ApiPath {
    pub(crate) fn new(template: &str) -> Self {
        let (path, query) = template.split_once('?').unwrap_or((template, ""));
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
            query: query
                .split('&')
                .filter(|p| !p.is_empty())
                .map(|p| {
                    let (k, v) = p.split_once('=').unwrap_or((p, ""));
                    (k.to_owned(), v.to_owned())
                })
                .collect(),
        }
    }

    #[must_use]
    pub(crate) fn id(mut self, id: &EntityId) -> Self {
        self.segments.push(id.as_str().to_owned());
        self
    }

    #[must_use]
    pub(crate) fn then(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_owned());
        self
    }
}

impl From<&str> for ApiPath {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<&String> for ApiPath {
    fn from(template: &String) -> Self {
        Self::new(template)
    }
}

/// Rejects a blank id before it is spliced into a path.
fn require_id(id: &EntityId, kind: &'static str) -> Result<(), ApiError> {
    if id.is_blank() {
        Err(ValidationError::MissingId(kind).into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
