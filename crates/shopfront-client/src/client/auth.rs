use serde_json::json;
use shopfront_core::{Credentials, EntityId, LoginRequest, RegisterRequest, UserProfile};

use super::{require_id, ApiClient, ApiPath};
use crate::envelope::{decode, extract_credentials, unwrap_data};
use crate::error::ApiError;

impl ApiClient {
    /// Signs in and stores the returned credentials in the session.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unauthorized`] / [`ApiError::Status`] for rejected logins.
    /// - [`ApiError::MissingToken`] if the response has no token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials, ApiError> {
        let request = LoginRequest::new(email, password);
        let body = self.post("/v1/auth/login", &request).await?;
        let credentials = extract_credentials(&body).ok_or(ApiError::MissingToken)?;
        self.session.set(credentials.clone());
        Ok(credentials)
    }

    /// # Errors
    ///
    /// Any transport or status error from `POST /v1/auth/register`.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.post("/v1/auth/register", request).await?;
        Ok(())
    }

    /// Tells the backend to end the session, then clears it locally.
    ///
    /// Backend failures other than 401 are ignored; the local session is
    /// cleared either way.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] if the backend rejected the token.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.post("/v1/auth/logout", &json!({})).await;
        self.session.clear();
        match result {
            Err(err @ ApiError::Unauthorized { .. }) => Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "logout request failed; session cleared locally");
                Ok(())
            }
            Ok(_) => Ok(()),
        }
    }

    /// Profile of the signed-in user, or `None` when it cannot be loaded.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - [`ApiError::Unauthorized`] if the backend rejects the token.
    pub async fn current_user(&self) -> Result<Option<UserProfile>, ApiError> {
        self.require_session()?;
        let body = match self.get("/v1/users/me", &[]).await {
            Ok(body) => body,
            Err(err @ ApiError::Unauthorized { .. }) => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "could not load current user");
                return Ok(None);
            }
        };
        let body = unwrap_data(body);
        if body.is_null() {
            return Ok(None);
        }
        match decode::<UserProfile>(body, "current user") {
            Ok(profile) => Ok(Some(profile)),
            Err(err) => {
                tracing::warn!(error = %err, "could not read current user profile");
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error from `GET /v1/users/{id}`.
    pub async fn user_by_id(&self, id: &EntityId) -> Result<UserProfile, ApiError> {
        require_id(id, "user")?;
        let body = self.get(ApiPath::new("/v1/users").id(id), &[]).await?;
        decode(unwrap_data(body), &format!("user {id}"))
    }
}
