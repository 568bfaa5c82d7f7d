use serde_json::{json, Value};
use shopfront_core::{AddToCartRequest, Cart, EntityId};

use super::{require_id, ApiClient, ApiPath};
use crate::envelope::{decode, unwrap_data};
use crate::error::ApiError;

impl ApiClient {
    /// Current cart for the signed-in user.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session; no request is made.
    /// - Any transport, status, or decode error from `GET /v1/cart`.
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        self.require_session()?;
        let body = self.get("/v1/cart", &[]).await?;
        decode(unwrap_data(body), "cart")
    }

    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - Any transport, status, or decode error from `POST /v1/cart`.
    pub async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<Cart, ApiError> {
        self.require_session()?;
        let body = self.post("/v1/cart", request).await?;
        self.cart_snapshot(body).await
    }

    /// Sets a line's quantity. Zero is sent as-is; the backend treats it as a
    /// removal.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - Any transport, status, or decode error from `PUT /v1/cart/{line_id}`.
    pub async fn update_cart_line(
        &self,
        line_id: &EntityId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        require_id(line_id, "cart line")?;
        self.require_session()?;
        let body = self
            .put(
                ApiPath::new("/v1/cart").id(line_id),
                &json!({ "quantity": quantity }),
            )
            .await?;
        self.cart_snapshot(body).await
    }

    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - Any transport, status, or decode error from `DELETE /v1/cart/{line_id}`.
    pub async fn remove_cart_line(&self, line_id: &EntityId) -> Result<Cart, ApiError> {
        require_id(line_id, "cart line")?;
        self.require_session()?;
        let body = self.delete(ApiPath::new("/v1/cart").id(line_id)).await?;
        self.cart_snapshot(body).await
    }

    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - Any transport, status, or decode error from `DELETE /v1/cart`.
    pub async fn clear_cart(&self) -> Result<Cart, ApiError> {
        self.require_session()?;
        let body = self.delete("/v1/cart").await?;
        let body = unwrap_data(body);
        if body.get("items").is_some() {
            decode(body, "cart")
        } else {
            Ok(Cart::empty())
        }
    }

    /// Mutations normally answer with the full cart. When they do not (204,
    /// or just the touched line), the cart is fetched again.
    async fn cart_snapshot(&self, body: Value) -> Result<Cart, ApiError> {
        let body = unwrap_data(body);
        if body.get("items").is_some() {
            decode(body, "cart")
        } else {
            tracing::debug!("cart mutation response had no items; reloading cart");
            self.get_cart().await
        }
    }
}
