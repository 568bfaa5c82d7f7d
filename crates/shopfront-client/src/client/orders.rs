use shopfront_core::{CreateOrderRequest, EntityId, Order, OrderReceipt};

use super::{require_id, ApiClient, ApiPath};
use crate::envelope::{decode, decode_list, unwrap_data};
use crate::error::ApiError;
use crate::fallback::try_candidates;

/// Paths that have served the signed-in user's orders, most likely first.
const MY_ORDERS_ENDPOINTS: [&str; 6] = [
    "/v1/orders/me",
    "/v1/orders",
    "/v1/orders?mine=true",
    "/v1/my/orders",
    "/v1/order",
    "/v1/order/list",
];

/// Collections an order id is looked up under.
const ORDER_BY_ID_ENDPOINTS: [&str; 2] = ["/v1/orders", "/v1/order"];

impl ApiClient {
    /// Places an order from the current cart.
    ///
    /// Each configured creation path is tried in turn. The body is decoded
    /// after a path accepts the request so a shape mismatch never causes a
    /// second order to be posted.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - [`ApiError::AllCandidatesFailed`] when no path accepts the order.
    /// - [`ApiError::Deserialize`] if the accepted response is not an object.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderReceipt, ApiError> {
        self.require_session()?;
        let body = try_candidates("create order", &*self.order_create_endpoints, |path| async move {
            self.post(&path, request).await
        })
        .await?;

        let body = unwrap_data(body);
        if body.is_null() {
            return Ok(OrderReceipt::default());
        }
        decode(body, "created order")
    }

    /// The signed-in user's orders. When every known path fails the list is
    /// empty rather than an error; a 401 is still returned.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - [`ApiError::Unauthorized`] if the backend rejects the token.
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.require_session()?;
        let result = try_candidates("my orders", &MY_ORDERS_ENDPOINTS, |path| async move {
            let body = self.get(&path, &[]).await?;
            decode_list::<Order>(unwrap_data(body), "order list")
        })
        .await;

        match result {
            Ok(orders) => Ok(orders),
            Err(err) if err.is_auth() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "no order list endpoint answered; showing none");
                Ok(Vec::new())
            }
        }
    }

    /// # Errors
    ///
    /// - [`ApiError::NotAuthenticated`] without a session.
    /// - [`ApiError::AllCandidatesFailed`] when neither path returns the order.
    pub async fn get_order(&self, id: &EntityId) -> Result<Order, ApiError> {
        require_id(id, "order")?;
        self.require_session()?;
        let context = format!("order {id}");
        try_candidates("order by id", &ORDER_BY_ID_ENDPOINTS, |path| {
            let context = &context;
            async move {
                let body = self.get(ApiPath::new(&path).id(id), &[]).await?;
                decode(unwrap_data(body), context)
            }
        })
        .await
    }
}
