use serde_json::Value;
use shopfront_core::lenient::value_to_label;
use shopfront_core::{EntityId, Product, Variant};

use super::{require_id, ApiClient, ApiPath};
use crate::envelope::{decode, decode_list, extract_list, unwrap_data};
use crate::error::ApiError;

/// Query for the product listing. Defaults to the five newest products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub limit: u32,
    pub sort: String,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: 5,
            sort: "-createdAt".to_owned(),
            category: None,
            search: None,
        }
    }
}

impl ApiClient {
    /// # Errors
    ///
    /// Any transport, status, or decode error from `GET /v1/products`.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let limit = query.limit.to_string();
        let mut params = vec![("limit", limit.as_str()), ("sort", query.sort.as_str())];
        if let Some(category) = &query.category {
            params.push(("category", category.as_str()));
        }
        if let Some(search) = &query.search {
            params.push(("q", search.as_str()));
        }

        let body = self.get("/v1/products", &params).await?;
        decode_list(body, "product list")
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error from `GET /v1/products/{id}`.
    pub async fn get_product(&self, id: &EntityId) -> Result<Product, ApiError> {
        require_id(id, "product")?;
        let body = self.get(ApiPath::new("/v1/products").id(id), &[]).await?;
        decode(unwrap_data(body), &format!("product {id}"))
    }

    /// Variants for a product.
    ///
    /// Tries the nested `/v1/products/{id}/variants` resource first. If that
    /// fails or does not return a list, falls back to
    /// `/v1/product-variants?product_id={id}`, whose failure is returned.
    /// A fallback body without a list reads as no variants.
    ///
    /// # Errors
    ///
    /// Transport, status, or decode errors from the fallback request.
    pub async fn get_variants(&self, product_id: &EntityId) -> Result<Vec<Variant>, ApiError> {
        require_id(product_id, "product")?;
        let context = format!("variants of product {product_id}");

        match self
            .get(
                ApiPath::new("/v1/products").id(product_id).then("variants"),
                &[],
            )
            .await
        {
            Ok(body) => {
                if let Some(items) = extract_list(unwrap_data(body)) {
                    return items.into_iter().map(|v| decode(v, &context)).collect();
                }
                tracing::debug!(product_id = %product_id, "nested variants response had no list");
            }
            Err(err @ (ApiError::Unauthorized { .. } | ApiError::InvalidBaseUrl { .. })) => {
                return Err(err);
            }
            Err(err) => {
                tracing::debug!(product_id = %product_id, error = %err, "nested variants request failed");
            }
        }

        let body = self
            .get(
                "/v1/product-variants",
                &[("product_id", product_id.as_str())],
            )
            .await?;
        match extract_list(unwrap_data(body)) {
            Some(items) => items.into_iter().map(|v| decode(v, &context)).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// A product with its variants. Nested variants on the product body are
    /// used when present; otherwise they are fetched separately.
    ///
    /// # Errors
    ///
    /// Errors from [`ApiClient::get_product`] or [`ApiClient::get_variants`].
    pub async fn get_product_with_variants(
        &self,
        id: &EntityId,
    ) -> Result<(Product, Vec<Variant>), ApiError> {
        let mut product = self.get_product(id).await?;
        let variants = if product.variants.is_empty() {
            self.get_variants(id).await?
        } else {
            std::mem::take(&mut product.variants)
        };
        Ok((product, variants))
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error from `GET /v1/colors`.
    pub async fn list_colors(&self) -> Result<Vec<String>, ApiError> {
        let body = self.get("/v1/colors", &[]).await?;
        labels(body, "colors")
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error from `GET /v1/sizes`.
    pub async fn list_sizes(&self) -> Result<Vec<String>, ApiError> {
        let body = self.get("/v1/sizes", &[]).await?;
        labels(body, "sizes")
    }
}

fn labels(body: Value, context: &str) -> Result<Vec<String>, ApiError> {
    let items: Vec<Value> = decode_list(body, context)?;
    Ok(items.iter().filter_map(value_to_label).collect())
}
