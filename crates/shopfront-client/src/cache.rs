//! Per-session product cache.
//!
//! Products are read-only for the life of a session, so the cache only
//! grows. Concurrent lookups for an id that is not cached yet share one
//! request: the first caller starts it and parks a [`Shared`] handle in the
//! in-flight map, later callers await that same handle. The in-flight entry
//! is removed when the request settles. Failures are not cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use shopfront_core::{EntityId, Product};

use crate::client::ApiClient;
use crate::error::ApiError;

/// Anything that can fetch a product by id.
pub trait ProductSource: Clone + Send + Sync + 'static {
    fn fetch_product(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;
}

impl ProductSource for ApiClient {
    fn fetch_product(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send {
        self.get_product(id)
    }
}

/// Errors are shared between every caller waiting on the same request.
pub type SharedApiError = Arc<ApiError>;

type PendingFetch = Shared<BoxFuture<'static, Result<Arc<Product>, SharedApiError>>>;

#[derive(Default)]
struct CacheState {
    ready: HashMap<EntityId, Arc<Product>>,
    in_flight: HashMap<EntityId, PendingFetch>,
}

#[derive(Clone)]
pub struct ProductCache<S = ApiClient> {
    source: S,
    state: Arc<Mutex<CacheState>>,
}

impl<S: ProductSource> ProductCache<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Returns the cached product or fetches it, joining any request
    /// already in flight for the same id.
    ///
    /// # Errors
    ///
    /// The fetch error, shared with every concurrent caller for this id.
    pub async fn get(&self, id: &EntityId) -> Result<Arc<Product>, SharedApiError> {
        let pending = {
            let mut state = lock(&self.state);
            if let Some(product) = state.ready.get(id) {
                return Ok(Arc::clone(product));
            }
            if let Some(pending) = state.in_flight.get(id) {
                pending.clone()
            } else {
                let pending = self.start_fetch(id.clone());
                state.in_flight.insert(id.clone(), pending.clone());
                pending
            }
        };
        pending.await
    }

    /// Looks up several products concurrently. Ids that fail to load are
    /// logged and left out of the result.
    pub async fn get_many<'a, I>(&self, ids: I) -> HashMap<EntityId, Arc<Product>>
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        let mut unique: Vec<EntityId> = Vec::new();
        for id in ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }

        let results = join_all(unique.iter().map(|id| self.get(id))).await;

        unique
            .into_iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(product) => Some((id, product)),
                Err(err) => {
                    tracing::warn!(product_id = %id, error = %err, "skipping product that failed to load");
                    None
                }
            })
            .collect()
    }

    /// Cached product without fetching.
    #[must_use]
    pub fn peek(&self, id: &EntityId) -> Option<Arc<Product>> {
        lock(&self.state).ready.get(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).ready.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        lock(&self.state).in_flight.len()
    }

    fn start_fetch(&self, id: EntityId) -> PendingFetch {
        let source = self.source.clone();
        let state = Arc::clone(&self.state);
        async move {
            let result = source.fetch_product(&id).await;
            let mut state = lock(&state);
            state.in_flight.remove(&id);
            match result {
                Ok(product) => {
                    let product = Arc::new(product);
                    state.ready.insert(id, Arc::clone(&product));
                    Ok(product)
                }
                Err(err) => {
                    tracing::debug!(product_id = %id, error = %err, "product fetch failed");
                    Err(Arc::new(err))
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
