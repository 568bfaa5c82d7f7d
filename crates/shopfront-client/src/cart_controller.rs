//! Optimistic, debounced cart quantity updates.
//!
//! A quantity change is applied to the local cart immediately and committed
//! to the backend after a quiescence window. Rapid changes to one line
//! collapse into a single request carrying the last value. Each line moves
//! through `Idle → Scheduled → InFlight → Idle`; lines are independent.
//!
//! Every server response replaces the local cart wholesale. What happens on
//! a failed commit is governed by [`CartFailurePolicy`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use shopfront_core::{
    clamp_quantity, validate_add_to_cart, AddToCartRequest, AppConfig, Cart, CartFailurePolicy,
    EntityId, Product, ValidationError, Variant,
};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

use crate::client::ApiClient;
use crate::error::ApiError;

const EVENT_CAPACITY: usize = 64;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// Cart operations the controller needs from the backend. Every call
/// answers with the authoritative cart.
pub trait CartBackend: Clone + Send + Sync + 'static {
    fn fetch_cart(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    fn add_line(
        &self,
        request: &AddToCartRequest,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    fn update_line(
        &self,
        line_id: &EntityId,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    fn remove_line(&self, line_id: &EntityId)
        -> impl Future<Output = Result<Cart, ApiError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send;
}

impl CartBackend for ApiClient {
    fn fetch_cart(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.get_cart()
    }

    fn add_line(
        &self,
        request: &AddToCartRequest,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.add_to_cart(request)
    }

    fn update_line(
        &self,
        line_id: &EntityId,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.update_cart_line(line_id, quantity)
    }

    fn remove_line(
        &self,
        line_id: &EntityId,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.remove_cart_line(line_id)
    }

    fn clear(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send {
        self.clear_cart()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Quiescence window before a line's quantity is committed.
    pub debounce: Duration,
    pub failure_policy: CartFailurePolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            failure_policy: CartFailurePolicy::default(),
        }
    }
}

impl ControllerSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.cart_debounce_ms),
            failure_policy: config.cart_failure_policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CartEvent {
    /// The local cart changed ahead of the backend.
    Changed(Cart),
    /// A backend response replaced the local cart.
    Committed {
        line_id: Option<EntityId>,
        cart: Cart,
    },
    /// A backend mutation failed. `cart` is the local state after the
    /// failure policy was applied.
    CommitFailed {
        line_id: Option<EntityId>,
        quantity: Option<u32>,
        message: String,
        cart: Cart,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePhase {
    Idle,
    Scheduled,
    InFlight,
}

/// Outcome of [`CartController::request_quantity_change`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityChange {
    pub line_id: EntityId,
    pub requested: i64,
    /// Quantity after clamping to `[0, stock]`.
    pub quantity: u32,
    /// `false` when the clamped value equals the current one.
    pub scheduled: bool,
}

impl QuantityChange {
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        i64::from(self.quantity) != self.requested
    }
}

#[derive(Default)]
struct LineCommit {
    generation: u64,
    quantity: u32,
    timer: Option<JoinHandle<()>>,
    in_flight: u32,
}

impl LineCommit {
    fn phase(&self) -> LinePhase {
        if self.timer.is_some() {
            LinePhase::Scheduled
        } else if self.in_flight > 0 {
            LinePhase::InFlight
        } else {
            LinePhase::Idle
        }
    }
}

/// A scheduled commit that was cancelled: line and quantity.
type PendingCommit = (EntityId, u32);

#[derive(Default)]
struct ControllerState {
    cart: Cart,
    /// Last snapshot the backend returned.
    confirmed: Cart,
    /// Lines with a scheduled or in-flight commit. Idle lines are removed.
    lines: HashMap<EntityId, LineCommit>,
    next_generation: u64,
}

impl ControllerState {
    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Cancels the line's scheduled commit, returning the quantity it would
    /// have sent.
    fn cancel_timer(&mut self, line_id: &EntityId) -> Option<PendingCommit> {
        let entry = self.lines.get_mut(line_id)?;
        let cancelled = entry.timer.take().map(|timer| {
            timer.abort();
            (line_id.clone(), entry.quantity)
        });
        if entry.in_flight == 0 {
            self.lines.remove(line_id);
        }
        cancelled
    }

    fn cancel_all_timers(&mut self) -> Vec<PendingCommit> {
        let mut cancelled = Vec::new();
        for (line_id, entry) in &mut self.lines {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
                cancelled.push((line_id.clone(), entry.quantity));
            }
        }
        self.lines.retain(|_, entry| entry.in_flight > 0);
        cancelled
    }
}

struct Inner<B> {
    backend: B,
    settings: ControllerSettings,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<CartEvent>,
    closed: AtomicBool,
    idle: Notify,
}

/// Owns the local cart mirror and schedules per-line commits.
///
/// Must be used from within a Tokio runtime; commits run on spawned tasks.
/// Clones share state.
pub struct CartController<B: CartBackend = ApiClient> {
    inner: Arc<Inner<B>>,
}

impl<B: CartBackend> Clone for CartController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: CartBackend> CartController<B> {
    /// A controller holding the empty cart. Call [`Self::refresh`] to load
    /// the backend's.
    #[must_use]
    pub fn new(backend: B, settings: ControllerSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend,
                settings,
                state: Mutex::new(ControllerState::default()),
                events,
                closed: AtomicBool::new(false),
                idle: Notify::new(),
            }),
        }
    }

    /// Current local cart, including unconfirmed changes.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock().cart.clone()
    }

    #[must_use]
    pub fn line_phase(&self, line_id: &EntityId) -> LinePhase {
        self.lock()
            .lines
            .get(line_id)
            .map_or(LinePhase::Idle, LineCommit::phase)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Sets a line's quantity locally and schedules its commit.
    ///
    /// `desired` is clamped to `[0, stock]`. The local line total and cart
    /// total are re-estimated at once. A pending commit for the same line is
    /// cancelled and rescheduled, so only the last value of a burst is sent.
    /// A value that clamps to the current quantity changes nothing.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] with [`ValidationError::UnknownCartLine`]
    ///   if the line is not in the cart.
    /// - [`ApiError::Closed`] after [`Self::close`].
    pub fn request_quantity_change(
        &self,
        line_id: &EntityId,
        desired: i64,
    ) -> Result<QuantityChange, ApiError> {
        if self.is_closed() {
            return Err(ApiError::Closed);
        }

        let (change, snapshot) = {
            let mut guard = self.lock();
            let state = &mut *guard;

            let (current, max_stock) = state
                .cart
                .line(line_id)
                .map(|line| (line.quantity, line.max_stock()))
                .ok_or_else(|| ValidationError::UnknownCartLine {
                    line_id: line_id.clone(),
                })?;

            let quantity = clamp_quantity(desired, max_stock);
            let mut change = QuantityChange {
                line_id: line_id.clone(),
                requested: desired,
                quantity,
                scheduled: false,
            };
            if quantity == current {
                return Ok(change);
            }

            state.cart.apply_quantity(line_id, quantity)?;
            let generation = state.bump_generation();
            let entry = state.lines.entry(line_id.clone()).or_default();
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
            entry.generation = generation;
            entry.quantity = quantity;
            entry.timer = Some(self.spawn_commit(
                line_id.clone(),
                generation,
                Some(self.inner.settings.debounce),
            ));

            change.scheduled = true;
            (change, state.cart.clone())
        };

        tracing::debug!(
            line_id = %line_id,
            requested = desired,
            quantity = change.quantity,
            "cart line quantity changed locally"
        );
        self.publish(CartEvent::Changed(snapshot));
        Ok(change)
    }

    /// Loads the backend cart. Without a session, or when the backend
    /// rejects it, the cart is empty rather than an error.
    ///
    /// # Errors
    ///
    /// Transport and status errors other than authentication failures.
    pub async fn refresh(&self) -> Result<Cart, ApiError> {
        let cart = match self.inner.backend.fetch_cart().await {
            Ok(cart) => cart,
            Err(err) if err.is_auth() => {
                tracing::debug!(error = %err, "no usable session; using empty cart");
                Cart::empty()
            }
            Err(err) => return Err(err),
        };
        Ok(self.apply_snapshot(cart, None))
    }

    /// Validates the selection and adds it to the cart. Validation failures
    /// never reach the backend.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] if no variant resolves or stock is short.
    /// - Backend errors from the add request.
    pub async fn add(
        &self,
        product: &Product,
        variants: &[Variant],
        selected_color: Option<&str>,
        selected_size: Option<&str>,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let request =
            validate_add_to_cart(product, variants, selected_color, selected_size, quantity)?;
        self.ensure_open()?;
        match self.inner.backend.add_line(&request).await {
            Ok(cart) => Ok(self.apply_snapshot(cart, None)),
            Err(err) => Err(self.report_failure(None, Some(request.quantity), err)),
        }
    }

    /// Removes a line right away, cancelling any pending commit for it.
    /// A refused removal settles that commit the way [`Self::clear`] does.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] if the line is not in the cart.
    /// - Backend errors from the remove request.
    pub async fn remove_line(&self, line_id: &EntityId) -> Result<Cart, ApiError> {
        self.ensure_open()?;
        let cancelled = {
            let mut state = self.lock();
            if state.cart.line(line_id).is_none() {
                return Err(ValidationError::UnknownCartLine {
                    line_id: line_id.clone(),
                }
                .into());
            }
            state.cancel_timer(line_id)
        };
        self.notify_if_idle();

        match self.inner.backend.remove_line(line_id).await {
            Ok(cart) => Ok(self.apply_snapshot(cart, Some(line_id.clone()))),
            Err(err) => {
                self.recover_cancelled(cancelled.into_iter().collect());
                Err(self.report_failure(Some(line_id.clone()), Some(0), err))
            }
        }
    }

    /// Empties the cart, cancelling every pending commit.
    ///
    /// If the backend refuses, the cancelled commits are rescheduled under
    /// [`CartFailurePolicy::KeepOptimistic`] and dropped, with the cart
    /// reverted, under [`CartFailurePolicy::RevertToConfirmed`].
    ///
    /// # Errors
    ///
    /// Backend errors from the clear request.
    pub async fn clear(&self) -> Result<Cart, ApiError> {
        self.ensure_open()?;
        let cancelled = self.lock().cancel_all_timers();
        self.notify_if_idle();

        match self.inner.backend.clear().await {
            Ok(cart) => Ok(self.apply_snapshot(cart, None)),
            Err(err) => {
                self.recover_cancelled(cancelled);
                Err(self.report_failure(None, None, err))
            }
        }
    }

    /// Commits every scheduled line now and waits until no commit is
    /// scheduled or in flight.
    pub async fn flush(&self) {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            let scheduled: Vec<EntityId> = state
                .lines
                .iter()
                .filter(|(_, entry)| entry.timer.is_some())
                .map(|(id, _)| id.clone())
                .collect();
            for line_id in scheduled {
                let generation = state.bump_generation();
                if let Some(entry) = state.lines.get_mut(&line_id) {
                    if let Some(timer) = entry.timer.take() {
                        timer.abort();
                    }
                    entry.generation = generation;
                    entry.timer = Some(self.spawn_commit(line_id, generation, None));
                }
            }
        }

        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.lock().lines.is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Tears the controller down: scheduled commits are cancelled and
    /// responses still in flight are discarded when they land.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.lock().cancel_all_timers();
        tracing::debug!("cart controller closed");
        self.notify_if_idle();
    }

    fn spawn_commit(
        &self,
        line_id: EntityId,
        generation: u64,
        delay: Option<Duration>,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            controller.commit_line(line_id, generation).await;
        })
    }

    async fn commit_line(&self, line_id: EntityId, generation: u64) {
        let quantity = {
            let mut state = self.lock();
            if self.is_closed() {
                return;
            }
            let Some(entry) = state.lines.get_mut(&line_id) else {
                return;
            };
            if entry.generation != generation {
                // Superseded by a newer request for this line.
                return;
            }
            entry.timer = None;
            entry.in_flight += 1;
            entry.quantity
        };

        tracing::debug!(line_id = %line_id, quantity, "committing cart line");
        let result = self.inner.backend.update_line(&line_id, quantity).await;

        let event = {
            let mut guard = self.lock();
            let state = &mut *guard;

            let now_idle = state.lines.get_mut(&line_id).is_some_and(|entry| {
                entry.in_flight = entry.in_flight.saturating_sub(1);
                entry.phase() == LinePhase::Idle
            });
            if now_idle {
                state.lines.remove(&line_id);
            }

            if self.is_closed() {
                tracing::debug!(line_id = %line_id, "discarding cart response after close");
                None
            } else {
                Some(match result {
                    Ok(cart) => {
                        state.cart = cart.clone();
                        state.confirmed = cart.clone();
                        CartEvent::Committed {
                            line_id: Some(line_id.clone()),
                            cart,
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            line_id = %line_id,
                            quantity,
                            error = %err,
                            "cart line commit failed"
                        );
                        if self.inner.settings.failure_policy
                            == CartFailurePolicy::RevertToConfirmed
                        {
                            state.cart = state.confirmed.clone();
                        }
                        CartEvent::CommitFailed {
                            line_id: Some(line_id.clone()),
                            quantity: Some(quantity),
                            message: err.to_string(),
                            cart: state.cart.clone(),
                        }
                    }
                })
            }
        };

        self.notify_if_idle();
        if let Some(event) = event {
            self.publish(event);
        }
    }

    /// Replaces the local and confirmed carts with a backend snapshot.
    fn apply_snapshot(&self, cart: Cart, line_id: Option<EntityId>) -> Cart {
        if self.is_closed() {
            return cart;
        }
        {
            let mut state = self.lock();
            state.cart = cart.clone();
            state.confirmed = cart.clone();
        }
        self.publish(CartEvent::Committed {
            line_id,
            cart: cart.clone(),
        });
        cart
    }

    /// Settles commits cancelled by a remove or clear the backend refused.
    ///
    /// Under [`CartFailurePolicy::KeepOptimistic`] the local quantities
    /// stand, so each cancelled commit is scheduled again. Under
    /// [`CartFailurePolicy::RevertToConfirmed`] the local cart goes back to
    /// the last confirmed snapshot and the commits are dropped.
    fn recover_cancelled(&self, cancelled: Vec<PendingCommit>) {
        if self.is_closed() {
            return;
        }
        let mut guard = self.lock();
        let state = &mut *guard;
        match self.inner.settings.failure_policy {
            CartFailurePolicy::RevertToConfirmed => {
                state.cart = state.confirmed.clone();
            }
            CartFailurePolicy::KeepOptimistic => {
                for (line_id, quantity) in cancelled {
                    if state.cart.line(&line_id).is_none() {
                        continue;
                    }
                    tracing::debug!(line_id = %line_id, quantity, "rescheduling cancelled commit");
                    let generation = state.bump_generation();
                    let entry = state.lines.entry(line_id.clone()).or_default();
                    entry.generation = generation;
                    entry.quantity = quantity;
                    entry.timer = Some(self.spawn_commit(
                        line_id,
                        generation,
                        Some(self.inner.settings.debounce),
                    ));
                }
            }
        }
    }

    fn report_failure(
        &self,
        line_id: Option<EntityId>,
        quantity: Option<u32>,
        err: ApiError,
    ) -> ApiError {
        tracing::warn!(
            line_id = line_id.as_ref().map(tracing::field::display),
            error = %err,
            "cart mutation failed"
        );
        let cart = self.cart();
        self.publish(CartEvent::CommitFailed {
            line_id,
            quantity,
            message: err.to_string(),
            cart,
        });
        err
    }

    fn ensure_open(&self) -> Result<(), ApiError> {
        if self.is_closed() {
            Err(ApiError::Closed)
        } else {
            Ok(())
        }
    }

    fn notify_if_idle(&self) {
        if self.lock().lines.is_empty() {
            self.inner.idle.notify_waiters();
        }
    }

    fn publish(&self, event: CartEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "cart_controller_test.rs"]
mod tests;
