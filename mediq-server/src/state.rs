//! Application state shared by all handlers

use std::sync::Arc;

use crate::booking::BookingCoordinator;
use crate::crypto::BCRYPT_COST;
use crate::store::{BookingLedger, SessionStore, UserStore};

/// Stores and settings handed to every route
pub struct AppState<U, B, S> {
    pub user_store: Arc<U>,
    pub ledger: Arc<B>,
    pub session_store: Arc<S>,
    /// bcrypt cost for new credentials
    pub bcrypt_cost: u32,
}

impl<U, B, S> AppState<U, B, S>
where
    U: UserStore,
    B: BookingLedger,
    S: SessionStore,
{
    pub fn new(user_store: U, ledger: B, session_store: S) -> Self {
        Self {
            user_store: Arc::new(user_store),
            ledger: Arc::new(ledger),
            session_store: Arc::new(session_store),
            bcrypt_cost: BCRYPT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn coordinator(&self) -> BookingCoordinator<'_, U, B> {
        BookingCoordinator::new(self.user_store.as_ref(), self.ledger.as_ref())
    }
}
