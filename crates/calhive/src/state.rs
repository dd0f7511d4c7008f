//! Shared application state.
//!
//! Built once per process (per Lambda execution environment) and cloned into
//! every handler. Holds no mutable state of its own.

use std::sync::Arc;

use calhive_core::storage::Table;
use calhive_core::OperationContext;

use crate::config::Config;
use crate::identity::{IdentityResolver, TokenVerifier};
use crate::services::{CalendarService, EventService};
use crate::stores::{CalendarStore, EventStore, TableUserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub calendars: CalendarService,
    pub events: EventService,
    pub identity: Arc<IdentityResolver>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the stores, services and identity resolver over `table`.
    pub fn new(table: Arc<dyn Table>, config: Config) -> Self {
        let users = Arc::new(TableUserDirectory::new(table.clone()));
        let verifier = TokenVerifier::new(config.jwt_secret.as_deref(), config.jwt_issuer.as_deref());

        let calendars = CalendarService::new(CalendarStore::new(table.clone()), users.clone());
        let events = EventService::new(EventStore::new(table), calendars.clone());

        Self {
            calendars,
            events,
            identity: Arc::new(IdentityResolver::new(verifier, users)),
            config: Arc::new(config),
        }
    }

    /// A context expiring after the configured request timeout.
    pub fn operation_context(&self) -> OperationContext {
        OperationContext::with_timeout(self.config.request_timeout())
    }
}
