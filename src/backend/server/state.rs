/**
 * Application State Management
 *
 * `AppState` is the central state container shared by every handler. It is
 * built once at process start from a `ServerConfig` and a set of
 * collaborators (token verifier, entity lookup, stores, email queue), so
 * tests can build as many independent states as they need.
 *
 * # Thread Safety
 *
 * Every component is cheap to clone and internally shares its state through
 * `Arc`; connection and room state lives behind one `tokio::sync::RwLock`
 * inside the registry.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract a single component
 * instead of the whole `AppState`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::access::db::PgAccessViews;
use crate::backend::access::memory::MemoryAccessViews;
use crate::backend::access::{AccessGuard, AccessViewSource};
use crate::backend::auth::{JwtVerifier, TokenVerifier};
use crate::backend::chat::{MemoryMessageStore, MessageStore, PgMessageStore};
use crate::backend::error::BackendError;
use crate::backend::notify::{
    EmailQueue, LogOnlyEmailQueue, MemoryNotificationStore, MemoryWebhookDirectory,
    NotificationFanout, NotificationStore, PgNotificationStore, PgRecipients, PgWebhookDirectory,
    SmtpEmailQueue, WebhookDirectory, WebhookDispatcher,
};
use crate::backend::realtime::{CommandDispatcher, ConnectionRegistry, RoomManager};
use crate::backend::server::config::ServerConfig;
use crate::backend::timer::{MemoryTimerStore, PgTimerStore, TimeTracker, TimerStore};

/// External collaborators the core consumes
#[derive(Clone)]
pub struct Collaborators {
    pub verifier: Arc<dyn TokenVerifier>,
    pub access: Arc<dyn AccessViewSource>,
    pub messages: Arc<dyn MessageStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub webhooks: Arc<dyn WebhookDirectory>,
    pub email: Arc<dyn EmailQueue>,
    pub timers: Arc<dyn TimerStore>,
}

impl Collaborators {
    /// Process-local collaborators with a log-only mailer
    ///
    /// Returns the access store alongside so callers can seed entities.
    pub fn in_memory(verifier: Arc<dyn TokenVerifier>) -> (Self, Arc<MemoryAccessViews>) {
        let access = Arc::new(MemoryAccessViews::new());
        let collaborators = Self {
            verifier,
            access: access.clone(),
            messages: Arc::new(MemoryMessageStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
            webhooks: Arc::new(MemoryWebhookDirectory::new()),
            email: Arc::new(LogOnlyEmailQueue),
            timers: Arc::new(MemoryTimerStore::new()),
        };
        (collaborators, access)
    }

    /// PostgreSQL-backed collaborators
    pub fn postgres(pool: PgPool, verifier: Arc<dyn TokenVerifier>, email: Arc<dyn EmailQueue>) -> Self {
        Self {
            verifier,
            access: Arc::new(PgAccessViews::new(pool.clone())),
            messages: Arc::new(PgMessageStore::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool.clone())),
            webhooks: Arc::new(PgWebhookDirectory::new(pool.clone())),
            email,
            timers: Arc::new(PgTimerStore::new(pool)),
        }
    }
}

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub guard: AccessGuard,
    pub registry: ConnectionRegistry,
    pub rooms: RoomManager,
    pub dispatcher: CommandDispatcher,
    pub fanout: NotificationFanout,
    pub notifications: Arc<dyn NotificationStore>,
    pub timers: TimeTracker,
    /// Database connection pool (optional)
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Wire the components together
    pub fn new(
        config: ServerConfig,
        collaborators: Collaborators,
        db_pool: Option<PgPool>,
    ) -> Result<Self, BackendError> {
        let guard = AccessGuard::new(collaborators.access);
        let registry = ConnectionRegistry::new(collaborators.verifier.clone());
        let rooms = RoomManager::new(registry.clone(), guard.clone());
        let dispatcher = CommandDispatcher::new(rooms.clone(), guard.clone(), collaborators.messages);
        let fanout = NotificationFanout::new(
            collaborators.notifications.clone(),
            rooms.clone(),
            collaborators.email,
            collaborators.webhooks,
            WebhookDispatcher::new(config.webhook_timeout)?,
        );

        Ok(Self {
            config: Arc::new(config),
            verifier: collaborators.verifier,
            guard,
            registry,
            rooms,
            dispatcher,
            fanout,
            notifications: collaborators.notifications,
            timers: TimeTracker::new(collaborators.timers),
            db_pool,
        })
    }

    /// Build state from configuration, using the database when available
    pub fn from_config(config: ServerConfig, db_pool: Option<PgPool>) -> Result<Self, BackendError> {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(&config.jwt_secret));

        let collaborators = match &db_pool {
            Some(pool) => {
                let email: Arc<dyn EmailQueue> = match &config.smtp {
                    Some(smtp) => Arc::new(SmtpEmailQueue::spawn(
                        smtp,
                        Arc::new(PgRecipients::new(pool.clone())),
                        config.email_queue_capacity,
                    )?),
                    None => Arc::new(LogOnlyEmailQueue),
                };
                Collaborators::postgres(pool.clone(), verifier, email)
            }
            None => {
                if config.smtp.is_some() {
                    tracing::warn!("[Email] SMTP configured but no database for recipient lookup; logging only");
                }
                Collaborators::in_memory(verifier).0
            }
        };

        Self::new(config, collaborators, db_pool)
    }
}

impl FromRef<AppState> for ConnectionRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for TimeTracker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.timers.clone()
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
