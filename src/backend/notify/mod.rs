//! Notification Fan-out Module
//!
//! Durable notifications, live pushes, email jobs and webhooks for domain
//! events.
//!
//! # Module Structure
//!
//! ```text
//! notify/
//! ├── mod.rs       - Module exports
//! ├── fanout.rs    - NotificationFanout
//! ├── store.rs     - NotificationStore trait and in-memory store
//! ├── email.rs     - Email queue (SMTP worker / log only)
//! ├── webhooks.rs  - Webhook subscriptions and dispatcher
//! ├── db.rs        - PostgreSQL implementations
//! └── handlers.rs  - REST handlers for reading notifications
//! ```

pub mod fanout;
pub mod store;
pub mod email;
pub mod webhooks;
pub mod db;
pub mod handlers;

pub use db::{PgNotificationStore, PgRecipients, PgWebhookDirectory};
pub use email::{EmailJob, EmailQueue, LogOnlyEmailQueue, MemoryRecipients, RecipientDirectory, SmtpEmailQueue};
pub use fanout::{FanoutReport, NotificationFanout};
pub use store::{MemoryNotificationStore, NotificationStore};
pub use webhooks::{
    MemoryWebhookDirectory, WebhookBody, WebhookDirectory, WebhookDispatcher, WebhookSubscription,
};
