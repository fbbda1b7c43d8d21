/**
 * Access View Source and Guard
 *
 * The persistence layer owns projects, tasks, issues and calendar events.
 * It is consumed here through `AccessViewSource`, which resolves an entity
 * to its normalized `AccessView`. `AccessGuard` combines that lookup with the
 * gate so handlers get a single call that either yields the fresh view or
 * the right error.
 */

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::access::gate;
use crate::backend::error::BackendError;
use crate::shared::{AccessView, EntityKind, Identity};

/// Entity lookup collaborator (`getEntityAccessView`)
#[async_trait]
pub trait AccessViewSource: Send + Sync {
    /// Resolve an entity to its access view; `Ok(None)` if it does not exist
    async fn access_view(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<AccessView>, BackendError>;
}

/// Lookup + gate in one step
#[derive(Clone)]
pub struct AccessGuard {
    source: Arc<dyn AccessViewSource>,
}

impl AccessGuard {
    pub fn new(source: Arc<dyn AccessViewSource>) -> Self {
        Self { source }
    }

    /// Fetch a fresh view of the entity and check `actor` against it
    ///
    /// # Errors
    ///
    /// - `NotFound` if the entity does not exist
    /// - `Authorization` if the gate denies the actor
    pub async fn authorize(
        &self,
        actor: &Identity,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<AccessView, BackendError> {
        let view = self
            .source
            .access_view(kind, id)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("{} {} not found", kind, id)))?;

        match gate::evaluate(actor.id, &view) {
            Some(grant) => {
                tracing::debug!(
                    "[Access] {} granted on {} {} via {:?}",
                    actor.id,
                    kind,
                    id,
                    grant
                );
                Ok(view)
            }
            None => {
                tracing::info!("[Access] {} denied on {} {}", actor.id, kind, id);
                Err(BackendError::authorization(format!(
                    "Access denied to {} {}",
                    kind, id
                )))
            }
        }
    }
}
