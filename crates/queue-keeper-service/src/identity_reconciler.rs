//! Identity reconciler (C9, spec §4.9).
//!
//! An hourly background task that polls the identity provider for
//! account-lifecycle events (user-initiated `DELETE_ACCOUNT`, admin-initiated
//! `USER` DELETE) and propagates each one through the shared `DeleteUser`
//! routine (§4.8). A failure on one event is logged and does not abort the
//! rest of the batch; the whole batch carries its own 10-minute deadline
//! (§5 "Cancellation and timeouts").

use queue_keeper_core::{rpc, AuthorizationClient, EntityStore, IdentityProvider, Timestamp};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);
const BATCH_DEADLINE: Duration = Duration::from_secs(10 * 60);

/// Polls [`IdentityProvider::list_account_events`] on a fixed interval and
/// deletes affected users via [`rpc::delete_user`].
pub struct IdentityReconciler {
    entity_store: Arc<dyn EntityStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    authz: Arc<dyn AuthorizationClient>,
}

impl IdentityReconciler {
    pub fn new(
        entity_store: Arc<dyn EntityStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        authz: Arc<dyn AuthorizationClient>,
    ) -> Self {
        Self {
            entity_store,
            identity_provider,
            authz,
        }
    }

    /// Runs the poll loop forever. Intended to be spawned as its own task;
    /// a panic inside a single poll is not caught here, matching the rest of
    /// this binary's tasks (the process is supervised externally).
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        // The first tick fires immediately; reconcile once at startup rather
        // than waiting a full hour for the first poll.
        let mut since = Timestamp::now();
        loop {
            ticker.tick().await;
            let poll_started_at = Timestamp::now();
            match tokio::time::timeout(BATCH_DEADLINE, self.reconcile_once(since)).await {
                Ok(Ok(processed)) => {
                    info!(processed, "identity reconciler batch completed");
                    since = poll_started_at;
                }
                Ok(Err(err)) => {
                    error!(error = %err, "identity reconciler failed to list account events; will retry next interval");
                }
                Err(_) => {
                    error!("identity reconciler batch exceeded its 10-minute deadline; will retry next interval");
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn reconcile_once(&self, since: Timestamp) -> Result<usize, queue_keeper_core::TokenValidationError> {
        let events = self.identity_provider.list_account_events(since).await?;
        let mut processed = 0;
        for event in events {
            let subject = event.subject();
            if let Err(err) = rpc::delete_user(
                self.entity_store.as_ref(),
                self.authz.as_ref(),
                self.identity_provider.as_ref(),
                subject,
            )
            .await
            {
                warn!(subject = %subject, error = %err, "identity reconciler failed to delete user; continuing batch");
                continue;
            }
            processed += 1;
        }
        Ok(processed)
    }
}
