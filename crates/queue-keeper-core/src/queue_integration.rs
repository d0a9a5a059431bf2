//! # Queue integration layer (C6, spec §4.6)
//!
//! Publishes normalized [`crate::WorkItem`]s onto the message bus named as
//! an external collaborator in spec §1, through queue-runtime's
//! [`QueueClient`] seam.

// Re-export queue-runtime types for convenience
pub use queue_runtime::{Message, MessageId, QueueClient, QueueError, QueueName, SessionId};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur publishing a work item to the bus.
#[derive(Debug, thiserror::Error)]
pub enum QueueDeliveryError {
    #[error("Queue client error: {0}")]
    QueueClientError(#[from] QueueError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl QueueDeliveryError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueueClientError(queue_error) => queue_error.is_transient(),
            Self::SerializationError(_) => false,
            Self::ConfigurationError(_) => false,
        }
    }
}

// ============================================================================
// Work-item publisher (C6, spec §4.6)
// ============================================================================

/// The fixed bus topics a [`crate::WorkItem`] may be routed to (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Evaluate,
    ReconcileAdd,
    ReconcileDelete,
    Installation,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evaluate => "evaluate",
            Self::ReconcileAdd => "reconcile-add",
            Self::ReconcileDelete => "reconcile-delete",
            Self::Installation => "installation",
        }
    }

    pub fn for_work_item(item: &crate::WorkItem) -> Self {
        match item {
            crate::WorkItem::EntityEvaluate { .. } => Self::Evaluate,
            crate::WorkItem::EntityReconcileAdd { .. } => Self::ReconcileAdd,
            crate::WorkItem::EntityReconcileDelete { .. } => Self::ReconcileDelete,
            crate::WorkItem::InstallationLifecycle { .. } => Self::Installation,
        }
    }
}

/// Publishes [`crate::WorkItem`]s to their topic queue (§4.6).
///
/// Publication is fire-and-forget from the caller's perspective: a failure
/// here maps to an HTTP 500 by the webhook handler so the upstream retries
/// the delivery. At-most-once delivery and unordered-across-messages
/// semantics are accepted; idempotence is the downstream evaluator's job
/// (§4.6, §9 "Webhook idempotence").
pub struct WorkItemPublisher<'a> {
    queue_client: &'a dyn QueueClient,
}

impl<'a> WorkItemPublisher<'a> {
    pub fn new(queue_client: &'a dyn QueueClient) -> Self {
        Self { queue_client }
    }

    /// Publish one work item, tagging the message with the delivery id, the
    /// provider-source URL, and the original upstream event-type string
    /// (§4.6 "Messages carry ... metadata").
    pub async fn publish(
        &self,
        item: &crate::WorkItem,
        delivery_id: &str,
        provider_source: &str,
        event_type: &str,
    ) -> Result<MessageId, QueueDeliveryError> {
        let topic = Topic::for_work_item(item);
        let queue_name = QueueName::new(topic.as_str().to_string())
            .map_err(|e| QueueDeliveryError::ConfigurationError(e.to_string()))?;

        let body = serde_json::to_vec(item)
            .map_err(|e| QueueDeliveryError::SerializationError(e.to_string()))?;

        let message = Message::new(body.into())
            .with_attribute("delivery_id".to_string(), delivery_id.to_string())
            .with_attribute("provider_source".to_string(), provider_source.to_string())
            .with_attribute("event_type".to_string(), event_type.to_string())
            .with_correlation_id(uuid::Uuid::new_v4().to_string());

        self.queue_client
            .send_message(&queue_name, message)
            .await
            .map_err(QueueDeliveryError::QueueClientError)
    }
}

#[cfg(test)]
#[path = "queue_integration_tests.rs"]
mod tests;
