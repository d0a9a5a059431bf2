//! Event processor for converting raw webhooks to normalized events.

use serde_json::Value;

use crate::client::Repository;
use crate::error::EventError;

use super::{EntityType, EventEnvelope, EventId, EventPayload};

/// Event processor configuration.
///
/// Controls how webhook events are processed, validated, and normalized.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Enable webhook signature validation
    pub enable_signature_validation: bool,

    /// Enable session correlation for ordered processing
    pub enable_session_correlation: bool,

    /// Strategy for generating session IDs
    pub session_id_strategy: SessionIdStrategy,

    /// Maximum allowed payload size in bytes
    pub max_payload_size: usize,

    /// Trace sampling rate (0.0 to 1.0)
    pub trace_sampling_rate: f64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            enable_signature_validation: true,
            enable_session_correlation: true,
            session_id_strategy: SessionIdStrategy::Entity,
            max_payload_size: 1024 * 1024, // 1MB
            trace_sampling_rate: 0.1,
        }
    }
}

/// Strategy for generating session IDs for ordered processing.
#[derive(Debug, Clone)]
pub enum SessionIdStrategy {
    /// No session IDs generated
    None,

    /// Entity-based session IDs (e.g., "pr-owner/repo-123")
    Entity,

    /// Repository-based session IDs (e.g., "repo-owner/name")
    Repository,

    /// Custom session ID generation function
    Custom(fn(&EventEnvelope) -> Option<String>),
}

/// Processes raw GitHub webhooks into normalized event envelopes.
///
/// The event processor handles:
/// - Signature validation (optional)
/// - JSON parsing and validation
/// - Entity extraction and classification
/// - Session ID generation for ordering
/// - Metadata population
///
/// # Examples
///
/// ```rust,no_run
/// use github_bot_sdk::events::{EventProcessor, ProcessorConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ProcessorConfig::default();
/// let processor = EventProcessor::new(config);
///
/// let envelope = processor.process_webhook(
///     "pull_request",
///     b"{\"action\":\"opened\",\"number\":1}",
///     Some("delivery-123"),
/// ).await?;
///
/// println!("Processed event: {}", envelope.event_id);
/// # Ok(())
/// # }
/// ```
pub struct EventProcessor {
    config: ProcessorConfig,
}

impl EventProcessor {
    /// Create a new event processor with the given configuration.
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Process a raw webhook into a normalized event envelope.
    ///
    /// # Arguments
    ///
    /// * `event_type` - GitHub event type (from X-GitHub-Event header)
    /// * `payload` - Raw webhook payload bytes
    /// * `delivery_id` - GitHub delivery ID (from X-GitHub-Delivery header)
    ///
    /// # Returns
    ///
    /// A normalized `EventEnvelope` or an error if processing fails.
    ///
    /// # Errors
    ///
    /// Returns `EventError` if:
    /// - Payload exceeds maximum size
    /// - Payload is not valid JSON
    /// - Required fields are missing
    /// - Event type is unsupported
    pub async fn process_webhook(
        &self,
        event_type: &str,
        payload: &[u8],
        delivery_id: Option<&str>,
    ) -> Result<EventEnvelope, EventError> {
        if payload.len() > self.config.max_payload_size {
            return Err(EventError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        let value: Value = serde_json::from_slice(payload)?;

        let repository: Repository = value
            .get("repository")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| EventError::MissingField {
                field: "repository".to_string(),
            })?;

        let (entity_type, entity_id) = self.extract_entity_info(event_type, &value)?;

        let mut envelope =
            EventEnvelope::new(event_type.to_string(), repository.clone(), EventPayload::new(value));
        envelope.entity_type = entity_type.clone();
        envelope.entity_id = entity_id.clone();
        envelope.metadata.delivery_id = delivery_id.map(str::to_string);
        envelope.metadata.signature_valid = !self.config.enable_signature_validation;
        if let Some(id) = delivery_id {
            envelope.event_id = EventId::from_github_delivery(id);
        }

        if self.config.enable_session_correlation {
            envelope.session_id = self.generate_session_id(&entity_type, &entity_id, &repository);
        }

        Ok(envelope)
    }

    /// Extract entity information from the payload.
    ///
    /// Determines the primary entity type and ID for session correlation.
    pub fn extract_entity_info(
        &self,
        event_type: &str,
        payload: &Value,
    ) -> Result<(EntityType, Option<String>), EventError> {
        let entity_type = EntityType::from_event_type(event_type);

        let entity_id = match entity_type {
            EntityType::PullRequest => payload
                .get("pull_request")
                .and_then(|pr| pr.get("number"))
                .or_else(|| payload.get("number"))
                .map(|n| n.to_string()),
            EntityType::Issue => payload
                .get("issue")
                .and_then(|issue| issue.get("number"))
                .map(|n| n.to_string()),
            EntityType::Release => payload
                .get("release")
                .and_then(|release| release.get("id"))
                .map(|n| n.to_string()),
            EntityType::CheckRun => payload
                .get("check_run")
                .and_then(|run| run.get("id"))
                .map(|n| n.to_string()),
            EntityType::CheckSuite => payload
                .get("check_suite")
                .and_then(|suite| suite.get("id"))
                .map(|n| n.to_string()),
            EntityType::Deployment => payload
                .get("deployment")
                .and_then(|d| d.get("id"))
                .map(|n| n.to_string()),
            EntityType::Branch => payload
                .get("ref")
                .and_then(|r| r.as_str())
                .map(str::to_string),
            EntityType::Repository | EntityType::User | EntityType::Organization | EntityType::Unknown => None,
        };

        Ok((entity_type, entity_id))
    }

    /// Generate a session ID for ordered processing.
    ///
    /// Uses the configured strategy to create session IDs that group
    /// related events together for sequential processing.
    pub fn generate_session_id(
        &self,
        entity_type: &EntityType,
        entity_id: &Option<String>,
        repository: &Repository,
    ) -> Option<String> {
        match &self.config.session_id_strategy {
            SessionIdStrategy::None => None,
            SessionIdStrategy::Entity => entity_id
                .as_ref()
                .map(|id| format!("{}:{:?}:{}", repository.full_name, entity_type, id)),
            SessionIdStrategy::Repository => Some(repository.full_name.clone()),
            SessionIdStrategy::Custom(f) => {
                let envelope = EventEnvelope::new(
                    format!("{entity_type:?}"),
                    repository.clone(),
                    EventPayload::new(serde_json::Value::Null),
                );
                f(&envelope)
            }
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
