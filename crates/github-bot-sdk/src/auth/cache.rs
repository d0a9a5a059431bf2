//! Token caching implementation for GitHub App authentication.
//!
//! Provides thread-safe, TTL-based caching for JWT and installation tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{GitHubAppId, InstallationId, InstallationToken, JsonWebToken, TokenCache};
use crate::error::CacheError;

/// In-memory token cache with TTL support.
///
/// Provides thread-safe caching for both JWT and installation tokens with
/// automatic expiration handling.
pub struct InMemoryTokenCache {
    jwt_cache: Arc<RwLock<HashMap<GitHubAppId, CachedToken<JsonWebToken>>>>,
    installation_cache: Arc<RwLock<HashMap<InstallationId, CachedToken<InstallationToken>>>>,
}

/// Cached token with metadata.
struct CachedToken<T> {
    token: T,
    cached_at: DateTime<Utc>,
}

impl<T> CachedToken<T> {
    fn new(token: T) -> Self {
        Self {
            token,
            cached_at: Utc::now(),
        }
    }
}

impl InMemoryTokenCache {
    /// Create a new in-memory token cache.
    pub fn new() -> Self {
        Self {
            jwt_cache: Arc::new(RwLock::new(HashMap::new())),
            installation_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get_jwt(&self, app_id: GitHubAppId) -> Result<Option<JsonWebToken>, CacheError> {
        let cache = self.jwt_cache.read().map_err(|_| CacheError::OperationFailed {
            message: "jwt_cache lock poisoned".to_string(),
        })?;
        Ok(cache.get(&app_id).map(|cached| cached.token.clone()))
    }

    async fn store_jwt(&self, jwt: JsonWebToken) -> Result<(), CacheError> {
        let mut cache = self.jwt_cache.write().map_err(|_| CacheError::OperationFailed {
            message: "jwt_cache lock poisoned".to_string(),
        })?;
        cache.insert(jwt.app_id(), CachedToken::new(jwt));
        Ok(())
    }

    async fn get_installation_token(
        &self,
        installation_id: InstallationId,
    ) -> Result<Option<InstallationToken>, CacheError> {
        let cache = self
            .installation_cache
            .read()
            .map_err(|_| CacheError::OperationFailed {
                message: "installation_cache lock poisoned".to_string(),
            })?;
        Ok(cache
            .get(&installation_id)
            .map(|cached| cached.token.clone()))
    }

    async fn store_installation_token(&self, token: InstallationToken) -> Result<(), CacheError> {
        let mut cache = self
            .installation_cache
            .write()
            .map_err(|_| CacheError::OperationFailed {
                message: "installation_cache lock poisoned".to_string(),
            })?;
        cache.insert(token.installation_id(), CachedToken::new(token));
        Ok(())
    }

    async fn invalidate_installation_token(
        &self,
        installation_id: InstallationId,
    ) -> Result<(), CacheError> {
        let mut cache = self
            .installation_cache
            .write()
            .map_err(|_| CacheError::OperationFailed {
                message: "installation_cache lock poisoned".to_string(),
            })?;
        cache.remove(&installation_id);
        Ok(())
    }

    fn cleanup_expired_tokens(&self) {
        if let Ok(mut cache) = self.jwt_cache.write() {
            cache.retain(|_, cached| !cached.token.is_expired());
        }
        if let Ok(mut cache) = self.installation_cache.write() {
            cache.retain(|_, cached| !cached.token.is_expired());
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
