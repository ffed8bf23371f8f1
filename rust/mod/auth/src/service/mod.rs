pub mod token;

use std::sync::Arc;

use axum::http::HeaderMap;
use base64::Engine;
use eventide_core::ServiceError;
use eventide_kv::KVStore;
use tracing::debug;

use crate::backend::AuthBackend;
use crate::mode::AuthMode;

pub use token::{check_max_ttl, TokenService, MAX_TOKEN_TTL};

/// Header a fronting proxy sets to the authenticated user name.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// Upper bound (and default) for token lifetime, in seconds.
    pub token_ttl: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Proxy,
            token_ttl: 86400, // 24h
        }
    }
}

pub struct AuthService {
    pub(crate) config: AuthConfig,
    pub(crate) backend: Option<Arc<dyn AuthBackend>>,
    pub(crate) tokens: Arc<TokenService>,
}

impl AuthService {
    /// Standalone mode requires a credential backend, and `token_ttl` must be
    /// in range.
    pub fn new(
        kv: Arc<dyn KVStore>,
        config: AuthConfig,
        backend: Option<Arc<dyn AuthBackend>>,
    ) -> Result<Arc<Self>, ServiceError> {
        if config.mode == AuthMode::Standalone && backend.is_none() {
            return Err(ServiceError::Internal(
                "standalone auth mode needs a credential backend".into(),
            ));
        }
        check_max_ttl(config.token_ttl)?;
        let tokens = Arc::new(TokenService::new(kv, config.token_ttl));
        Ok(Arc::new(Self { config, backend, tokens }))
    }

    pub fn mode(&self) -> AuthMode {
        self.config.mode
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Identify the caller of a token request.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<String, ServiceError> {
        match self.config.mode {
            AuthMode::Proxy => {
                let user = headers
                    .get(REMOTE_USER_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ServiceError::Unauthorized("Remote user is unspecified.".into()))?;
                debug!("proxy mode: remote user {}", user);
                Ok(user.to_string())
            }
            AuthMode::Standalone => {
                let (user, password) = basic_credentials(headers).ok_or_else(|| {
                    ServiceError::Unauthorized("Invalid or missing credentials.".into())
                })?;
                let backend = self.backend.as_ref().ok_or_else(|| {
                    ServiceError::Internal("no credential backend configured".into())
                })?;
                if backend.authenticate(&user, &password) {
                    Ok(user)
                } else {
                    Err(ServiceError::Unauthorized("Invalid or missing credentials.".into()))
                }
            }
        }
    }
}

/// Decode `Authorization: Basic <base64(user:password)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    if user.is_empty() {
        return None;
    }
    Some((user.to_string(), password.to_string()))
}
