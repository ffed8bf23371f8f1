use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use eventide_core::{new_id, ServiceError};
use eventide_kv::KVStore;
use eventide_store::Access;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::model::Token;

/// Longest accepted token lifetime, in seconds (100 years).
pub const MAX_TOKEN_TTL: i64 = 100 * 365 * 24 * 3600;

/// `auth.token_ttl` must be a positive number of seconds no larger than
/// [`MAX_TOKEN_TTL`].
pub fn check_max_ttl(ttl: i64) -> Result<(), ServiceError> {
    if ttl <= 0 || ttl > MAX_TOKEN_TTL {
        return Err(ServiceError::Validation(format!(
            "token_ttl must be between 1 and {} seconds, got {}.",
            MAX_TOKEN_TTL, ttl
        )));
    }
    Ok(())
}

/// Issues and checks access tokens.
pub struct TokenService {
    tokens: Access<Token>,
    max_ttl: i64,
}

impl TokenService {
    pub fn new(kv: Arc<dyn KVStore>, max_ttl: i64) -> Self {
        Self { tokens: Access::new(kv), max_ttl }
    }

    /// Effective lifetime for a requested TTL: capped at the configured
    /// maximum, which is also the default.
    pub fn effective_ttl(&self, requested: Option<i64>) -> Result<i64, ServiceError> {
        match requested {
            Some(ttl) if ttl <= 0 => Err(ServiceError::Validation(
                "TTL must be a positive number of seconds.".into(),
            )),
            Some(ttl) => Ok(ttl.min(self.max_ttl)),
            None => Ok(self.max_ttl),
        }
    }

    pub fn create_token(
        &self,
        user: &str,
        ttl: Option<i64>,
        metadata: Map<String, Value>,
    ) -> Result<Token, ServiceError> {
        self.create_token_at(user, ttl, metadata, Utc::now())
    }

    pub fn create_token_at(
        &self,
        user: &str,
        ttl: Option<i64>,
        metadata: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Token, ServiceError> {
        let ttl = self.effective_ttl(ttl)?;
        let expiry = Duration::try_seconds(ttl)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| ServiceError::Validation(format!("TTL {} is out of range.", ttl)))?;
        let token = Token {
            id: String::new(),
            user: user.to_string(),
            token: new_id(),
            expiry: expiry.to_rfc3339_opts(SecondsFormat::Secs, true),
            metadata,
        };
        let saved = self.tokens.add_or_update(token)?;
        info!("Access granted to {} with the token set to expire at {}", saved.user, saved.expiry);
        Ok(saved)
    }

    /// The stored token, if it exists and has not expired.
    pub fn validate_token(&self, token: &str) -> Result<Token, ServiceError> {
        self.validate_token_at(token, Utc::now())
    }

    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Token, ServiceError> {
        let found = self
            .tokens
            .get_by_unique("token", &[token])?
            .ok_or_else(|| ServiceError::Unauthorized("Token is invalid.".into()))?;

        if is_expired(&found, now)? {
            self.remove(&found)?;
            debug!("Removed expired token of {}", found.user);
            return Err(ServiceError::Unauthorized("Token has expired.".into()));
        }
        Ok(found)
    }

    /// Delete every expired token. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, ServiceError> {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, ServiceError> {
        let mut removed = 0;
        for token in self.tokens.all()? {
            if is_expired(&token, now)? {
                self.remove(&token)?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Purged {} expired token(s)", removed);
        }
        Ok(removed)
    }

    /// A concurrent request may have removed it already.
    fn remove(&self, token: &Token) -> Result<(), ServiceError> {
        match self.tokens.delete(&token.id) {
            Ok(_) | Err(ServiceError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn is_expired(token: &Token, now: DateTime<Utc>) -> Result<bool, ServiceError> {
    let expiry = DateTime::parse_from_rfc3339(&token.expiry)
        .map_err(|e| ServiceError::Internal(format!("stored token expiry: {}", e)))?;
    Ok(expiry.with_timezone(&Utc) <= now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(max_ttl: i64) -> (TokenService, tempfile::TempDir) {
        let (kv, dir) = eventide_testing::temp_kv();
        (TokenService::new(kv, max_ttl), dir)
    }

    #[test]
    fn ttl_is_capped_and_defaulted() {
        let (svc, _dir) = service(3600);
        assert_eq!(svc.effective_ttl(None).unwrap(), 3600);
        assert_eq!(svc.effective_ttl(Some(60)).unwrap(), 60);
        assert_eq!(svc.effective_ttl(Some(999_999)).unwrap(), 3600);
        assert!(matches!(svc.effective_ttl(Some(0)), Err(ServiceError::Validation(_))));
        assert!(svc.effective_ttl(Some(-5)).is_err());
    }

    #[test]
    fn issued_tokens_validate_until_expiry() {
        let (svc, _dir) = service(3600);
        let now = Utc::now();
        let token = svc.create_token_at("alice", Some(60), Map::new(), now).unwrap();
        assert_eq!(token.user, "alice");
        assert_eq!(token.token.len(), 32);

        let found = svc.validate_token_at(&token.token, now + Duration::seconds(30)).unwrap();
        assert_eq!(found.id, token.id);

        let err = svc
            .validate_token_at(&token.token, now + Duration::seconds(61))
            .unwrap_err();
        assert_eq!(err.to_string(), "Token has expired.");

        // The expired token is gone, so it is now simply unknown.
        let err = svc.validate_token_at(&token.token, now).unwrap_err();
        assert_eq!(err.to_string(), "Token is invalid.");
    }

    #[test]
    fn purge_removes_only_expired_tokens() {
        let (svc, _dir) = service(3600);
        let now = Utc::now();
        let short = svc.create_token_at("alice", Some(10), Map::new(), now).unwrap();
        let long = svc.create_token_at("bob", Some(600), Map::new(), now).unwrap();

        assert_eq!(svc.purge_expired_at(now + Duration::seconds(60)).unwrap(), 1);
        assert!(svc.validate_token_at(&short.token, now).is_err());
        assert_eq!(svc.validate_token_at(&long.token, now).unwrap().user, "bob");
        assert_eq!(svc.purge_expired_at(now + Duration::seconds(60)).unwrap(), 0);
    }

    #[test]
    fn max_ttl_bounds() {
        assert!(check_max_ttl(1).is_ok());
        assert!(check_max_ttl(MAX_TOKEN_TTL).is_ok());
        assert!(matches!(check_max_ttl(0), Err(ServiceError::Validation(_))));
        assert!(check_max_ttl(-1).is_err());
        assert!(check_max_ttl(i64::MAX).is_err());
    }

    #[test]
    fn huge_ttl_is_an_error_not_a_panic() {
        let (svc, _dir) = service(i64::MAX);
        let err = svc.create_token("alice", None, Map::new()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let (svc, _dir) = service(3600);
        assert!(matches!(
            svc.validate_token("nope"),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
