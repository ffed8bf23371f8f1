//! Credential backends for standalone mode.

use std::collections::HashMap;
use std::path::Path;

use eventide_core::ServiceError;
use tracing::{debug, warn};

/// Checks a username and password.
pub trait AuthBackend: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Users from a flat file of `username:<argon2 PHC hash>` lines.
/// Blank lines and lines starting with `#` are ignored.
pub struct FlatFileBackend {
    users: HashMap<String, String>,
}

impl FlatFileBackend {
    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Internal(format!("read users file {}: {}", path.display(), e))
        })?;
        let backend = Self::parse(&text);
        debug!("Loaded {} user(s) from {}", backend.users.len(), path.display());
        Ok(backend)
    }

    pub fn parse(text: &str) -> Self {
        let mut users = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once(':') {
                Some((user, hash)) if !user.is_empty() && !hash.is_empty() => {
                    users.insert(user.to_string(), hash.to_string());
                }
                _ => warn!("users file: skipping malformed line {}", lineno + 1),
            }
        }
        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl AuthBackend for FlatFileBackend {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(hash) => verify_password(password, hash),
            None => false,
        }
    }
}

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    use argon2::Argon2;
    use password_hash::rand_core::OsRng;
    use password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Internal(format!("hash password: {}", e)))
}

/// Verify a password against an argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
