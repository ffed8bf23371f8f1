use eventide_core::ServiceError;
use eventide_store::{require_fields, Document, UniqueKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An issued access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub id: String,
    pub user: String,
    pub token: String,
    /// RFC 3339, UTC.
    pub expiry: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document for Token {
    const COLLECTION: &'static str = "token";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("token", &["token"], vec![self.token.clone()])]
    }

    fn validate(&self) -> Result<(), ServiceError> {
        require_fields(
            Self::COLLECTION,
            &[("user", &self.user), ("token", &self.token), ("expiry", &self.expiry)],
        )
    }
}

/// Body of `POST /tokens`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateToken {
    /// Requested lifetime in seconds.
    #[serde(default)]
    pub ttl: Option<i64>,
}
