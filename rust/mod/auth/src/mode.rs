use std::fmt;
use std::str::FromStr;

use eventide_core::ServiceError;
use serde::{Deserialize, Serialize};

/// Accepted values of `auth.mode`.
pub const VALID_MODES: &[&str] = &["proxy", "standalone"];

/// How the token endpoint learns who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// A fronting proxy has authenticated the caller and passes the user name
    /// in `X-Remote-User`.
    Proxy,
    /// The service checks HTTP Basic credentials against a users file.
    Standalone,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Proxy => "proxy",
            AuthMode::Standalone => "standalone",
        }
    }
}

impl FromStr for AuthMode {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proxy" => Ok(AuthMode::Proxy),
            "standalone" => Ok(AuthMode::Standalone),
            _ => Err(ServiceError::Validation(format!(
                "Valid modes are: {}",
                VALID_MODES.join(",")
            ))),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
