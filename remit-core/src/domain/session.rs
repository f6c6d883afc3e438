//! Session snapshot and the durable storage keys behind it

use serde::Serialize;

/// Storage key for the encoded credential; its absence means "logged out"
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Storage key for the username that established the session
pub const USERNAME_KEY: &str = "username";

/// Storage key for the selected account id (decimal string)
pub const CURRENT_ACCOUNT_KEY: &str = "currentAccountId";

/// Every key a logout clears
pub const SESSION_KEYS: [&str; 3] = [AUTH_TOKEN_KEY, USERNAME_KEY, CURRENT_ACCOUNT_KEY];

/// Point-in-time view of the stored session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(skip_serializing)]
    pub credential: Option<String>,
    pub username: Option<String>,
    pub current_account_id: Option<i64>,
}

impl Session {
    /// Derived from credential presence, never stored
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}

/// Returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEstablished {
    pub username: String,
}

/// Parse a stored account id; anything that is not an integer reads as absent
pub fn parse_account_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}
