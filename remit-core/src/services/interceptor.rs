//! Outbound request augmenter
//!
//! Attaches the stored credential to every outgoing request so call sites
//! never deal with authentication. Requests are copied, never mutated, so a
//! caller can resubmit its original value.

use std::sync::Arc;

use base64::Engine;

use crate::domain::AUTH_TOKEN_KEY;
use crate::ports::{ApiRequest, SessionStorage};

pub const AUTHORIZATION: &str = "Authorization";

/// Transport encoding of `username:password`; this is not encryption
pub fn encode_credential(username: &str, password: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password))
}

/// Header value for a stored credential
pub fn basic_authorization(credential: &str) -> String {
    format!("Basic {}", credential)
}

/// Copy of `request` carrying `Authorization: Basic <credential>`, or an
/// unmodified copy when there is no credential
pub fn augment(request: &ApiRequest, credential: Option<&str>) -> ApiRequest {
    match credential.filter(|c| !c.is_empty()) {
        Some(credential) => request
            .clone()
            .with_header(AUTHORIZATION, basic_authorization(credential)),
        None => request.clone(),
    }
}

/// Request pipeline stage reading the credential from session storage
#[derive(Clone)]
pub struct AuthInterceptor {
    storage: Arc<dyn SessionStorage>,
}

impl AuthInterceptor {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// An unreadable storage behaves like a logged-out session
    pub fn apply(&self, request: &ApiRequest) -> ApiRequest {
        let credential = self.storage.get(AUTH_TOKEN_KEY).ok().flatten();
        augment(request, credential.as_deref())
    }
}
