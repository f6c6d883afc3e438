//! Authenticated API client - interceptor in front of the transport

use std::sync::Arc;

use crate::ports::{ApiRequest, ApiResponse, SessionStorage, Transport, TransportError};
use crate::services::AuthInterceptor;

/// Every call made through this client carries the stored credential
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    interceptor: AuthInterceptor,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            transport,
            interceptor: AuthInterceptor::new(storage),
        }
    }

    /// Send a copy of `request` augmented with the current credential
    pub fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.transport.execute(self.interceptor.apply(request))
    }
}
