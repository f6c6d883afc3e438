//! Remit Core - client-side logic for a money transfer service
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Account, TransactionLog, TransferRequest, Session)
//! - **ports**: Trait definitions for external dependencies (SessionStorage, Transport)
//! - **services**: Session store, auth interceptor, transfers and account queries
//! - **adapters**: Concrete implementations (session file, reqwest transport)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use adapters::{FileStorage, HttpTransport};
use config::Config;
use ports::{SessionStorage, Transport};
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    Account, AccountStatus, Direction, Session, SessionEstablished, TransactionLog,
    TransactionStatus, TransferRequest, TransferResponse,
};
pub use domain::result::{AuthError, Error, OperationResult, TransferError};

/// Main context for Remit operations
///
/// This is the primary entry point for all business logic. It holds the
/// configuration, the session storage and all services, wired to one
/// shared transport.
pub struct RemitContext {
    pub config: Config,
    pub storage: Arc<dyn SessionStorage>,
    pub session_service: SessionService,
    pub account_service: AccountService,
    pub transfer_service: TransferService,
}

impl RemitContext {
    /// Create a context backed by `<remit dir>/session.json` and the
    /// configured HTTP endpoint
    pub fn new(remit_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(remit_dir)?;
        let config = Config::load(remit_dir)?;

        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::in_dir(remit_dir));
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?);

        Ok(Self::with_parts(config, storage, transport))
    }

    /// Wire services over caller-provided storage and transport
    pub fn with_parts(
        config: Config,
        storage: Arc<dyn SessionStorage>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api = Arc::new(ApiClient::new(Arc::clone(&transport), Arc::clone(&storage)));

        let session_service =
            SessionService::new(Arc::clone(&storage), transport, config.probe_account_id);
        let account_service = AccountService::new(Arc::clone(&api));
        let transfer_service = TransferService::new(api, config.transfer_retries);

        Self {
            config,
            storage,
            session_service,
            account_service,
            transfer_service,
        }
    }
}
