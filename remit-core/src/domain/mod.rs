//! Core domain entities
//!
//! Wire projections of the backend's resources plus the client-side session.
//! Pure data and validation - no I/O.

mod account;
mod session;
mod transaction;
mod transfer;
pub mod result;

pub use account::{Account, AccountStatus};
pub use session::{
    parse_account_id, Session, SessionEstablished, AUTH_TOKEN_KEY, CURRENT_ACCOUNT_KEY,
    SESSION_KEYS, USERNAME_KEY,
};
pub use transaction::{sort_newest_first, Direction, TransactionLog, TransactionStatus};
pub use transfer::{
    generate_idempotency_key, validate_transfer, ErrorResponse, TransferRequest,
    TransferResponse,
};
