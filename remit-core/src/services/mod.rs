//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
mod api;
pub mod interceptor;
pub mod logging;
mod session;
mod transfer;

pub use account::AccountService;
pub use api::ApiClient;
pub use interceptor::{augment, AuthInterceptor};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use session::{SessionService, SubscriptionId};
pub use transfer::TransferService;
