//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Session file with advisory locking for SessionStorage
//! - In-memory map for SessionStorage (tests, throwaway sessions)
//! - Blocking reqwest client for Transport
//! - Mock banking backend and scripted transport for testing

pub mod file_storage;
pub mod http;
pub mod memory_storage;

#[cfg(test)]
pub mod bank_mock;

pub use file_storage::FileStorage;
pub use http::HttpTransport;
pub use memory_storage::MemoryStorage;

#[cfg(test)]
pub use scripted::ScriptedTransport;
