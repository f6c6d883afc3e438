//! CLI command implementations

pub mod account;
pub mod logs;
pub mod session;
pub mod transfer;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use remit_core::services::{EntryPoint, LogEvent, LoggingService};
use remit_core::{AuthError, Error, RemitContext, TransferError};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let remit_dir = get_remit_dir().ok()?;
    std::fs::create_dir_all(&remit_dir).ok()?;
    LoggingService::new(&remit_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the remit directory from environment or default
pub fn get_remit_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("REMIT_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".remit"))
        .ok_or_else(|| anyhow!("Could not find home directory; set REMIT_DIR"))
}

/// Build the remit context and record the command
pub fn get_context(command: &str) -> Result<(RemitContext, Option<LoggingService>)> {
    let remit_dir = get_remit_dir()?;
    let ctx = RemitContext::new(&remit_dir)
        .with_context(|| format!("Failed to initialize remit in {}", remit_dir.display()))?;

    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command(command));
    Ok((ctx, logger))
}

/// Account id to operate on, or a hint to log in / pick one
pub fn require_account(ctx: &RemitContext) -> Result<i64> {
    ctx.session_service.require_account().map_err(|e| match e {
        Error::NotAuthenticated(_) => anyhow!("Not logged in. Run `remit login` first."),
        Error::NotFound(_) => anyhow!("No account selected. Run `remit use <account-id>` first."),
        other => other.into(),
    })
}

/// Privacy-safe label for a failed command
///
/// Error messages can carry amounts and account ids, so only the category
/// of a core error reaches the event log.
pub fn error_category(e: &anyhow::Error) -> &'static str {
    if let Some(err) = e.downcast_ref::<Error>() {
        err.category()
    } else if let Some(err) = e.downcast_ref::<TransferError>() {
        err.category()
    } else if let Some(err) = e.downcast_ref::<AuthError>() {
        err.category()
    } else {
        "error"
    }
}
