//! Transfer command - submit a money transfer from the selected account

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use remit_core::domain::{validate_transfer, TransferRequest};
use remit_core::services::LogEvent;
use remit_core::{OperationResult, TransferError, TransferResponse};
use rust_decimal::Decimal;

use super::{get_context, log_event, require_account};
use crate::output::{self, format_amount};

/// Event for a failed submission
///
/// Backend messages quote balances and account ids, so a rejection keeps
/// only its error code and everything else only its category.
fn failure_event(e: &TransferError) -> LogEvent {
    let event = LogEvent::new("transfer_failed").with_error(e.category());
    match e {
        TransferError::Rejected { error_code, .. } => event.with_error_code(error_code.clone()),
        _ => event,
    }
}

/// Parse a user-entered amount; anything unparsable is not a valid amount
fn parse_amount(raw: &str) -> Result<Decimal, TransferError> {
    Decimal::from_str(raw.trim())
        .map_err(|_| TransferError::validation("Please enter a valid amount"))
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn run(to: i64, amount: &str, key: Option<String>, yes: bool, json: bool) -> Result<()> {
    let (ctx, logger) = get_context("transfer")?;
    let from = require_account(&ctx)?;

    let amount = parse_amount(amount)?;
    let source = ctx.account_service.get_account(from)?;

    // A known key resends an earlier attempt; otherwise this is a new one
    let request = match key {
        Some(key) => {
            validate_transfer(&source, to, amount)?;
            TransferRequest::new(from, to, amount, key)
        }
        None => ctx.transfer_service.prepare(&source, to, amount)?,
    };

    if !yes && !json && atty::is(atty::Stream::Stdin) {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Transfer {} from account {} to account {}?",
                format_amount(amount),
                from,
                to
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let pb = (!json).then(|| spinner("Submitting transfer..."));
    let result = ctx.transfer_service.transfer_with_retry(&request);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match &result {
        Ok(_) => log_event(&logger, LogEvent::new("transfer_submitted")),
        Err(e) => log_event(&logger, failure_event(e)),
    }

    if json {
        let mut out: OperationResult<TransferResponse> = result.clone().into();
        out.context
            .get_or_insert_with(Default::default)
            .insert("idempotencyKey".to_string(), request.idempotency_key.clone().into());
        println!("{}", serde_json::to_string_pretty(&out)?);
        return result.map(|_| ()).map_err(|e| anyhow!(e));
    }

    match result {
        Ok(response) => {
            output::success(&format!(
                "{}: {} sent to account {}",
                response.message,
                format_amount(response.amount),
                response.credited_to
            ));
            println!("Transaction ID: {}", response.transaction_id);
            Ok(())
        }
        Err(e) if e.is_duplicate() => {
            output::warning(&format!(
                "Transfer {} was already processed; check `remit history` before sending again.",
                request.idempotency_key
            ));
            Ok(())
        }
        Err(e @ TransferError::Network(_)) => {
            output::info(&format!(
                "To resend this same transfer safely, use --key {}",
                request.idempotency_key
            ));
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
