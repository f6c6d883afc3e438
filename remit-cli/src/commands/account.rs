//! Account commands - account details, balance and history

use anyhow::Result;
use colored::Colorize;
use remit_core::{Direction, TransactionStatus};

use super::{get_context, require_account};
use crate::output::{self, format_amount};

pub fn show(json: bool) -> Result<()> {
    let (ctx, _logger) = get_context("account")?;
    let account_id = require_account(&ctx)?;
    let account = ctx.account_service.get_account(account_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }

    println!("{}", "Account".bold());
    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), account.id.to_string()]);
    table.add_row(vec!["Holder".to_string(), account.holder_name.clone()]);
    table.add_row(vec!["Balance".to_string(), format_amount(account.balance)]);
    let status = if account.is_active() {
        account.status.as_str().green().to_string()
    } else {
        account.status.as_str().red().to_string()
    };
    table.add_row(vec!["Status".to_string(), status]);
    println!("{}", table);
    Ok(())
}

pub fn balance(json: bool) -> Result<()> {
    let (ctx, _logger) = get_context("balance")?;
    let account_id = require_account(&ctx)?;
    let balance = ctx.account_service.get_balance(account_id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({"accountId": account_id, "balance": balance})
        );
    } else {
        println!("{} {}", "Balance:".bold(), format_amount(balance));
    }
    Ok(())
}

pub fn history(limit: Option<usize>, json: bool) -> Result<()> {
    let (ctx, _logger) = get_context("history")?;
    let account_id = require_account(&ctx)?;
    let mut transactions = ctx.account_service.get_transactions(account_id)?;
    if let Some(limit) = limit {
        transactions.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Date", "Type", "Account", "Amount", "Status", "Reason"]);

    for tx in &transactions {
        let direction = tx.direction_for(account_id);
        let amount = format_amount(tx.signed_amount_for(account_id));
        let amount = match direction {
            Direction::Sent => amount.red().to_string(),
            Direction::Received => amount.green().to_string(),
        };
        let status = match tx.status {
            TransactionStatus::Success => tx.status.as_str().green().to_string(),
            TransactionStatus::Failed => tx.status.as_str().red().to_string(),
            TransactionStatus::Unknown => tx.status.as_str().dimmed().to_string(),
        };

        table.add_row(vec![
            tx.created_on.format("%Y-%m-%d %H:%M").to_string(),
            direction.as_str().to_string(),
            tx.counterparty_for(account_id).to_string(),
            amount,
            status,
            tx.failure_reason.clone().unwrap_or_default(),
        ]);
    }

    println!("{}", table);
    Ok(())
}
