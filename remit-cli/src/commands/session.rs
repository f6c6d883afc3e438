//! Session commands - login, logout, whoami, use

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};
use remit_core::services::LogEvent;

use super::{get_context, log_event};
use crate::output;

pub fn login(
    username: Option<String>,
    password: Option<String>,
    account: Option<i64>,
) -> Result<()> {
    let (ctx, logger) = get_context("login")?;
    let interactive = atty::is(atty::Stream::Stdin);

    let username = match username {
        Some(u) => u,
        None if interactive => Input::<String>::new()
            .with_prompt("Username")
            .allow_empty(true)
            .interact_text()?,
        None => String::new(),
    };
    let password = match password {
        Some(p) => p,
        None if interactive => Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()?,
        None => String::new(),
    };

    match ctx.session_service.login(username.trim(), &password) {
        Ok(established) => {
            let account_id = account.unwrap_or(ctx.config.probe_account_id);
            ctx.session_service.set_current_account_id(account_id)?;
            log_event(&logger, LogEvent::new("login_succeeded"));
            output::success(&format!(
                "Logged in as {} (account {})",
                established.username, account_id
            ));
            Ok(())
        }
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("login_failed")
                    .with_error_code(e.category())
                    .with_error(e.category()),
            );
            Err(e.into())
        }
    }
}

pub fn logout() -> Result<()> {
    let (ctx, logger) = get_context("logout")?;
    let was_logged_in = ctx.session_service.is_authenticated();

    ctx.session_service.logout()?;
    log_event(&logger, LogEvent::new("logout"));

    if was_logged_in {
        output::success("Logged out");
    } else {
        output::info("Not logged in");
    }
    Ok(())
}

pub fn whoami(json: bool) -> Result<()> {
    let (ctx, _logger) = get_context("whoami")?;
    let session = ctx.session_service.session()?;

    if json {
        let mut value = serde_json::to_value(&session)?;
        value["authenticated"] = serde_json::Value::Bool(session.is_authenticated());
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if !session.is_authenticated() {
        output::warning("Not logged in. Run `remit login` first.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.add_row(vec![
        "User".to_string(),
        session.username.clone().unwrap_or_default(),
    ]);
    table.add_row(vec![
        "Account".to_string(),
        session
            .current_account_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".dimmed().to_string()),
    ]);
    table.add_row(vec!["API".to_string(), ctx.config.base_url.clone()]);
    println!("{}", table);
    Ok(())
}

pub fn use_account(account_id: i64) -> Result<()> {
    let (ctx, _logger) = get_context("use")?;
    if account_id <= 0 {
        anyhow::bail!("Account ID must be a positive number");
    }
    ctx.session_service.require_authenticated()?;
    ctx.session_service.set_current_account_id(account_id)?;
    output::success(&format!("Using account {}", account_id));
    Ok(())
}
