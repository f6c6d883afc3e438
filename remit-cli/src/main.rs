//! Remit CLI - move money from your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use remit_core::services::LogEvent;

mod commands;
mod output;

use commands::{account, logs, session, transfer};

/// Remit - banking client for the money transfer service
#[derive(Parser)]
#[command(name = "remit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Username
        username: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long, env = "REMIT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Account to select after login (defaults to the probe account)
        #[arg(long)]
        account: Option<i64>,
    },

    /// Clear the stored session
    Logout,

    /// Show the current session
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select the account to operate on
    Use {
        /// Account ID
        account_id: i64,
    },

    /// Show the selected account
    Account {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the balance of the selected account
    Balance {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show transaction history, newest first
    History {
        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transfer money from the selected account
    Transfer {
        /// Destination account ID
        #[arg(long)]
        to: i64,
        /// Amount to transfer
        #[arg(long)]
        amount: String,
        /// Resubmit with a known idempotency key
        #[arg(long)]
        key: Option<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_event(
                &commands::get_logger(),
                LogEvent::new("command_failed").with_error(commands::error_category(&e)),
            );
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { username, password, account } => {
            session::login(username, password, account)
        }
        Commands::Logout => session::logout(),
        Commands::Whoami { json } => session::whoami(json),
        Commands::Use { account_id } => session::use_account(account_id),
        Commands::Account { json } => account::show(json),
        Commands::Balance { json } => account::balance(json),
        Commands::History { limit, json } => account::history(limit, json),
        Commands::Transfer { to, amount, key, yes, json } => {
            transfer::run(to, &amount, key, yes, json)
        }
        Commands::Logs { command } => logs::run(command),
    }
}
