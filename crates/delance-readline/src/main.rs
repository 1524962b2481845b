mod command;
mod helper;
mod logging;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use delance_application::SessionService;
use delance_core::config::AppConfig;
use delance_core::{Amount, DelanceError, LedgerClient};
use delance_infrastructure::{ConfigService, InMemoryLedger, RpcLedgerClient};
use rustyline::Editor;
use tokio::sync::mpsc;
use tracing::info;

use crate::command::Command;
use crate::helper::CliHelper;

#[derive(Parser, Debug)]
#[command(name = "delance", version)]
#[command(about = "Delance - act as employer or freelancer on the escrow contract", long_about = None)]
struct Cli {
    /// Use an in-process simulated contract instead of a node
    #[arg(long)]
    simulate: bool,

    /// Escrow balance of the simulated contract, in ETH
    #[arg(long, default_value = "10", requires = "simulate")]
    fund: String,

    /// Node endpoint, overriding the config file
    #[arg(long)]
    rpc_url: Option<String>,

    /// Contract address, overriding the config file
    #[arg(long)]
    contract: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write --rpc-url and --contract into the config file for later runs
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(rpc_url) = &self.rpc_url {
            config.ledger.rpc_url = rpc_url.clone();
        }
        if let Some(contract) = &self.contract {
            config.ledger.contract_address = contract.clone();
        }
    }
}

/// Lines printed by the output task, one batch per finished action.
type Report = Vec<String>;

/// The delance REPL.
///
/// 1. Loads the config and installs file logging
/// 2. Builds the ledger client (JSON-RPC node or simulation) and the session
/// 3. Runs ledger actions in background tasks so the prompt stays responsive
/// 4. Prints their outcomes and busy transitions from dedicated tasks
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ===== Configuration =====
    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path.clone()),
        None => ConfigService::new()?,
    };
    let mut config = config_service
        .ensure_exists()
        .context("Failed to load configuration")?;
    if cli.save_config {
        config = config_service
            .update(|stored| cli.apply_overrides(stored))
            .context("Failed to save configuration")?;
    } else {
        cli.apply_overrides(&mut config);
    }

    let _log_guard = logging::init(&config.logging)?;

    // ===== Backend Initialization =====
    let ledger: Arc<dyn LedgerClient> = if cli.simulate {
        let balance = Amount::parse_decimal(&cli.fund).context("Invalid --fund")?;
        info!("Using simulated contract funded with {} ETH", balance);
        Arc::new(InMemoryLedger::demo(balance))
    } else {
        Arc::new(RpcLedgerClient::connect(&config.ledger)?)
    };
    let session = Arc::new(SessionService::new(ledger, config.session.clone()));

    let (report_tx, mut report_rx) = mpsc::channel::<Report>(32);
    let printer = tokio::spawn(async move {
        while let Some(lines) = report_rx.recv().await {
            for line in lines {
                println!("{}", line);
            }
        }
    });

    let mut updates = session.subscribe();
    tokio::spawn(async move {
        let mut was_busy = false;
        while updates.changed().await.is_ok() {
            let busy = updates.borrow_and_update().is_busy();
            if busy && !was_busy {
                println!("{}", "Waiting for confirmation...".bright_black());
            }
            was_busy = busy;
        }
    });

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Delance ===".bright_magenta().bold());
    if cli.simulate {
        println!("{}", "Simulated contract, nothing leaves this process.".yellow());
    } else {
        println!(
            "{}",
            format!(
                "Node {} / contract {}",
                config.ledger.rpc_url, config.ledger.contract_address
            )
            .bright_black()
        );
    }
    println!("{}", "Type 'connect' to start, 'help' for commands.".bright_black());
    println!();

    // ===== Main REPL Loop =====
    loop {
        let prompt = format!("{}> ", session.snapshot().role());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match Command::parse(trimmed) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message.yellow());
                        continue;
                    }
                };

                match command {
                    Command::Quit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Command::Help => print_help(),
                    Command::Show => print_lines(render::status(&session.snapshot())),
                    Command::Requests => print_lines(render::requests(&session.snapshot(), false)),
                    Command::Pending => print_lines(render::requests(&session.snapshot(), true)),
                    command => {
                        let session = Arc::clone(&session);
                        let tx = report_tx.clone();
                        tokio::spawn(async move {
                            let lines = match execute(&session, command).await {
                                Ok(lines) => lines,
                                Err(e) => vec![render::failure(&e)],
                            };
                            let _ = tx.send(lines).await;
                        });
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    drop(report_tx);
    let _ = printer.await;

    Ok(())
}

/// Runs one ledger-facing command and describes the outcome.
async fn execute(session: &SessionService, command: Command) -> Result<Report, DelanceError> {
    let lines = match command {
        Command::Connect => {
            session.connect().await?;
            let state = session.snapshot();
            let mut lines = vec![
                format!("Connected. {} accounts available.", state.accounts().len())
                    .green()
                    .to_string(),
            ];
            lines.extend(render::status(&state));
            lines
        }
        Command::Role(role) => {
            session.select_role(role).await?;
            let mut lines = vec![format!("Now acting as {}.", role.label()).green().to_string()];
            lines.extend(render::status(&session.snapshot()));
            lines
        }
        Command::Employer(address) => {
            session
                .set_employer_account(address.as_deref().unwrap_or_default())
                .await?;
            vec!["Employer address updated.".green().to_string()]
        }
        Command::Freelancer(address) => {
            session
                .set_freelancer_account(address.as_deref().unwrap_or_default())
                .await?;
            vec!["Freelancer address updated.".green().to_string()]
        }
        Command::Refresh => {
            session.refresh().await?;
            let state = session.snapshot();
            vec![
                format!("Contract balance: {} ETH", state.balance())
                    .green()
                    .to_string(),
            ]
        }
        Command::Create { amount, title } => {
            let confirmation = session.create_request(&title, &amount).await?;
            let mut lines = vec![
                format!("Request created ({})", confirmation.tx_hash)
                    .green()
                    .to_string(),
            ];
            lines.extend(render::requests(&session.snapshot(), false));
            lines
        }
        Command::Approve(index) => {
            let confirmation = session.approve_request(index).await?;
            let state = session.snapshot();
            vec![
                format!("Request #{} approved ({})", index, confirmation.tx_hash)
                    .green()
                    .to_string(),
                format!("Contract balance: {} ETH", state.balance()),
            ]
        }
        Command::SetFreelancer => {
            session.set_freelancer_on_chain().await?;
            vec!["Freelancer set successfully on-chain".green().to_string()]
        }
        Command::Show | Command::Requests | Command::Pending | Command::Help | Command::Quit => {
            Vec::new()
        }
    };
    Ok(lines)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

fn print_help() {
    let rows = [
        ("connect", "discover accounts and start as viewer"),
        ("role <viewer|employer|freelancer>", "switch the signing role"),
        ("employer [address]", "set or clear the employer address"),
        ("freelancer [address]", "set or clear the freelancer address"),
        ("show", "session summary"),
        ("requests", "all payment requests"),
        ("pending", "requests awaiting approval"),
        ("refresh", "re-read balance and requests"),
        ("create <amount> <title>", "request a payment (freelancer)"),
        ("approve <index>", "approve a pending request (employer)"),
        ("set-freelancer", "record the freelancer address on-chain (employer)"),
        ("quit", "exit"),
    ];
    for (usage, description) in rows {
        let usage = format!("{:<36}", usage);
        println!("  {} {}", usage.bright_cyan(), description.bright_black());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let cli = Cli::try_parse_from(["delance", "--rpc-url", "http://node:8545", "--save-config"])
            .unwrap();
        assert!(cli.save_config);

        let mut config = AppConfig::default();
        let contract = config.ledger.contract_address.clone();
        cli.apply_overrides(&mut config);
        assert_eq!(config.ledger.rpc_url, "http://node:8545");
        assert_eq!(config.ledger.contract_address, contract);
    }

    #[test]
    fn test_fund_requires_simulate() {
        assert!(Cli::try_parse_from(["delance", "--fund", "5"]).is_err());
        assert!(Cli::try_parse_from(["delance", "--simulate", "--fund", "5"]).is_ok());
    }
}
