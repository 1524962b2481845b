//! Text rendering of session snapshots and failures.

use colored::Colorize;
use delance_application::SessionState;
use delance_core::{DelanceError, ErrorCategory, PaymentRequest, RequestStatus};

pub fn status(state: &SessionState) -> Vec<String> {
    if !state.is_connected() {
        return vec!["Not connected. Type 'connect' first."
            .bright_black()
            .to_string()];
    }

    let signer = match state.bound_signer() {
        Some(account) => account.to_string(),
        None if state.is_switching() => "binding...".to_string(),
        None => "none (address missing)".to_string(),
    };
    let mut lines = vec![
        format!("{} {}", "Role:".bold(), state.role().label().bright_magenta()),
        format!("{} {}", "Connected account:".bold(), signer),
        format!("{} {}", "Employer address:".bold(), or_blank(state.employer_account())),
        format!("{} {}", "Freelancer address:".bold(), or_blank(state.freelancer_account())),
        format!(
            "{} {} ETH",
            "Contract balance:".bold(),
            state.balance().to_string().bright_green()
        ),
        format!(
            "{} {} total, {} pending",
            "Requests:".bold(),
            state.requests().len(),
            state.pending_requests().count()
        ),
    ];
    if let Some(at) = state.refreshed_at() {
        lines.push(
            format!("Last refreshed {}", at.format("%H:%M:%S UTC"))
                .bright_black()
                .to_string(),
        );
    }
    if state.is_busy() {
        lines.push("Transaction in progress...".yellow().to_string());
    } else if state.is_switching() {
        lines.push("Refreshing for the new role...".yellow().to_string());
    }
    lines
}

/// Every request, or only those awaiting approval.
pub fn requests(state: &SessionState, pending_only: bool) -> Vec<String> {
    let lines: Vec<String> = if pending_only {
        state
            .pending_requests()
            .map(|(index, request)| request_line(index, request))
            .collect()
    } else {
        state
            .requests()
            .iter()
            .enumerate()
            .map(|(index, request)| request_line(index, request))
            .collect()
    };

    if lines.is_empty() {
        let empty = if pending_only {
            "No pending requests"
        } else {
            "No requests yet"
        };
        return vec![empty.bright_black().to_string()];
    }
    lines
}

fn request_line(index: usize, request: &PaymentRequest) -> String {
    let badge = match request.status() {
        RequestStatus::Pending => format!("[{}]", RequestStatus::Pending).yellow(),
        RequestStatus::Approved => format!("[{}]", RequestStatus::Approved).green(),
    };
    format!(
        "  #{} {} {} ETH {}",
        index, request.title, request.amount, badge
    )
}

pub fn failure(err: &DelanceError) -> String {
    match err.category() {
        ErrorCategory::ConnectionFailure => format!("Wallet connection failed: {}", err)
            .red()
            .bold()
            .to_string(),
        ErrorCategory::ValidationFailure => match err.as_validation() {
            Some(failure) => failure.to_string().yellow().to_string(),
            None => err.to_string().yellow().to_string(),
        },
        ErrorCategory::SubmissionRejected | ErrorCategory::Reverted => {
            format!("Transaction failed: {}", err).red().to_string()
        }
        ErrorCategory::RefreshFailure => format!("{} (showing last known values)", err)
            .yellow()
            .to_string(),
        ErrorCategory::Environment => format!("Error: {}", err).red().to_string(),
    }
}

fn or_blank(account: Option<&delance_core::Account>) -> String {
    account
        .map(ToString::to_string)
        .unwrap_or_else(|| "(empty)".to_string())
}
