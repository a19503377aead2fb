use clap::Subcommand;
use console::style;
use indicatif::MultiProgress;
use super::{Session, status_spinner::{Outcome, StatusSpinner}};
use crate::{auth::{SCOPE_DRIVE, SCOPE_DRIVE_READONLY}, drive::{About, DriveClient}};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authorize access to your Google Drive
    Login {
        /// Authorize again even if a usable credential is cached
        #[arg(short, long)]
        force: bool
    },
    /// Delete the cached credential
    Logout,
    /// View authorization status and account information
    Status
}

/// human readable byte count
fn format_bytes(bytes: &str) -> String {
    let Ok(mut value) = bytes.parse::<f64>() else {
        return bytes.to_string();
    };
    let mut unit = 0;
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 { format!("{} {}", value, UNITS[0]) } else { format!("{:.1} {}", value, UNITS[unit]) }
}

fn print_account(about: &About) {
    println!(
        "{} {}",
        style("Name:").dim(),
        style(about.user.display_name.as_deref().unwrap_or("unknown")).bright().magenta()
    );
    println!(
        "{} {}",
        style("Email:").dim(),
        style(about.user.email_address.as_deref().unwrap_or("unknown")).bright().blue()
    );
    if let Some(quota) = &about.storage_quota {
        let usage = quota.usage.as_deref().map(format_bytes).unwrap_or_else(|| "?".into());
        let limit = quota.limit.as_deref().map(format_bytes).unwrap_or_else(|| "unlimited".into());
        println!("{} {} / {}", style("Storage:").dim(), style(usage).bright().cyan(), limit);
    }
}

pub async fn handle(command: Command, session: &Session, multi: &MultiProgress) -> super::Result {
    match command {
        Command::Logout => {
            let status = StatusSpinner::new("Logging out...", multi);
            session.storage.clear_credentials().await?;
            status.finish("Removed cached credential", true);
        },
        Command::Login { force } => {
            let cached_valid = session.storage.get_credentials().await?
                .is_some_and(|c| c.is_valid(&[SCOPE_DRIVE.to_string()]));
            if cached_valid && !force {
                StatusSpinner::new("", multi)
                    .finish("You are already logged in! Use --force to authorize again.", Outcome::Skipped);
                return Ok(());
            }

            let creds = if force {
                session.manager(SCOPE_DRIVE).reauthorize().await?
            } else {
                session.credentials(SCOPE_DRIVE).await?
            };

            let about = DriveClient::init(&creds)?.about().await?;
            StatusSpinner::new("", multi).finish(
                &format!("Logged in as {}", about.user.email_address.as_deref().unwrap_or("unknown user")),
                true
            );
        },
        Command::Status => {
            if !session.storage.logged_in().await? {
                StatusSpinner::new("", multi).finish("You are not currently logged in.", false);
                return Ok(());
            }

            let creds = session.credentials(SCOPE_DRIVE_READONLY).await?;
            let status = StatusSpinner::new("Loading account information...", multi);
            let about = match DriveClient::init(&creds)?.about().await {
                Ok(about) => about,
                Err(e) => {
                    status.finish("Could not load account information", false);
                    return Err(e.into());
                }
            };
            status.finish("Logged in", true);

            print_account(&about);
            println!(
                "{} {}",
                style("Token expires:").dim(),
                creds.expiry.map_or_else(|| "never".to_string(), |e| e.to_rfc2822())
            );
            println!("{} {}", style("Refreshable:").dim(), creds.refresh_token.is_some());
        }
    }

    Ok(())
}
