use console::style;
use dialoguer::{Input, theme::ColorfulTheme};
use indicatif::MultiProgress;
use log::error;
use super::{list::load_files, status_spinner::{Outcome, StatusSpinner}};
use crate::drive::{self, is_workspace_native, DriveClient, DriveError, FileQuery, FileRecord, NewPermission, PrincipalType, Role};

#[derive(Debug, PartialEq)]
pub enum AcceptOutcome {
    Accepted { permission_id: String },
    NothingPending
}

/// Accept the first pending ownership invitation on a file
pub async fn accept_pending(client: &DriveClient, file_id: &str) -> drive::Result<AcceptOutcome> {
    let permissions = client.list_permissions(file_id).await?;
    match permissions.into_iter().find(|p| p.is_pending_owner()) {
        Some(pending) => {
            client.update_permission(file_id, &pending.id, Role::Owner, true).await?;
            Ok(AcceptOutcome::Accepted { permission_id: pending.id })
        },
        None => Ok(AcceptOutcome::NothingPending)
    }
}

#[derive(Debug, Default)]
pub struct TransferReport {
    pub transferred: Vec<FileRecord>,
    /// not Google files; Drive cannot transfer these
    pub skipped: Vec<FileRecord>,
    pub failed: Vec<(FileRecord, DriveError)>
}

/// Hand every Workspace-native file to `new_owner`
pub async fn transfer_files(client: &DriveClient, files: Vec<FileRecord>, new_owner: &str, notify: bool) -> TransferReport {
    let mut report = TransferReport::default();
    let permission = NewPermission {
        principal: PrincipalType::User,
        role: Role::Owner,
        email_address: new_owner.to_string()
    };

    for file in files {
        if !is_workspace_native(&file.mime_type) {
            println!(
                "{}",
                style(format!("Skipping non-Google file: {} (ID: {}) - ownership transfer not supported.", file.name, file.id)).yellow()
            );
            report.skipped.push(file);
            continue;
        }

        println!("Transferring ownership for Google file: {} (ID: {})", style(&file.name).bold(), file.id);
        match client.create_permission(&file.id, &permission, true, notify).await {
            Ok(_) => {
                println!("{}", style(format!("Ownership transferred successfully for file ID: {}", file.id)).green());
                report.transferred.push(file);
            },
            Err(e) => {
                error!("An error occurred while transferring ownership for file ID {}: {}", file.id, e);
                report.failed.push((file, e));
            }
        }
    }

    report
}

pub async fn handle_accept(client: &DriveClient, folder_id: Option<String>, multi: &MultiProgress) -> super::Result {
    let folder_id = if let Some(id) = folder_id {
        id
    } else {
        Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Folder ID")
            .interact_text()?
    };

    let folder = client.get_file(&folder_id).await?;
    println!("Accepting pending transfers in {} ({})", style(&folder.name).bold(), folder.id);

    let Some(files) = load_files(client, &FileQuery::in_folder(folder_id), multi).await? else {
        return Ok(());
    };

    for file in files {
        let status = StatusSpinner::new(&format!("{} ({})", file.name, file.id), multi);
        match accept_pending(client, &file.id).await {
            Ok(AcceptOutcome::Accepted { .. }) => {
                status.finish(&format!("Ownership transfer accepted for {} ({})", file.name, file.id), true);
            },
            Ok(AcceptOutcome::NothingPending) => {
                status.finish(&format!("No pending ownership transfer for {} ({})", file.name, file.id), Outcome::Skipped);
            },
            Err(e) => {
                status.finish(&format!("Could not accept ownership of {} ({})", file.name, file.id), false);
                error!("An error occurred while accepting permissions for file ID {}: {}", file.id, e);
            }
        }
    }

    Ok(())
}

pub async fn handle_transfer(client: &DriveClient, folder_id: &str, new_owner: &str, notify: bool, multi: &MultiProgress) -> super::Result {
    let folder = client.get_file(folder_id).await?;
    println!("Transferring files in {} ({}) to {}", style(&folder.name).bold(), folder.id, style(new_owner).cyan());

    let query = FileQuery::in_folder(folder_id);
    let Some(files) = load_files(client, &query, multi).await? else {
        return Ok(());
    };

    println!("Found {} files in the folder. Processing...", files.len());
    let report = transfer_files(client, files, new_owner, notify).await;

    if report.failed.is_empty() {
        println!(
            "\n{}",
            style(format!(
                "Ownership transfer completed for all eligible files ({} transferred, {} skipped).",
                report.transferred.len(),
                report.skipped.len()
            )).green().bold()
        );
    } else {
        println!("\n{}", style("The following files could not have their ownership transferred:").red().bold());
        for (file, _) in &report.failed {
            println!("- {}", file.name);
        }
    }

    Ok(())
}
