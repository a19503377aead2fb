use console::style;
use dialoguer::{Confirm, Select, theme::ColorfulTheme};
use indicatif::MultiProgress;
use log::error;
use super::list::{load_files, print_files, prompt_index};
use crate::drive::{DriveClient, DriveError, FileQuery, FileRecord};

#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, DriveError)>
}

/// Delete every id in turn. A failure is reported and does not stop the rest
pub async fn delete_files(client: &DriveClient, ids: &[String]) -> DeleteReport {
    let mut report = DeleteReport::default();
    for id in ids {
        match client.delete_file(id).await {
            Ok(()) => {
                println!("{}", style(format!("File with ID {} deleted successfully.", id)).green());
                report.deleted.push(id.clone());
            },
            Err(e) => {
                error!("Failed to delete file with ID {}: {}", id, e);
                report.failed.push((id.clone(), e));
            }
        }
    }
    report
}

fn confirm(prompt: &str) -> super::Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// collect indexes one at a time until `q`
fn prompt_selection(files: &[FileRecord]) -> super::Result<Vec<usize>> {
    let mut selected = vec![];
    while let Some(index) = prompt_index("Index of the file to delete ('q' to finish)", files.len())? {
        if !selected.contains(&index) {
            selected.push(index);
        }
    }
    Ok(selected)
}

pub async fn handle(client: &DriveClient, folder: Option<String>, multi: &MultiProgress) -> super::Result {
    let query = FileQuery { parent: folder, ..FileQuery::default() };
    let Some(mut files) = load_files(client, &query, multi).await? else {
        return Ok(());
    };

    while !files.is_empty() {
        print_files(&files);
        let action = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select an action")
            .items(&["Delete specific files", "Delete all files", "Quit"])
            .default(0)
            .interact()?;

        let targets: Vec<&FileRecord> = match action {
            0 => {
                let selected = prompt_selection(&files)?;
                if selected.is_empty() {
                    continue;
                }
                let targets: Vec<&FileRecord> = selected.into_iter().map(|i| &files[i]).collect();
                let names = targets.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ");
                if !confirm(&format!("Are you sure you want to delete these files: {}?", names))? {
                    println!("{}", style("Deletion cancelled.").yellow());
                    continue;
                }
                targets
            },
            1 => {
                if !confirm("Are you sure you want to delete ALL files?")? {
                    println!("{}", style("Deletion cancelled.").yellow());
                    continue;
                }
                files.iter().collect()
            },
            _ => break
        };

        let ids: Vec<String> = targets.iter().map(|f| f.id.clone()).collect();
        let report = delete_files(client, &ids).await;
        if !report.failed.is_empty() {
            println!("{}", style(format!("{} of {} deletions failed", report.failed.len(), ids.len())).red());
        }
        // deleted files can no longer be offered
        files.retain(|f| !report.deleted.contains(&f.id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{ErrorKind, tests::client_for};

    #[tokio::test]
    async fn failure_does_not_short_circuit() {
        let mut server = mockito::Server::new_async().await;
        let first = server.mock("DELETE", "/drive/v3/files/a").with_status(204).expect(1).create_async().await;
        let second = server.mock("DELETE", "/drive/v3/files/b")
            .with_status(403)
            .with_body(r#"{"error": {"code": 403, "message": "The user does not have sufficient permissions for this file."}}"#)
            .expect(1)
            .create_async()
            .await;
        let third = server.mock("DELETE", "/drive/v3/files/c").with_status(204).expect(1).create_async().await;

        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let report = delete_files(&client_for(&server), &ids).await;

        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;

        assert_eq!(report.deleted, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "b");
        assert_eq!(report.failed[0].1.kind(), ErrorKind::PermissionDenied);
    }
}
