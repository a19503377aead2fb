use std::path::Path;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::error;
use tokio::fs::create_dir_all;
use super::list::{load_files, print_files, prompt_index};
use crate::drive::{DriveClient, FileQuery};

pub async fn handle(client: &DriveClient, folder: Option<String>, output_dir: &Path, multi: &MultiProgress) -> super::Result {
    let query = FileQuery { parent: folder, ..FileQuery::default() };
    let Some(files) = load_files(client, &query, multi).await? else {
        return Ok(());
    };
    print_files(&files);
    create_dir_all(output_dir).await?;

    while let Some(index) = prompt_index("Index of the file to download ('q' to quit)", files.len())? {
        let file = &files[index];

        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.yellow} {msg} {bytes}/{total_bytes} {wide_bar:.cyan/blue}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
        );
        bar.set_message(file.name.clone());

        match client.download(file, output_dir, &bar).await {
            Ok(path) => {
                bar.finish_and_clear();
                println!(
                    "{} {}",
                    style(format!("File with ID {} downloaded to", file.id)).green(),
                    style(path.display()).bold().cyan()
                );
            },
            Err(e) => {
                bar.abandon();
                error!("Failed to download file with ID {}: {}", file.id, e);
            }
        }
        multi.remove(&bar);
    }

    Ok(())
}
