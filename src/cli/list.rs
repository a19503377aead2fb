use console::style;
use dialoguer::{Input, theme::ColorfulTheme};
use indicatif::MultiProgress;
use super::status_spinner::{Outcome, StatusSpinner};
use crate::drive::{DriveClient, FileQuery, FileRecord};

pub async fn handle(client: &DriveClient, folder: Option<String>, include_trashed: bool, multi: &MultiProgress) -> super::Result {
    let query = FileQuery {
        parent: folder,
        include_trashed,
        ..FileQuery::default()
    };
    if let Some(files) = load_files(client, &query, multi).await? {
        print_files(&files);
    }
    Ok(())
}

/// list files behind a spinner. `None` when there is nothing to show
pub async fn load_files(client: &DriveClient, query: &FileQuery, multi: &MultiProgress) -> super::Result<Option<Vec<FileRecord>>> {
    let status = StatusSpinner::new("Loading files...", multi);
    let files = match client.list_files(query).await {
        Ok(files) => files,
        Err(e) => {
            status.finish("Could not list files", false);
            return Err(e.into());
        }
    };

    if files.is_empty() {
        status.finish(&match &query.parent {
            Some(folder) => format!("No files found in folder {}", folder),
            None => "No files found".into()
        }, Outcome::Skipped);
        Ok(None)
    } else {
        status.finish(&format!("Found {} files", files.len()), true);
        Ok(Some(files))
    }
}

pub fn print_files(files: &[FileRecord]) {
    let width = files.len().saturating_sub(1).to_string().len();
    for (i, file) in files.iter().enumerate() {
        println!(
            "{} {} {} {}",
            style(format!("{:>width$}.", i, width = width)).dim(),
            style(&file.name).bold().bright(),
            style(format!("({})", file.id)).dim(),
            style(&file.mime_type).magenta()
        );
    }
}

/// parse an index prompt answer: `q` quits, anything else must be a valid index
pub fn parse_index(input: &str, len: usize) -> Result<Option<usize>, String> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    match input.parse::<usize>() {
        Ok(index) if index < len => Ok(Some(index)),
        Ok(_) => Err(format!("Invalid index. Please enter an index between 0 and {}.", len.saturating_sub(1))),
        Err(_) => Err("Invalid input. Please enter a number or 'q'.".into())
    }
}

/// prompt until a valid index or `q` is entered
pub fn prompt_index(prompt: &str, len: usize) -> super::Result<Option<usize>> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .validate_with(|input: &String| parse_index(input, len).map(|_| ()))
        .interact_text()?;
    // already validated
    Ok(parse_index(&input, len).unwrap_or(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_parsing() {
        assert_eq!(parse_index("q", 3), Ok(None));
        assert_eq!(parse_index(" Q ", 3), Ok(None));
        assert_eq!(parse_index("0", 3), Ok(Some(0)));
        assert_eq!(parse_index("2\n", 3), Ok(Some(2)));
        assert!(parse_index("3", 3).is_err());
        assert!(parse_index("-1", 3).is_err());
        assert!(parse_index("two", 3).is_err());
        assert!(parse_index("", 3).is_err());
        assert!(parse_index("0", 0).is_err());
    }
}
