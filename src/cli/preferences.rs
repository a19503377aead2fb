use clap::{Subcommand, ValueEnum};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use indicatif::MultiProgress;
use console::{user_attended, style, strip_ansi_codes};
use crate::{preferences::{DataStore, Preferences}, cli::status_spinner::StatusSpinner};
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a preference key
    Get {
        /// Preference key to retrieve
        #[arg(value_enum)]
        key: PrefKey
    },
    /// Set a preference key. Will prompt for value
    Set {
        /// Preference key to set
        #[command(subcommand)]
        key: SetValues
    }
}

#[derive(Subcommand, Debug)]
pub enum SetValues {
    /// OAuth client secret file used for first-time authorization
    ClientSecret {
        value: Option<PathBuf>
    },
    /// File the credential is cached in
    TokenCache {
        value: Option<PathBuf>
    },
    /// Default directory for downloads
    DownloadDir {
        value: Option<PathBuf>
    },
    /// Launch a browser for authorization
    LaunchBrowser {
        value: Option<bool>
    },
    /// Email new owners when transferring ownership
    NotifyNewOwner {
        value: Option<bool>
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum PrefKey {
    /// OAuth client secret file used for first-time authorization
    ClientSecret,
    /// File the credential is cached in
    TokenCache,
    /// Default directory for downloads
    DownloadDir,
    /// Launch a browser for authorization
    LaunchBrowser,
    /// Email new owners when transferring ownership
    NotifyNewOwner
}

impl PrefKey {
    const ALL: [PrefKey; 5] = [Self::ClientSecret, Self::TokenCache, Self::DownloadDir, Self::LaunchBrowser, Self::NotifyNewOwner];

    fn label(self) -> &'static str {
        match self {
            Self::ClientSecret => "Client secret:",
            Self::TokenCache => "Token cache:",
            Self::DownloadDir => "Download directory:",
            Self::LaunchBrowser => "Launch browser:",
            Self::NotifyNewOwner => "Notify new owners:"
        }
    }
}

fn styled_path(path: Option<&Path>, default: &Path) -> String {
    let styled = match path {
        Some(path) => style(path.display().to_string()).cyan(),
        // orange when falling back to the default
        None => style(format!("{} (default)", default.display())).color256(215)
    };
    styled.bright().bold().to_string()
}

fn styled_bool(value: bool) -> String {
    let styled = if value { style("yes").green() } else { style("no").red() };
    styled.bright().bold().to_string()
}

fn styled_value(key: PrefKey, prefs: &Preferences, store: &DataStore) -> super::Result<String> {
    Ok(match key {
        PrefKey::ClientSecret => styled_path(prefs.client_secret.as_deref(), &store_default(store, key)?),
        PrefKey::TokenCache => styled_path(prefs.token_cache.as_deref(), &store_default(store, key)?),
        PrefKey::DownloadDir => styled_path(prefs.download_dir.as_deref(), &store_default(store, key)?),
        PrefKey::LaunchBrowser => styled_bool(prefs.launch_browser),
        PrefKey::NotifyNewOwner => styled_bool(prefs.notify_new_owner)
    })
}

/// effective path for a path key (the configured one, or the default)
fn store_default(store: &DataStore, key: PrefKey) -> super::Result<PathBuf> {
    Ok(match key {
        PrefKey::ClientSecret => store.client_secret_path()?,
        PrefKey::TokenCache => store.token_cache_path()?,
        _ => store.download_dir()?
    })
}

fn prompt_path(prompt: &str) -> super::Result<Option<PathBuf>> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{} (empty for default)", prompt))
        .allow_empty(true)
        .interact_text()?;
    Ok(if input.trim().is_empty() { None } else { Some(PathBuf::from(input.trim())) })
}

fn prompt_bool(prompt: &str, current: bool) -> super::Result<bool> {
    let result = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&["Yes", "No"])
        .default(if current { 0 } else { 1 })
        .interact()?;
    Ok(result == 0)
}

pub async fn handle(command: Option<Command>, store: &DataStore, multi: &MultiProgress) -> super::Result {
    match command {
        Some(Command::Get { key }) => {
            let value = styled_value(key, &*store.read()?, store)?;
            if user_attended() {
                println!("{} {}", style(key.label()).dim(), value);
            } else {
                // just print the value without formatting
                println!("{}", strip_ansi_codes(&value));
            }
        },
        Some(Command::Set { key }) => {
            {
                let mut lock = store.write()?;
                match key {
                    // prompt for corresponding value (if needed)
                    SetValues::ClientSecret { value } => {
                        lock.client_secret = if value.is_some() { value } else { prompt_path("Client secret file")? };
                    },
                    SetValues::TokenCache { value } => {
                        lock.token_cache = if value.is_some() { value } else { prompt_path("Token cache file")? };
                    },
                    SetValues::DownloadDir { value } => {
                        lock.download_dir = if value.is_some() { value } else { prompt_path("Download directory")? };
                    },
                    SetValues::LaunchBrowser { value } => {
                        lock.launch_browser = match value {
                            Some(value) => value,
                            None => prompt_bool("Launch a browser for authorization?", lock.launch_browser)?
                        };
                    },
                    SetValues::NotifyNewOwner { value } => {
                        lock.notify_new_owner = match value {
                            Some(value) => value,
                            None => prompt_bool("Email new owners on ownership transfer?", lock.notify_new_owner)?
                        };
                    }
                }
            }
            let status = StatusSpinner::new("Saving...", multi);
            store.save().await?;
            status.finish("Saved", true);
        },
        None => {
            // list all values
            println!("{}", style("Preferences:").green().bold().bright());
            for key in PrefKey::ALL {
                let value = styled_value(key, &*store.read()?, store)?;
                println!("{} {}", style(key.label()).dim(), value);
            }
        }
    }
    Ok(())
}
