mod status_spinner;
mod auth;
mod delete;
mod download;
mod list;
mod ownership;
mod preferences;

use thiserror::Error;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use log::{LevelFilter, error, warn};
use indicatif_log_bridge::LogWrapper;
use indicatif::MultiProgress;
use std::{io::stdout, path::PathBuf, process::ExitCode, sync::Arc};
use crate::{
    auth::{AuthError, CredentialManager, LoopbackAuthorizer, OAuthClient, SCOPE_DRIVE, SCOPE_DRIVE_READONLY},
    credential_storage::{Credential, CredentialStorage, CredentialStorageError, CredentialStorageFile},
    drive::{DriveClient, DriveError, ErrorKind},
    preferences::{DataStore, PreferencesError},
};

/// Google Drive administration interface
#[derive(Parser, Debug)]
#[command(version, about, long_about = "Google Drive administration interface: list, delete and download files, and transfer or accept file ownership.", name = "drive-admin")]
struct Args {
    /// Maximum logging level
    #[arg(short, long, global = true)]
    log_level: Option<LevelFilter>,

    /// OAuth client secret file used for first-time authorization
    #[arg(long, global = true)]
    client_secret: Option<PathBuf>,

    /// Credential cache file
    #[arg(long, global = true)]
    token_cache: Option<PathBuf>,

    /// Print the authorization URL instead of launching a browser
    #[arg(long, global = true)]
    no_browser: bool,

    #[command(subcommand)]
    command: Command
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage Google account authorization
    Auth {
        #[command(subcommand)]
        command: auth::Command
    },
    /// List files
    List {
        /// Only list files in this folder
        #[arg(short, long)]
        folder: Option<String>,
        /// Include files in the trash
        #[arg(long)]
        include_trashed: bool
    },
    /// Interactively delete files
    Delete {
        /// Only offer files in this folder
        #[arg(short, long)]
        folder: Option<String>
    },
    /// Interactively download files, exporting Google documents to office formats
    Download {
        /// Only offer files in this folder
        #[arg(short, long)]
        folder: Option<String>,
        /// Directory to save files in. Defaults to the download-dir preference
        #[arg(short, long)]
        output_dir: Option<PathBuf>
    },
    /// Accept pending ownership transfers for the files of a folder
    AcceptOwnership {
        /// Folder ID. Will prompt if not given
        folder_id: Option<String>
    },
    /// Transfer ownership of every Google file in a folder
    TransferOwnership {
        /// Folder ID
        folder_id: String,
        /// Email address of the new owner
        new_owner_email: String,
        /// Do not email the new owner
        #[arg(long)]
        no_notify: bool
    },
    /// Manage CLI preferences
    Preferences {
        #[command(subcommand)]
        command: Option<preferences::Command>
    },
    /// Generate shell completion files
    Completion {
        shell: Shell
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Preferences store error: {0}")]
    PreferencesError(#[from] PreferencesError),
    #[error("API error: {0}")]
    ApiError(#[from] DriveError),
    #[error("Authorization error: {0}")]
    AuthError(#[from] AuthError),
    #[error("Credential storage error: {0}")]
    CredentialStorageError(#[from] CredentialStorageError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Input error: {0}")]
    InputError(#[from] dialoguer::Error)
}

type Result<T = ()> = std::result::Result<T, CliError>;

/// Everything needed to turn a cached or new credential into a Drive client
pub struct Session {
    storage: Arc<dyn CredentialStorage>,
    client_secret: PathBuf,
    launch_browser: bool
}

impl Session {
    fn manager(&self, scope: &str) -> CredentialManager {
        CredentialManager::new(
            self.storage.clone(),
            Box::new(OAuthClient::new()),
            Box::new(LoopbackAuthorizer::new(OAuthClient::new(), self.launch_browser)),
            self.client_secret.clone(),
            vec![scope.to_string()]
        )
    }

    /// get a usable credential, falling back to a new authorization when refreshing fails
    async fn credentials(&self, scope: &str) -> Result<Credential> {
        let manager = self.manager(scope);
        match manager.get_credentials().await {
            Err(AuthError::Refresh(e)) => {
                warn!("Could not refresh the cached credential ({}); authorizing again", e);
                Ok(manager.reauthorize().await?)
            },
            r => Ok(r?)
        }
    }

    async fn drive_client(&self, scope: &str) -> Result<DriveClient> {
        let creds = self.credentials(scope).await?;
        Ok(DriveClient::init(&creds)?)
    }
}

fn setup_logging() -> (MultiProgress, Args) {
    let mut logger = env_logger::Builder::from_default_env();
    let args = Args::parse();

    if let Some(level) = args.log_level {
        logger.filter_level(level);
    }

    let multi = MultiProgress::new();
    let logger = logger.build();
    let log_filter = logger.filter();
    if let Err(e) = LogWrapper::new(multi.clone(), logger).try_init() {
        eprintln!("Could not initialize logging: {}", e);
    }
    log::set_max_level(log_filter);

    (multi, args)
}

async fn run_internal(multi: MultiProgress, args: Args) -> Result {
    let prefs = DataStore::new().await?;

    let session = Session {
        storage: Arc::new(CredentialStorageFile::new(match args.token_cache {
            Some(path) => path,
            None => prefs.token_cache_path()?
        })),
        client_secret: match args.client_secret {
            Some(path) => path,
            None => prefs.client_secret_path()?
        },
        launch_browser: !args.no_browser && prefs.read()?.launch_browser
    };

    match args.command {
        Command::Completion { shell } => {
            let mut command = Args::command();
            let name = command.get_name().to_string();
            generate(shell, &mut command, name, &mut stdout());
        },
        Command::Auth { command } => auth::handle(command, &session, &multi).await?,
        Command::List { folder, include_trashed } => {
            let client = session.drive_client(SCOPE_DRIVE_READONLY).await?;
            list::handle(&client, folder, include_trashed, &multi).await?;
        },
        Command::Delete { folder } => {
            let client = session.drive_client(SCOPE_DRIVE).await?;
            delete::handle(&client, folder, &multi).await?;
        },
        Command::Download { folder, output_dir } => {
            let output_dir = match output_dir {
                Some(dir) => dir,
                None => prefs.download_dir()?
            };
            let client = session.drive_client(SCOPE_DRIVE_READONLY).await?;
            download::handle(&client, folder, &output_dir, &multi).await?;
        },
        Command::AcceptOwnership { folder_id } => {
            let client = session.drive_client(SCOPE_DRIVE).await?;
            ownership::handle_accept(&client, folder_id, &multi).await?;
        },
        Command::TransferOwnership { folder_id, new_owner_email, no_notify } => {
            let notify = !no_notify && prefs.read()?.notify_new_owner;
            let client = session.drive_client(SCOPE_DRIVE).await?;
            ownership::handle_transfer(&client, &folder_id, &new_owner_email, notify, &multi).await?;
        },
        Command::Preferences { command } => preferences::handle(command, &prefs, &multi).await?
    }

    Ok(())
}

pub async fn run() -> ExitCode {
    let (multi, args) = setup_logging();
    if let Err(err) = run_internal(multi, args).await {
        error!("Unexpected error: {}", err);
        if let CliError::ApiError(e) = &err {
            if e.kind() == ErrorKind::Unauthorized {
                eprintln!("The cached credential was rejected. Try `drive-admin auth login --force`.");
            }
        }
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transfer_arguments() {
        let args = Args::try_parse_from([
            "drive-admin", "transfer-ownership", "folder-1", "new@example.com", "--no-notify",
            "--token-cache", "/tmp/token.json"
        ]).unwrap();
        assert_eq!(args.token_cache, Some(PathBuf::from("/tmp/token.json")));
        match args.command {
            Command::TransferOwnership { folder_id, new_owner_email, no_notify } => {
                assert_eq!(folder_id, "folder-1");
                assert_eq!(new_owner_email, "new@example.com");
                assert!(no_notify);
            },
            other => panic!("unexpected command {:?}", other)
        }
    }

    #[test]
    fn transfer_requires_both_positionals() {
        assert!(Args::try_parse_from(["drive-admin", "transfer-ownership", "folder-1"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }
}
