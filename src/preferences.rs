use serde::{Deserialize, Serialize};
use tokio::fs::{read, write, try_exists, create_dir_all};
use thiserror::Error;
use std::{cell::{Ref, RefMut, RefCell}, path::PathBuf};
use directories::ProjectDirs;
use log::debug;

const PREF_FILE_NAME: &str = "config.json";
const CLIENT_SECRET_FILE_NAME: &str = "client_secret.json";
const TOKEN_FILE_NAME: &str = "token.json";

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Preferences parse error")]
    SerdeError(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Preferences locked")]
    PrefsLocked,
    #[error("Could not determine a home directory")]
    NoHomeDir
}

type Result<T> = std::result::Result<T, PreferencesError>;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Preferences {
    /// OAuth client registration used for first-time authorization
    #[serde(default)]
    pub client_secret: Option<PathBuf>,
    /// cached credential
    #[serde(default)]
    pub token_cache: Option<PathBuf>,
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    #[serde(default = "enabled")]
    pub launch_browser: bool,
    /// email new owners when transferring ownership
    #[serde(default = "enabled")]
    pub notify_new_owner: bool
}

fn enabled() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            client_secret: None,
            token_cache: None,
            download_dir: None,
            launch_browser: true,
            notify_new_owner: true
        }
    }
}

#[derive(Debug)]
pub struct DataStore {
    preferences: RefCell<Preferences>,
    config_dir: PathBuf,
    data_dir: PathBuf
}

impl DataStore {
    /// Load preferences from the user config dir, creating the file if needed
    pub async fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "drive-admin").ok_or(PreferencesError::NoHomeDir)?;
        Self::open(dirs.config_dir().into(), dirs.data_dir().into()).await
    }

    pub async fn open(config_dir: PathBuf, data_dir: PathBuf) -> Result<Self> {
        let config_path = config_dir.join(PREF_FILE_NAME);
        let preferences = if try_exists(&config_path).await? {
            debug!("Loading preferences from {}", config_path.display());
            serde_json::from_slice(&read(&config_path).await?)?
        } else {
            debug!("Creating preferences at {}", config_path.display());
            create_dir_all(&config_dir).await?;
            write(&config_path, "{}").await?;
            Preferences::default()
        };

        Ok(Self {
            preferences: RefCell::new(preferences),
            config_dir,
            data_dir
        })
    }

    pub async fn save(&self) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(&*self.read()?)?;
        create_dir_all(&self.config_dir).await?;
        write(self.config_dir.join(PREF_FILE_NAME), serialized).await?;
        Ok(())
    }

    pub fn read(&self) -> Result<Ref<'_, Preferences>> {
        self.preferences.try_borrow().map_err(|_| PreferencesError::PrefsLocked)
    }

    pub fn write(&self) -> Result<RefMut<'_, Preferences>> {
        self.preferences.try_borrow_mut().map_err(|_| PreferencesError::PrefsLocked)
    }

    pub fn client_secret_path(&self) -> Result<PathBuf> {
        Ok(self.read()?.client_secret.clone()
            .unwrap_or_else(|| self.config_dir.join(CLIENT_SECRET_FILE_NAME)))
    }

    pub fn token_cache_path(&self) -> Result<PathBuf> {
        Ok(self.read()?.token_cache.clone()
            .unwrap_or_else(|| self.data_dir.join(TOKEN_FILE_NAME)))
    }

    /// defaults to the working directory
    pub fn download_dir(&self) -> Result<PathBuf> {
        Ok(self.read()?.download_dir.clone().unwrap_or_else(|| PathBuf::from(".")))
    }
}
