use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{create_dir_all, read, remove_file, try_exists, write};

/// tokens expiring within this many seconds are treated as expired
const EXPIRY_SKEW_SECS: i64 = 60;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Cached OAuth credential for the Drive API.
///
/// Field names follow Google's "authorized user" JSON so caches written by
/// other Google tooling can be read back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

impl Credential {
    /// a credential without an expiry never expires
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    /// whether the granted scopes include every requested scope.
    /// `X` also grants `X.readonly`
    pub fn covers_scopes(&self, requested: &[String]) -> bool {
        requested.iter().all(|scope| {
            self.scopes.iter().any(|granted| {
                granted == scope
                    || scope
                        .strip_suffix(".readonly")
                        .is_some_and(|full| full == granted)
            })
        })
    }

    pub fn is_valid(&self, requested: &[String]) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
            && !self.is_expired()
            && self.covers_scopes(requested)
    }

    /// refreshing only helps an expiring credential whose grant is wide enough
    pub fn can_refresh(&self, requested: &[String]) -> bool {
        self.expiry.is_some() && self.refresh_token.is_some() && self.covers_scopes(requested)
    }
}

#[derive(Error, Debug)]
pub enum CredentialStorageError {
    #[error("I/O error on credential cache {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize credential")]
    Serialize(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, CredentialStorageError>;

#[async_trait(?Send)]
pub trait CredentialStorage {
    async fn store_credentials(&self, creds: &Credential) -> Result<()>;
    /// `None` when nothing usable is cached
    async fn get_credentials(&self) -> Result<Option<Credential>>;
    async fn clear_credentials(&self) -> Result<()>;

    async fn logged_in(&self) -> Result<bool> {
        Ok(self.get_credentials().await?.is_some())
    }
}

/// Credential cache kept in a single JSON file
#[derive(Debug, Clone)]
pub struct CredentialStorageFile {
    path: PathBuf,
}

impl CredentialStorageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: std::io::Error) -> CredentialStorageError {
        CredentialStorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait(?Send)]
impl CredentialStorage for CredentialStorageFile {
    async fn get_credentials(&self) -> Result<Option<Credential>> {
        if !try_exists(&self.path).await.map_err(|e| self.io_err(e))? {
            debug!("No credential cache at {}", self.path.display());
            return Ok(None);
        }

        debug!("Loading credentials from {}", self.path.display());
        let contents = read(&self.path).await.map_err(|e| self.io_err(e))?;

        // a corrupt cache is the same as no cache: the caller re-authorizes
        match serde_json::from_slice(&contents) {
            Ok(creds) => Ok(Some(creds)),
            Err(e) => {
                warn!("Ignoring malformed credential cache {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    async fn store_credentials(&self, creds: &Credential) -> Result<()> {
        debug!("Saving credentials to {}", self.path.display());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }

        let serialized = serde_json::to_vec_pretty(creds)?;
        write(&self.path, serialized).await.map_err(|e| self.io_err(e))?;

        #[cfg(unix)]
        {
            use std::{fs::Permissions, os::unix::fs::PermissionsExt};
            tokio::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.io_err(e))?;
        }

        Ok(())
    }

    async fn clear_credentials(&self) -> Result<()> {
        if try_exists(&self.path).await.map_err(|e| self.io_err(e))? {
            debug!("Removing credential cache {}", self.path.display());
            remove_file(&self.path).await.map_err(|e| self.io_err(e))?;
        }
        Ok(())
    }
}
