mod client_secret;
mod loopback;
mod manager;
mod oauth;

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::credential_storage::CredentialStorageError;

pub use client_secret::ClientSecret;
pub use loopback::LoopbackAuthorizer;
pub use manager::CredentialManager;
pub use oauth::OAuthClient;

pub const SCOPE_DRIVE: &str = "https://www.googleapis.com/auth/drive";
pub const SCOPE_DRIVE_READONLY: &str = "https://www.googleapis.com/auth/drive.readonly";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("could not read client secret file {path}: {source}")]
    ClientSecretMissing {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid client secret file {path}: {source}")]
    ClientSecretInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid authorization endpoint: {0}")]
    InvalidAuthUri(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token endpoint rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("credential has no refresh token")]
    NoRefreshToken,
    #[error("token refresh failed: {0}")]
    Refresh(#[source] Box<AuthError>),
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("authorization callback carried an unexpected state value")]
    StateMismatch,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Credential storage error: {0}")]
    CredentialStorage(#[from] CredentialStorageError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
