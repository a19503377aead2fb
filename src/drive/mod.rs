mod account;
mod files;
mod permissions;
mod types;

use log::debug;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::credential_storage::Credential;

pub use files::FileQuery;
pub use types::*;

pub const API_BASE: &str = "https://www.googleapis.com";

/// Coarse classification of a failed call, for skip/abort decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Unauthorized,
    PermissionDenied,
    NotFound,
    RateLimited,
    Server,
    Unsupported,
    Other,
}

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Api {
        status: StatusCode,
        reason: Option<String>,
        message: String,
    },
    #[error("credential has no access token")]
    MissingAccessToken,
    #[error("files of type {0} cannot be downloaded")]
    NotDownloadable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(e) if e.is_status() => e.status().map_or(ErrorKind::Other, kind_for_status),
            Self::Http(_) => ErrorKind::Network,
            Self::Api { reason: Some(reason), .. } if reason.ends_with("RateLimitExceeded") => {
                ErrorKind::RateLimited
            }
            Self::Api { status, .. } => kind_for_status(*status),
            Self::NotDownloadable(_) => ErrorKind::Unsupported,
            Self::MissingAccessToken => ErrorKind::Unauthorized,
            Self::Io(_) => ErrorKind::Other,
        }
    }
}

fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
        StatusCode::FORBIDDEN => ErrorKind::PermissionDenied,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        s if s.is_server_error() => ErrorKind::Server,
        _ => ErrorKind::Other,
    }
}

pub type Result<T> = std::result::Result<T, DriveError>;

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Deserialize)]
struct ApiErrorItem {
    reason: Option<String>,
}

/// Authenticated handle on the Drive v3 API
pub struct DriveClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl DriveClient {
    pub fn init(creds: &Credential) -> Result<Self> {
        Self::with_base_url(creds, API_BASE)
    }

    pub fn with_base_url(creds: &Credential, base_url: impl Into<String>) -> Result<Self> {
        let access_token = creds
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(DriveError::MissingAccessToken)?;
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/drive/v3/files/{}", self.base_url, file_id)
    }

    /// send with the bearer token; non-2xx responses become [`DriveError::Api`]
    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let res = req.bearer_auth(&self.access_token).send().await?;
        let status = res.status();
        debug!("{} {} -> {}", res.url().path(), res.url().query().unwrap_or(""), status);
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(ApiErrorBody { error }) => DriveError::Api {
                status,
                reason: error.errors.into_iter().find_map(|e| e.reason),
                message: error.message,
            },
            Err(_) => DriveError::Api {
                status,
                reason: None,
                message: if body.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").into()
                } else {
                    body
                },
            },
        })
    }
}
