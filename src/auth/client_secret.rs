use std::path::Path;

use log::debug;
use serde::Deserialize;
use tokio::fs::read;

use super::{AuthError, Result};
use crate::credential_storage::DEFAULT_TOKEN_URI;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// OAuth client registration, as downloaded from the cloud console
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.into()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

/// the console wraps the registration in the application type
#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretFile {
    Installed(ClientSecret),
    Web(ClientSecret),
}

impl ClientSecret {
    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        Ok(match serde_json::from_slice(data)? {
            ClientSecretFile::Installed(secret) | ClientSecretFile::Web(secret) => secret,
        })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        debug!("Loading client secret from {}", path.display());
        let data = read(path).await.map_err(|source| AuthError::ClientSecretMissing {
            path: path.into(),
            source,
        })?;
        Self::from_slice(&data).map_err(|source| AuthError::ClientSecretInvalid {
            path: path.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential_storage::tests::test_dir;

    #[test]
    fn parses_installed_and_web() {
        let installed = br#"{"installed": {
            "client_id": "abc.apps.googleusercontent.com",
            "project_id": "demo",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "shh",
            "redirect_uris": ["http://localhost"]
        }}"#;
        let secret = ClientSecret::from_slice(installed).unwrap();
        assert_eq!(secret.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "shh");

        let web = br#"{"web": {"client_id": "web-id", "client_secret": "web-secret"}}"#;
        let secret = ClientSecret::from_slice(web).unwrap();
        assert_eq!(secret.client_id, "web-id");
        assert_eq!(secret.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secret.token_uri, DEFAULT_TOKEN_URI);
    }

    #[tokio::test]
    async fn load_errors() {
        let tmp = test_dir();
        let dir = tmp.path();
        let missing = ClientSecret::load(&dir.join("nope.json")).await;
        assert!(matches!(missing, Err(AuthError::ClientSecretMissing { .. })));

        let bad = dir.join("bad.json");
        std::fs::write(&bad, r#"{"service_account": {}}"#).unwrap();
        let invalid = ClientSecret::load(&bad).await;
        assert!(matches!(invalid, Err(AuthError::ClientSecretInvalid { .. })));
    }
}
