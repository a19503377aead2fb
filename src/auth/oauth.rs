use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;

use super::{manager::TokenRefresher, AuthError, ClientSecret, Result};
use crate::credential_storage::Credential;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    /// space separated
    scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Talks to the OAuth token endpoint
#[derive(Clone, Default)]
pub struct OAuthClient {
    client: Client,
}

impl OAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn token_request(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let res = self.client.post(token_uri).form(form).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(TokenErrorResponse { error, error_description: Some(desc) }) => {
                    format!("{}: {}", error, desc)
                }
                Ok(TokenErrorResponse { error, .. }) => error,
                Err(_) => body,
            };
            return Err(AuthError::Rejected { status, message });
        }

        Ok(res.json().await?)
    }

    /// trade an authorization code from the consent redirect for a credential
    pub async fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> Result<Credential> {
        debug!("Exchanging authorization code at {}", secret.token_uri);
        let token = self
            .token_request(
                &secret.token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", &secret.client_id),
                    ("client_secret", &secret.client_secret),
                    ("redirect_uri", redirect_uri),
                ],
            )
            .await?;

        let granted = token
            .scope
            .as_deref()
            .map(split_scopes)
            .unwrap_or_else(|| scopes.to_vec());

        Ok(Credential {
            access_token: Some(token.access_token),
            refresh_token: token.refresh_token,
            token_uri: secret.token_uri.clone(),
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            scopes: granted,
            expiry: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[async_trait(?Send)]
impl TokenRefresher for OAuthClient {
    async fn refresh(&self, creds: &Credential) -> Result<Credential> {
        let refresh_token = creds.refresh_token.as_deref().ok_or(AuthError::NoRefreshToken)?;
        info!("Refreshing access token");

        let token = self
            .token_request(
                &creds.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", &creds.client_id),
                    ("client_secret", &creds.client_secret),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        let mut refreshed = creds.clone();
        refreshed.access_token = Some(token.access_token);
        refreshed.expiry = token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs));
        // the endpoint only sometimes rotates the refresh token
        if let Some(new_refresh) = token.refresh_token {
            refreshed.refresh_token = Some(new_refresh);
        }
        if let Some(scope) = token.scope {
            refreshed.scopes = split_scopes(&scope);
        }

        Ok(refreshed)
    }
}

fn split_scopes(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential_storage::tests::credential;
    use mockito::Matcher;

    #[tokio::test]
    async fn refresh_keeps_refresh_token_when_not_rotated() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh".into()),
                Matcher::UrlEncoded("client_id".into(), "client-id".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "new-access", "expires_in": 3599, "token_type": "Bearer"}"#)
            .create_async()
            .await;

        let mut creds = credential(Some(-100));
        creds.token_uri = format!("{}/token", server.url());

        let refreshed = OAuthClient::new().refresh(&creds).await.unwrap();
        mock.assert_async().await;

        assert_eq!(refreshed.access_token.as_deref(), Some("new-access"));
        assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh"));
        assert!(!refreshed.is_expired());
        assert_eq!(refreshed.scopes, creds.scopes);
    }

    #[tokio::test]
    async fn refresh_rejection_carries_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#)
            .create_async()
            .await;

        let mut creds = credential(Some(-100));
        creds.token_uri = format!("{}/token", server.url());

        match OAuthClient::new().refresh(&creds).await {
            Err(AuthError::Rejected { status, message }) => {
                assert_eq!(status.as_u16(), 400);
                assert_eq!(message, "invalid_grant: Token has been expired or revoked.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn refresh_without_refresh_token() {
        let mut creds = credential(Some(-100));
        creds.refresh_token = None;
        let result = OAuthClient::new().refresh(&creds).await;
        assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    }

    #[tokio::test]
    async fn exchange_code_builds_credential() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "4/abc".into()),
                Matcher::UrlEncoded("redirect_uri".into(), "http://127.0.0.1:9999/".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token": "fresh", "refresh_token": "long-lived", "expires_in": 3600,
                    "scope": "https://www.googleapis.com/auth/drive", "token_type": "Bearer"}"#,
            )
            .create_async()
            .await;

        let secret = ClientSecret {
            client_id: "id".into(),
            client_secret: "secret".into(),
            auth_uri: "https://accounts.example.com/auth".into(),
            token_uri: format!("{}/token", server.url()),
        };

        let creds = OAuthClient::new()
            .exchange_code(&secret, "4/abc", "http://127.0.0.1:9999/", &[])
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(creds.access_token.as_deref(), Some("fresh"));
        assert_eq!(creds.refresh_token.as_deref(), Some("long-lived"));
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.scopes, vec!["https://www.googleapis.com/auth/drive".to_string()]);
        assert!(creds.is_valid(&["https://www.googleapis.com/auth/drive.readonly".into()]));
    }
}
