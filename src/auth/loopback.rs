use std::{net::Ipv4Addr, process::Stdio, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use console::style;
use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;
use tokio::{
    net::TcpListener,
    process::Command as ProcessCommand,
    sync::{mpsc, oneshot},
};
use uuid::Uuid;

use super::{manager::Authorizer, AuthError, ClientSecret, OAuthClient, Result};
use crate::credential_storage::Credential;

const SUCCESS_PAGE: &str =
    "<html><body><p>The authentication flow has completed. You may close this window.</p></body></html>";

const DENIED_PAGE: &str =
    "<html><body><p>Authorization was not granted. You may close this window.</p></body></html>";

/// query string of the consent redirect
#[derive(Deserialize, Debug, Default)]
struct RedirectParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    outcome: mpsc::UnboundedSender<Result<String>>,
}

/// Installed-app consent flow: the browser redirects back to a listener on
/// the loopback interface with the authorization code.
pub struct LoopbackAuthorizer {
    oauth: OAuthClient,
    launch_browser: bool,
}

impl LoopbackAuthorizer {
    pub fn new(oauth: OAuthClient, launch_browser: bool) -> Self {
        Self {
            oauth,
            launch_browser,
        }
    }
}

#[async_trait(?Send)]
impl Authorizer for LoopbackAuthorizer {
    async fn authorize(&self, secret: &ClientSecret, scopes: &[String]) -> Result<Credential> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let redirect_uri = format!("http://127.0.0.1:{}/", listener.local_addr()?.port());
        let state = new_state();
        let url = authorization_url(secret, scopes, &redirect_uri, &state)?;

        println!(
            "{}\n{}",
            style("Please visit this URL to authorize this application:").yellow(),
            style(url.as_str()).bold().cyan()
        );

        if self.launch_browser {
            if let Err(e) = open_browser(url.as_str()) {
                warn!("Could not launch browser: {}", e);
            }
        }

        let code = wait_for_code(listener, &state).await?;
        self.oauth.exchange_code(secret, &code, &redirect_uri, scopes).await
    }
}

fn authorization_url(
    secret: &ClientSecret,
    scopes: &[String],
    redirect_uri: &str,
    state: &str,
) -> Result<Url> {
    Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scopes.join(" ").as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| AuthError::InvalidAuthUri(e.to_string()))
}

/// per-run value echoed back by the redirect
fn new_state() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `None` for requests that are not a consent redirect
fn redirect_outcome(params: RedirectParams, expected_state: &str) -> Option<Result<String>> {
    if let Some(error) = params.error {
        return Some(Err(AuthError::Denied(error)));
    }
    let code = params.code?;
    if params.state.as_deref() != Some(expected_state) {
        return Some(Err(AuthError::StateMismatch));
    }
    Some(Ok(code))
}

async fn handle_redirect(
    State(callback): State<CallbackState>,
    Query(params): Query<RedirectParams>,
) -> Response {
    let Some(outcome) = redirect_outcome(params, &callback.expected_state) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let page = if outcome.is_ok() { SUCCESS_PAGE } else { DENIED_PAGE };
    let _ = callback.outcome.send(outcome);
    Html(page).into_response()
}

/// Serve the redirect target until a request carries `code` or `error`.
/// Anything else, malformed requests included, gets a 404 or 400 and the
/// listener keeps accepting.
async fn wait_for_code(listener: TcpListener, expected_state: &str) -> Result<String> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();
    let app = Router::new()
        .route("/", get(handle_redirect))
        .with_state(CallbackState {
            expected_state: expected_state.into(),
            outcome: tx,
        });

    debug!("Waiting for the authorization redirect on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Some(outcome) = rx.recv().await {
                let _ = done_tx.send(outcome);
            }
        })
        .await?;

    done_rx.await.map_err(|_| {
        AuthError::Io(std::io::Error::other("authorization listener stopped without a redirect"))
    })?
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut command = ProcessCommand::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = ProcessCommand::new("cmd");
        command.args(["/C", "start", ""]);
        command
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = ProcessCommand::new("xdg-open");

    command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
