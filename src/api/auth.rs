//! Login call against the role-scoped backend endpoint.

use reqwest::{Client, header::CONTENT_TYPE};
use thiserror::Error;

use crate::{
    api::{envelope, form_body},
    config::ApiCfg,
    model::Role,
};

/// A successful authentication.
#[derive(Clone, Debug)]
pub struct AuthSuccess {
    pub role: Role,
    /// The login was a duplicate the backend had already recorded.
    pub already_processed: bool,
    /// Raw response body, kept for callers that need payload details.
    pub raw_payload: String,
}

/// Authentication failures. Nothing here is retried; the caller surfaces the
/// error and leaves the form populated for another attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("invalid server response format")]
    MalformedResponse,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Authenticate `username`/`password` against the endpoint for `role`.
///
/// Sends the pair as a form-urlencoded POST and classifies the envelope.
/// One request per call; the worker serializes calls so at most one login is
/// ever in flight.
pub async fn authenticate(
    http: &Client,
    api: &ApiCfg,
    role: Role,
    username: &str,
    password: &str,
) -> Result<AuthSuccess, AuthError> {
    let body = form_body(&[("username", username), ("password", password)]);
    let text = http
        .post(api.login_url(role))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?
        .text()
        .await?;

    let env = envelope::parse_server_envelope(&text).map_err(|e| {
        tracing::warn!("login response unparseable: {e}");
        AuthError::MalformedResponse
    })?;

    if env.is_success() {
        tracing::info!("login ok for {} role", role.as_str());
        return Ok(AuthSuccess {
            role,
            already_processed: false,
            raw_payload: text,
        });
    }
    if env.status == envelope::STATUS_ALREADY_PROCESSED {
        tracing::info!("login ok (already processed) for {} role", role.as_str());
        return Ok(AuthSuccess {
            role,
            already_processed: true,
            raw_payload: text,
        });
    }

    let message = env
        .message
        .unwrap_or_else(|| "Login failed. Please check your credentials.".into());
    tracing::warn!("login rejected: {message}");
    Err(AuthError::InvalidCredentials(message))
}
