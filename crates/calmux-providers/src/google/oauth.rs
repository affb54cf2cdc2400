//! Token endpoint calls for Google OAuth.
//!
//! Only the two grants the sources need are implemented: exchanging an
//! installed-app authorization code, and refreshing an access token. The
//! consent screen itself is handled outside calmux; the user pastes the
//! code it displays.

use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::credentials::Credential;
use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Redirect URI of the copy/paste installed-app flow.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Talks to the token endpoint on behalf of one OAuth client.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: OAuthCredentials,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(client: OAuthCredentials, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            http,
        })
    }

    /// Exchanges an authorization code for a credential carrying `scopes`.
    pub async fn exchange_code(&self, code: &str, scopes: &[String]) -> ProviderResult<Credential> {
        let grant = self
            .request_grant("authorization code exchange", &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", OOB_REDIRECT_URI),
            ])
            .await?;
        info!(scopes = scopes.len(), "authorization code exchanged");
        Ok(Credential::new(
            grant.access_token,
            grant.refresh_token,
            grant.expires_in,
            scopes.to_vec(),
        ))
    }

    /// Refreshes `credential` with its refresh token.
    pub async fn refresh(&self, credential: Credential) -> ProviderResult<Credential> {
        let refresh_token = credential.refresh_token.clone().ok_or_else(|| {
            ProviderError::authentication("access token expired and no refresh token is stored")
        })?;

        let grant = self
            .request_grant("token refresh", &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .await?;
        info!("access token refreshed");
        Ok(credential.refreshed(grant.access_token, grant.refresh_token, grant.expires_in))
    }

    /// Posts a grant with the client id and secret added to `fields`.
    async fn request_grant(
        &self,
        operation: &str,
        fields: &[(&str, &str)],
    ) -> ProviderResult<TokenResponse> {
        let mut form = vec![
            ("client_id", self.client.client_id.as_str()),
            ("client_secret", self.client.client_secret.as_str()),
        ];
        form.extend_from_slice(fields);

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{operation} could not be sent: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("{operation} response was cut off: {e}")))?;

        if status.is_success() {
            parse_token_response(&body)
        } else {
            Err(ProviderError::authentication(format!(
                "{operation} rejected ({status}): {body}"
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn parse_token_response(body: &str) -> ProviderResult<TokenResponse> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::parse(format!("unreadable token grant: {e}")))
}
