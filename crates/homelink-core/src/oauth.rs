//! OAuth2 authorization-code flow against the smart-home provider.
//!
//! [`OAuthClient`] builds the browser authorization URL and exchanges the
//! code returned to the callback for a [`Credential`]. The exchange sits
//! behind the [`TokenExchange`] trait so the callback server can be driven
//! by a stub in tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::OAuthSettings;
use crate::error::{CoreError, Result};
use crate::models::{Credential, TokenErrorResponse, TokenResponse};

/// Exchanges an authorization code for a credential.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Redeem `code` at the provider's token endpoint.
    async fn exchange_code(&self, code: &str) -> Result<Credential>;
}

/// OAuth client for the authorization-code flow.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    settings: OAuthSettings,
    http_client: Client,
}

impl OAuthClient {
    /// Create a client whose token requests time out after `timeout`.
    pub fn new(settings: OAuthSettings, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            settings,
            http_client,
        })
    }

    /// Build the URL the user opens to grant access.
    ///
    /// `state` comes back unchanged on the callback redirect.
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.settings.authorize_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.settings.client_id)
                .append_pair("redirect_uri", self.settings.redirect_url.as_str())
                .append_pair("response_type", "code")
                .append_pair("state", state);

            if !self.settings.scopes.is_empty() {
                pairs.append_pair("scope", &self.settings.scopes.join(" "));
            }

            // Provider-specific parameters
            if let Some(device_id) = &self.settings.device_id {
                pairs.append_pair("device_id", device_id);
            }
            if let Some(device_name) = &self.settings.device_name {
                pairs.append_pair("device_name", device_name);
            }
        }

        url
    }
}

#[async_trait]
impl TokenExchange for OAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<Credential> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", self.settings.client_id.as_str());
        params.insert("client_secret", self.settings.client_secret.as_str());
        params.insert("redirect_uri", self.settings.redirect_url.as_str());

        debug!(url = %self.settings.token_url, "Exchanging authorization code");

        let response = self
            .http_client
            .post(self.settings.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token endpoint rejected the code");
            return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(error) => CoreError::OAuth {
                    error: error.error,
                    description: error.error_description,
                },
                Err(_) => CoreError::api(status.as_u16(), body),
            });
        }

        let token_response: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(Credential::from_response(token_response))
    }
}
