//! Federated sign-in through the Firebase Auth REST API

use super::jwt::IdTokenDecoder;
use super::{AuthUser, Credential, IdentityError, IdentityProvider};
use crate::config::IdentityConfig;
use appfitness_shared::User;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Identity provider backed by Firebase Auth
pub struct FirebaseIdentity {
    client: Client,
    base_url: String,
    api_key: SecretString,
    request_uri: String,
    decoder: IdTokenDecoder,
}

impl FirebaseIdentity {
    pub fn new(config: &IdentityConfig, project_id: Option<&str>) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_uri: config.request_uri.clone(),
            decoder: IdTokenDecoder::new(project_id),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, credential: Credential) -> Result<AuthUser, IdentityError> {
        let url = format!("{}/accounts:signInWithIdp", self.base_url);
        let body = SignInWithIdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                credential.id_token.expose_secret(),
                credential.provider_id
            ),
            request_uri: &self.request_uri,
            return_idp_credential: true,
            return_secure_token: true,
        };

        debug!(provider = %credential.provider_id, "Exchanging provider credential");
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.to_string(),
            };
            return Err(IdentityError::Rejected(message));
        }

        let signed_in: SignInWithIdpResponse = response.json().await?;
        let claims = self.decoder.decode(&signed_in.id_token)?;
        if claims.uid() != signed_in.local_id {
            return Err(IdentityError::Rejected(
                "token subject does not match the signed-in account".to_string(),
            ));
        }

        info!(user_id = %signed_in.local_id, "User signed in");

        Ok(AuthUser {
            user: User {
                id: signed_in.local_id,
                email: signed_in.email.or(claims.email.clone()),
                display_name: signed_in.display_name.or(claims.name.clone()),
            },
            expires_at: claims.expires_at(),
            id_token: SecretString::new(signed_in.id_token),
            refresh_token: signed_in.refresh_token.map(SecretString::new),
        })
    }
}
