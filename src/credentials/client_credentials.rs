//! OAuth2 client-credentials grant against the source's token endpoint.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cache::{IssuedToken, TokenLoader};
use super::{Credential, CredentialError, CredentialRequest};

#[derive(Serialize)]
struct TokenRequestBody<'a> {
    audience: &'a str,
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponseBody {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Requests tokens with `POST <token_url>`.
#[derive(Debug, Clone)]
pub struct ClientCredentialsLoader {
    http: reqwest::Client,
}

impl ClientCredentialsLoader {
    pub fn new(http: reqwest::Client) -> Self {
        ClientCredentialsLoader { http }
    }
}

impl TokenLoader for ClientCredentialsLoader {
    fn load(
        &self,
        request: &CredentialRequest,
    ) -> impl Future<Output = Result<IssuedToken, CredentialError>> + Send {
        async move {
            let body = TokenRequestBody {
                audience: &request.audience,
                grant_type: "client_credentials",
                client_id: &request.client_id,
                client_secret: &request.client_secret,
            };

            let response = self
                .http
                .post(&request.token_url)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CredentialError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: TokenResponseBody = response.json().await?;
            let token = parsed
                .access_token
                .filter(|t| !t.is_empty())
                .ok_or(CredentialError::MissingToken)?;

            Ok(IssuedToken {
                credential: Credential::new(token),
                expires_in: parsed.expires_in.map(Duration::from_secs),
            })
        }
    }
}
