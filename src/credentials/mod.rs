//! Bearer credentials for the source API.
//!
//! The orchestrator never talks to the token endpoint itself. It asks a
//! [`CredentialProvider`] for a credential, and the provider decides whether a
//! cached one is still good. The production provider is
//! [`CachedCredentialProvider`] wrapping [`ClientCredentialsLoader`]; it is
//! built once per process and shared by every run.

use std::fmt;
use std::future::Future;

use thiserror::Error;

pub mod cache;
pub mod client_credentials;

pub use cache::{CacheConfig, CachedCredentialProvider, IssuedToken, TokenLoader};
pub use client_credentials::ClientCredentialsLoader;

/// Failure to obtain a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint answered with a non-success status.
    #[error("token endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint answered 2xx without a usable token.
    #[error("token response missing access_token")]
    MissingToken,
}

/// A bearer token for the source API.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Parameters of a client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub token_url: String,
    pub audience: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CredentialRequest {
    /// Cache key: one credential per token endpoint and client.
    pub fn cache_key(&self) -> String {
        format!("{}#{}", self.token_url, self.client_id)
    }
}

impl fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("token_url", &self.token_url)
            .field("audience", &self.audience)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Supplies source API credentials.
///
/// Implementations are shared across runs, so they must be `Send + Sync`.
pub trait CredentialProvider: Send + Sync {
    fn get(
        &self,
        request: &CredentialRequest,
    ) -> impl Future<Output = Result<Credential, CredentialError>> + Send;
}

impl<T: CredentialProvider> CredentialProvider for std::sync::Arc<T> {
    fn get(
        &self,
        request: &CredentialRequest,
    ) -> impl Future<Output = Result<Credential, CredentialError>> + Send {
        (**self).get(request)
    }
}
