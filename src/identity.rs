//! HTTP client for the hosted identity provider's auth API.
//!
//! Endpoints live under `{IDENTITY_URL}/auth/v1/`. Every call carries the
//! anon key in the `apikey` header; calls made on behalf of a user also send
//! the access token as a bearer credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::IdentityConfig;
use crate::error::{ConfigError, ResolveError};
use crate::secret::Secret;
use crate::session::{IdentityProvider, IdentityUser, ProviderSession, TokenPair, UserMetadata};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: IdentityUser,
}

impl From<TokenResponse> for ProviderSession {
    fn from(response: TokenResponse) -> Self {
        ProviderSession {
            user: response.user,
            tokens: TokenPair::new(response.access_token, response.refresh_token),
        }
    }
}

/// Error bodies differ between API versions; take whichever message is set.
#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

/// [`IdentityProvider`] speaking the provider's REST auth API.
#[derive(Debug)]
pub struct HttpIdentityProvider {
    base: Url,
    anon_key: Secret<String>,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    /// Builds a client for the provider described by `config`.
    ///
    /// # Errors
    ///
    /// Fails when the URL does not parse or the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, ConfigError> {
        let mut base = Url::parse(&config.url).map_err(|e| ConfigError::Invalid {
            key: "IDENTITY_URL",
            reason: e.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "IDENTITY_URL",
                reason: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Self {
            base,
            anon_key: Secret::new(config.anon_key.expose_secret().clone()),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ResolveError> {
        self.base
            .join(path)
            .map_err(|e| ResolveError::Provider(format!("bad endpoint '{}': {}", path, e)))
    }

    fn authorized(&self, request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        let request = request.header("apikey", self.anon_key.expose_secret());
        match bearer {
            Some(token) => request.bearer_auth(token),
            None => request.bearer_auth(self.anon_key.expose_secret()),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ResolveError> {
        request
            .send()
            .await
            .map_err(|e| ResolveError::Provider(e.to_string()))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ResolveError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ResolveError::Provider(format!("unexpected response body: {}", e)))
}

async fn rejection(response: Response) -> ResolveError {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .unwrap_or_default()
        .into_message()
        .unwrap_or_else(|| status.to_string());

    if message.contains("Invalid login credentials") {
        ResolveError::InvalidCredentials
    } else if message.contains("Email not confirmed") {
        ResolveError::EmailNotConfirmed
    } else if status.is_client_error() {
        ResolveError::Rejected(message)
    } else {
        ResolveError::Provider(format!("HTTP {}: {}", status, message))
    }
}

fn is_token_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn user_for_token(
        &self,
        access_token: &str,
    ) -> Result<Option<IdentityUser>, ResolveError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .send(self.authorized(self.client.get(url), Some(access_token)))
            .await?;

        match response.status() {
            s if s.is_success() => decode(response).await.map(Some),
            s if is_token_rejection(s) => Ok(None),
            _ => Err(rejection(response).await),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, ResolveError> {
        let url = self.endpoint("auth/v1/token?grant_type=refresh_token")?;
        let request = self
            .client
            .post(url)
            .json(&json!({ "refresh_token": refresh_token }));
        let response = self.send(self.authorized(request, None)).await?;

        match response.status() {
            s if s.is_success() => {
                let session: ProviderSession = decode::<TokenResponse>(response).await?.into();
                Ok(Some(session.tokens))
            }
            s if is_token_rejection(s) => Ok(None),
            _ => Err(rejection(response).await),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &Secret<String>,
    ) -> Result<ProviderSession, ResolveError> {
        let url = self.endpoint("auth/v1/token?grant_type=password")?;
        let request = self.client.post(url).json(&json!({
            "email": email,
            "password": password.expose_secret(),
        }));
        let response = self.send(self.authorized(request, None)).await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(decode::<TokenResponse>(response).await?.into())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &Secret<String>,
        metadata: &UserMetadata,
    ) -> Result<(), ResolveError> {
        let url = self.endpoint("auth/v1/signup")?;
        let request = self.client.post(url).json(&json!({
            "email": email,
            "password": password.expose_secret(),
            "data": metadata,
        }));
        let response = self.send(self.authorized(request, None)).await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ResolveError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .send(self.authorized(self.client.post(url), Some(access_token)))
            .await?;

        match response.status() {
            // An already-dead session is signed out.
            s if s.is_success() || is_token_rejection(s) => Ok(()),
            _ => Err(rejection(response).await),
        }
    }
}
