//! Cookie/token session adapter over an external identity provider.
//!
//! [`TokenSessionResolver`] reads an access token and a refresh token from
//! the request cookies and asks an [`IdentityProvider`] who they belong to.
//! When the access token is no longer accepted it tries one refresh and, on
//! success, emits `Set-Cookie` writes carrying the new token pair. A refresh
//! token the provider rejects is cleared from the client.
//!
//! The provider protocol itself (HTTP endpoints, token formats) lives behind
//! the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cookie::{CookieMutation, CookieOptions};
use crate::error::ResolveError;
use crate::request::{CookieJar, Principal, Role};
use crate::resolver::{Resolution, SessionResolver};
use crate::secret::Secret;

/// Default name of the access-token cookie.
pub const ACCESS_COOKIE: &str = "sb-access-token";
/// Default name of the refresh-token cookie.
pub const REFRESH_COOKIE: &str = "sb-refresh-token";

const SEVEN_DAYS: u64 = 7 * 24 * 60 * 60;

/// Parses the legacy session-lifetime format: a number followed by one of
/// `s`, `m`, `h` or `d`.
///
/// Anything that doesn't match falls back to seven days.
///
/// # Examples
///
/// ```
/// use storefront_gate::parse_expiry;
///
/// assert_eq!(parse_expiry("90s"), 90);
/// assert_eq!(parse_expiry("2h"), 7200);
/// assert_eq!(parse_expiry("soon"), 604_800);
/// ```
pub fn parse_expiry(input: &str) -> u64 {
    let Some(unit) = input.chars().last() else {
        return SEVEN_DAYS;
    };
    let digits = &input[..input.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return SEVEN_DAYS;
    }
    let Ok(value) = digits.parse::<u64>() else {
        return SEVEN_DAYS;
    };

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return SEVEN_DAYS,
    };
    value.saturating_mul(multiplier)
}

/// Free-form metadata the provider stores alongside a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMetadata {
    /// Role name (`ADMIN` or `SUPER_ADMIN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A user record as returned by the identity provider.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IdentityUser {
    /// Provider-side user id
    pub id: String,
    /// Email address; some providers omit it for phone/OAuth-only users
    #[serde(default)]
    pub email: Option<String>,
    /// Application metadata
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl IdentityUser {
    /// Maps the provider record onto a [`Principal`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingEmail`] when the record has no email.
    pub fn into_principal(self) -> Result<Principal, ResolveError> {
        let role = Role::from_metadata(self.user_metadata.role.as_deref());
        let email = self
            .email
            .ok_or_else(|| ResolveError::MissingEmail { id: self.id.clone() })?;

        Ok(Principal {
            id: self.id,
            email,
            role,
        })
    }

    /// Name shown in the admin UI: metadata name, else the email's local
    /// part, else `Admin`.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.user_metadata.name.as_deref() {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("Admin")
            .to_string()
    }
}

/// Fresh tokens issued by a refresh.
#[derive(Debug)]
pub struct TokenPair {
    /// New access token
    pub access_token: Secret<String>,
    /// New refresh token
    pub refresh_token: Secret<String>,
}

impl TokenPair {
    /// Wraps a token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: Secret::new(refresh_token.into()),
        }
    }
}

/// A session the provider issued on sign-in.
#[derive(Debug)]
pub struct ProviderSession {
    /// The signed-in user
    pub user: IdentityUser,
    /// Tokens to store in the session cookies
    pub tokens: TokenPair,
}

/// Result of a successful password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    /// The signed-in administrator
    pub principal: Principal,
    /// Session cookies to set on the response
    pub mutations: Vec<CookieMutation>,
    /// True when the provider account was created during this sign-in
    pub migrated: bool,
}

/// The operations this crate needs from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up the user owning `access_token`.
    ///
    /// `Ok(None)` means the token is expired, revoked or unknown.
    async fn user_for_token(&self, access_token: &str)
        -> Result<Option<IdentityUser>, ResolveError>;

    /// Exchanges a refresh token for a new token pair.
    ///
    /// `Ok(None)` means the refresh token was rejected.
    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>, ResolveError>;

    /// Signs in with email and password.
    ///
    /// Wrong credentials are reported as [`ResolveError::InvalidCredentials`]
    /// and unconfirmed accounts as [`ResolveError::EmailNotConfirmed`].
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &Secret<String>,
    ) -> Result<ProviderSession, ResolveError>;

    /// Creates a provider account carrying `metadata`.
    async fn sign_up(
        &self,
        email: &str,
        password: &Secret<String>,
        metadata: &UserMetadata,
    ) -> Result<(), ResolveError>;

    /// Revokes the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), ResolveError>;
}

/// Names and lifetime of the session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookies {
    /// Access-token cookie name
    pub access_name: String,
    /// Refresh-token cookie name
    pub refresh_name: String,
    /// `Max-Age` for refreshed cookies, in seconds
    pub lifetime_secs: u64,
    /// Attributes for every cookie this adapter writes
    pub options: CookieOptions,
}

impl Default for SessionCookies {
    fn default() -> Self {
        Self {
            access_name: ACCESS_COOKIE.to_string(),
            refresh_name: REFRESH_COOKIE.to_string(),
            lifetime_secs: SEVEN_DAYS,
            options: CookieOptions::default(),
        }
    }
}

impl SessionCookies {
    fn set(&self, name: &str, value: &str) -> CookieMutation {
        let options = CookieOptions {
            max_age: Some(self.lifetime_secs),
            ..self.options.clone()
        };
        CookieMutation::set(name, value, options)
    }

    fn clear(&self, name: &str) -> CookieMutation {
        CookieMutation::remove(name, self.options.clone())
    }
}

/// [`SessionResolver`] backed by access/refresh-token cookies.
#[derive(Debug)]
pub struct TokenSessionResolver<P> {
    provider: P,
    cookies: SessionCookies,
}

impl<P: IdentityProvider> TokenSessionResolver<P> {
    /// Creates a resolver with the default cookie names and lifetime.
    pub fn new(provider: P) -> Self {
        Self::with_cookies(provider, SessionCookies::default())
    }

    /// Creates a resolver with explicit cookie settings.
    pub fn with_cookies(provider: P, cookies: SessionCookies) -> Self {
        Self { provider, cookies }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Resolution, ResolveError> {
        let Some(tokens) = self.provider.refresh(refresh_token).await? else {
            tracing::debug!("refresh token rejected, clearing session cookies");
            return Ok(self.cleared());
        };

        // The old refresh token is spent from here on: every path below must
        // hand the rotated pair to the client.
        let rotated = self.storing(&tokens);
        let access = tokens.access_token.expose_secret();

        let principal = match self.provider.user_for_token(access).await {
            Ok(Some(user)) => user.into_principal(),
            Ok(None) => {
                tracing::debug!("refreshed access token not accepted, clearing session cookies");
                return Ok(self.cleared());
            }
            Err(e) => Err(e),
        };

        match principal {
            Ok(principal) => {
                tracing::debug!(principal = %principal.id, "session refreshed");
                Ok(Resolution::authenticated(principal).with_mutations(rotated))
            }
            Err(e) => {
                tracing::warn!(
                    "session refreshed but user lookup failed, keeping rotated tokens: {}",
                    e
                );
                Ok(Resolution::anonymous().with_mutations(rotated))
            }
        }
    }

    fn cleared(&self) -> Resolution {
        Resolution::anonymous().with_mutations(self.clearing())
    }

    fn clearing(&self) -> Vec<CookieMutation> {
        vec![
            self.cookies.clear(&self.cookies.access_name),
            self.cookies.clear(&self.cookies.refresh_name),
        ]
    }

    fn storing(&self, tokens: &TokenPair) -> Vec<CookieMutation> {
        vec![
            self.cookies
                .set(&self.cookies.access_name, tokens.access_token.expose_secret()),
            self.cookies
                .set(&self.cookies.refresh_name, tokens.refresh_token.expose_secret()),
        ]
    }

    fn signed_in(&self, session: ProviderSession, migrated: bool) -> Result<SignIn, ResolveError> {
        let mutations = self.storing(&session.tokens);
        Ok(SignIn {
            principal: session.user.into_principal()?,
            mutations,
            migrated,
        })
    }

    /// Signs in with email and password and returns the session cookies.
    ///
    /// When the provider does not know the credentials and `profile` is
    /// given, the administrator predates the provider: an account carrying
    /// `profile` is created and the sign-in retried once. Without a profile
    /// the credential error is returned as is.
    ///
    /// # Errors
    ///
    /// Provider errors pass through; a failed account creation or retry is
    /// reported as [`ResolveError::Migration`].
    pub async fn sign_in(
        &self,
        email: &str,
        password: &Secret<String>,
        profile: Option<&UserMetadata>,
    ) -> Result<SignIn, ResolveError> {
        let err = match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => return self.signed_in(session, false),
            Err(e) => e,
        };

        let Some(profile) = profile.filter(|_| err.is_unmigrated()) else {
            return Err(err);
        };

        tracing::info!("no provider account for admin, migrating");
        self.provider
            .sign_up(email, password, profile)
            .await
            .map_err(|e| ResolveError::Migration(e.to_string()))?;
        let session = self
            .provider
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| ResolveError::Migration(e.to_string()))?;
        self.signed_in(session, true)
    }

    /// Revokes the session held in `cookies` and returns the writes that
    /// clear both session cookies.
    ///
    /// A request without an access token only gets the clearing writes.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the revocation fails.
    pub async fn sign_out(&self, cookies: &CookieJar) -> Result<Vec<CookieMutation>, ResolveError> {
        if let Some(token) = cookies
            .get(&self.cookies.access_name)
            .filter(|t| !t.is_empty())
        {
            self.provider.sign_out(token).await?;
        }
        Ok(self.clearing())
    }

    /// Resolves a bare access token, as older clients sent it, without any
    /// refresh.
    pub async fn verify_token(&self, token: &str) -> Result<Option<Principal>, ResolveError> {
        match self.provider.user_for_token(token).await? {
            Some(user) => user.into_principal().map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<P: IdentityProvider> SessionResolver for TokenSessionResolver<P> {
    async fn resolve(&self, cookies: &CookieJar) -> Result<Resolution, ResolveError> {
        let access = cookies.get(&self.cookies.access_name);
        let refresh = cookies.get(&self.cookies.refresh_name);

        if let Some(token) = access.filter(|t| !t.is_empty()) {
            if let Some(user) = self.provider.user_for_token(token).await? {
                return Ok(Resolution::authenticated(user.into_principal()?));
            }
        }

        match (access, refresh.filter(|t| !t.is_empty())) {
            (_, Some(refresh_token)) => self.refresh_session(refresh_token).await,
            // Stale access token and nothing to refresh with.
            (Some(_), None) => Ok(Resolution::anonymous()
                .with_mutations(vec![self.cookies.clear(&self.cookies.access_name)])),
            (None, None) => Ok(Resolution::anonymous()),
        }
    }
}
