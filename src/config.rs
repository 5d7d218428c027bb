//! Environment-driven configuration.

use std::env;

use tracing::info;

use crate::error::ConfigError;
use crate::identity::HttpIdentityProvider;
use crate::route::RoutePaths;
use crate::secret::Secret;
use crate::session::{parse_expiry, SessionCookies, TokenSessionResolver};

/// Deployment environment. Only affects where auth callbacks redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development: callbacks always return to the request origin
    Development,
    /// Anything else
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("development") {
            Environment::Development
        } else {
            Environment::Production
        }
    }
}

/// Identity provider endpoint and key, read by [`HttpIdentityProvider`].
#[derive(Debug)]
pub struct IdentityConfig {
    /// Base URL of the identity provider
    pub url: String,
    /// Public (anon) API key
    pub anon_key: Secret<String>,
}

/// Everything the gate needs at startup.
#[derive(Debug)]
pub struct GateConfig {
    /// Route prefixes and redirect targets
    pub routes: RoutePaths,
    /// Identity provider settings
    pub identity: IdentityConfig,
    /// Session cookie names and lifetime
    pub session: SessionCookies,
    /// Deployment environment
    pub environment: Environment,
}

impl GateConfig {
    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Fails when `IDENTITY_URL` or `IDENTITY_ANON_KEY` is missing, or a path
    /// setting does not start with `/`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use storefront_gate::GateConfig;
    ///
    /// let vars = HashMap::from([
    ///     ("IDENTITY_URL", "https://id.example.com"),
    ///     ("IDENTITY_ANON_KEY", "anon"),
    ///     ("SESSION_TTL", "12h"),
    /// ]);
    ///
    /// let config = GateConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    /// assert_eq!(config.routes.login_path, "/login");
    /// assert_eq!(config.session.lifetime_secs, 43_200);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RoutePaths::default();
        let routes = RoutePaths {
            auth_prefix: path_or(&lookup, "GATE_AUTH_PREFIX", defaults.auth_prefix)?,
            api_prefix: path_or(&lookup, "GATE_API_PREFIX", defaults.api_prefix)?,
            admin_prefix: path_or(&lookup, "GATE_ADMIN_PREFIX", defaults.admin_prefix)?,
            login_path: path_or(&lookup, "GATE_LOGIN_PATH", defaults.login_path)?,
            dashboard_path: path_or(&lookup, "GATE_DASHBOARD_PATH", defaults.dashboard_path)?,
        };

        let identity = IdentityConfig {
            url: required(&lookup, "IDENTITY_URL")?,
            anon_key: Secret::new(required(&lookup, "IDENTITY_ANON_KEY")?),
        };

        let cookie_defaults = SessionCookies::default();
        let session = SessionCookies {
            access_name: or_default(&lookup, "SESSION_ACCESS_COOKIE", cookie_defaults.access_name),
            refresh_name: or_default(
                &lookup,
                "SESSION_REFRESH_COOKIE",
                cookie_defaults.refresh_name,
            ),
            lifetime_secs: parse_expiry(&or_default(&lookup, "SESSION_TTL", "7d".to_string())),
            options: cookie_defaults.options,
        };

        let environment = Environment::parse(&or_default(
            &lookup,
            "APP_ENV",
            "production".to_string(),
        ));

        Ok(Self {
            routes,
            identity,
            session,
            environment,
        })
    }

    /// Builds the token session resolver these settings describe: an HTTP
    /// client for the identity provider plus the configured cookie names and
    /// lifetime.
    ///
    /// # Errors
    ///
    /// Fails when `IDENTITY_URL` is not a valid URL.
    pub fn token_resolver(
        &self,
    ) -> Result<TokenSessionResolver<HttpIdentityProvider>, ConfigError> {
        let provider = HttpIdentityProvider::new(&self.identity)?;
        Ok(TokenSessionResolver::with_cookies(
            provider,
            self.session.clone(),
        ))
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn or_default<F>(lookup: &F, key: &'static str, default: String) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value,
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

fn path_or<F>(lookup: &F, key: &'static str, default: String) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = or_default(lookup, key, default);
    if !value.starts_with('/') {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("'{}' must start with '/'", value),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GateConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateConfig::from_lookup(|k| vars.get(k).cloned())
    }

    const IDENTITY: [(&str, &str); 2] = [
        ("IDENTITY_URL", "https://id.example.com"),
        ("IDENTITY_ANON_KEY", "anon-key"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(&IDENTITY).unwrap();

        assert_eq!(config.routes, RoutePaths::default());
        assert_eq!(config.session.access_name, "sb-access-token");
        assert_eq!(config.session.lifetime_secs, 604800);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.identity.anon_key.expose_secret(), "anon-key");
    }

    #[test]
    fn overrides_apply() {
        let mut vars = IDENTITY.to_vec();
        vars.extend([
            ("GATE_LOGIN_PATH", "/masuk"),
            ("SESSION_REFRESH_COOKIE", "rt"),
            ("SESSION_TTL", "30m"),
            ("APP_ENV", "Development"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.routes.login_path, "/masuk");
        assert_eq!(config.session.refresh_name, "rt");
        assert_eq!(config.session.lifetime_secs, 1800);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn missing_identity_is_an_error() {
        let err = load(&[("IDENTITY_URL", "https://id.example.com")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("IDENTITY_ANON_KEY"));

        let err = load(&[("IDENTITY_URL", "  "), ("IDENTITY_ANON_KEY", "k")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("IDENTITY_URL"));
    }

    #[test]
    fn relative_paths_are_rejected() {
        let mut vars = IDENTITY.to_vec();
        vars.push(("GATE_ADMIN_PREFIX", "admin"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "GATE_ADMIN_PREFIX",
                ..
            }
        ));
    }

    #[test]
    fn identity_settings_build_the_resolver() {
        let mut vars = IDENTITY.to_vec();
        vars.push(("SESSION_ACCESS_COOKIE", "at"));
        let config = load(&vars).unwrap();

        assert!(config.token_resolver().is_ok());
    }

    #[test]
    fn malformed_identity_url_fails_resolver_construction() {
        let config = load(&[("IDENTITY_URL", "id.example.com"), ("IDENTITY_ANON_KEY", "k")]).unwrap();
        assert!(matches!(
            config.token_resolver(),
            Err(ConfigError::Invalid {
                key: "IDENTITY_URL",
                ..
            })
        ));
    }

    #[test]
    fn anon_key_never_printed() {
        let config = load(&IDENTITY).unwrap();
        assert!(!format!("{:?}", config).contains("anon-key"));
    }
}
