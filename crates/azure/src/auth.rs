//! Bearer-credential acquisition for Key Vault access
//!
//! The resolver never handles raw credentials itself; it asks an
//! [`Authenticator`] for an [`AccessToken`] scoped to a resource audience.
//! [`EnvironmentAuthenticator`] is the production implementation, reading the
//! application identity from the ambient environment and exchanging it at the
//! AAD token endpoint. [`StaticAuthenticator`] substitutes fixed credentials
//! for tests and local development.

use async_trait::async_trait;
use kvsync_secrets::SecretError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Default AAD authority host.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Environment variable holding the AAD tenant id.
pub const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";

/// Environment variable holding the service principal client id.
pub const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";

/// Environment variable holding the service principal client secret.
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";

/// A bearer credential scoped to a single resource audience.
///
/// Obtained fresh per resolution and owned by the client for that resolution
/// only; never cached.
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
}

impl AccessToken {
    /// Wrap a raw bearer token.
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token: SecretString::from(token),
        }
    }

    /// Expose the raw token for attaching to a request.
    ///
    /// The caller must not log or persist the exposed value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Capability interface for obtaining bearer credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Obtain a bearer credential scoped to `resource`.
    ///
    /// # Errors
    /// Returns [`SecretError::Authorization`] when no credential can be
    /// obtained.
    async fn authorize(&self, resource: &str) -> Result<AccessToken, SecretError>;
}

/// Wire format of the AAD token response; only the access token is consumed.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Obtains credentials from the ambient execution environment.
///
/// Reads the service principal identity from `AZURE_TENANT_ID`,
/// `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET` and exchanges it for a bearer
/// token via the client-credentials grant at
/// `{authority}/{tenant}/oauth2/token`, with the requested resource audience
/// as the `resource` form field.
#[derive(Debug, Clone)]
pub struct EnvironmentAuthenticator {
    authority: String,
}

impl EnvironmentAuthenticator {
    /// Create an authenticator against the default AAD authority.
    #[must_use]
    pub fn new() -> Self {
        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
        }
    }

    /// Override the authority host (sovereign clouds, tests).
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    fn env_var(resource: &str, name: &str) -> Result<String, SecretError> {
        std::env::var(name).map_err(|_| SecretError::Authorization {
            resource: resource.to_string(),
            message: format!("{name} is not set"),
        })
    }
}

impl Default for EnvironmentAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for EnvironmentAuthenticator {
    async fn authorize(&self, resource: &str) -> Result<AccessToken, SecretError> {
        let tenant = Self::env_var(resource, TENANT_ID_ENV)?;
        let client_id = Self::env_var(resource, CLIENT_ID_ENV)?;
        let client_secret = Self::env_var(resource, CLIENT_SECRET_ENV)?;

        let authorization_err = |message: String| SecretError::Authorization {
            resource: resource.to_string(),
            message,
        };

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| authorization_err(format!("failed to construct HTTP client: {e}")))?;

        let token_endpoint = format!(
            "{}/{tenant}/oauth2/token",
            self.authority.trim_end_matches('/')
        );

        tracing::debug!(endpoint = %token_endpoint, resource, "requesting bearer token");

        let response = http
            .post(&token_endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("resource", resource),
            ])
            .send()
            .await
            .map_err(|e| authorization_err(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(authorization_err(format!(
                "token endpoint returned HTTP {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| authorization_err(format!("failed to decode token response: {e}")))?;

        Ok(AccessToken::new(token.access_token))
    }
}

/// Authenticator returning a fixed token, for tests and local development.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    token: String,
}

impl StaticAuthenticator {
    /// Create an authenticator that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authorize(&self, _resource: &str) -> Result<AccessToken, SecretError> {
        Ok(AccessToken::new(self.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJ0eXAi".to_string());
        assert_eq!(format!("{token:?}"), "AccessToken([REDACTED])");
        assert_eq!(token.expose(), "eyJ0eXAi");
    }

    #[tokio::test]
    async fn test_static_authenticator_returns_fixed_token() {
        let authenticator = StaticAuthenticator::new("fixed-token");
        let token = authenticator
            .authorize("https://vault.azure.net")
            .await
            .unwrap();
        assert_eq!(token.expose(), "fixed-token");
    }

    #[tokio::test]
    async fn test_environment_authenticator_missing_tenant() {
        temp_env::async_with_vars(
            [
                (TENANT_ID_ENV, None::<&str>),
                (CLIENT_ID_ENV, Some("client")),
                (CLIENT_SECRET_ENV, Some("secret")),
            ],
            async {
                let authenticator = EnvironmentAuthenticator::new();
                let result = authenticator.authorize("https://vault.azure.net").await;
                match result {
                    Err(SecretError::Authorization { message, .. }) => {
                        assert!(message.contains(TENANT_ID_ENV));
                    }
                    other => panic!("expected Authorization error, got {other:?}"),
                }
            },
        )
        .await;
    }

    #[tokio::test]
    async fn test_environment_authenticator_exchanges_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/contoso-tenant/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=sp-client"))
            .and(body_string_contains(
                "resource=https%3A%2F%2Fvault.azure.net",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "issued-token",
                "token_type": "Bearer",
                "expires_in": "3599"
            })))
            .expect(1)
            .mount(&server)
            .await;

        temp_env::async_with_vars(
            [
                (TENANT_ID_ENV, Some("contoso-tenant")),
                (CLIENT_ID_ENV, Some("sp-client")),
                (CLIENT_SECRET_ENV, Some("sp-secret")),
            ],
            async {
                let authenticator = EnvironmentAuthenticator::new().with_authority(server.uri());
                let token = authenticator
                    .authorize("https://vault.azure.net")
                    .await
                    .unwrap();
                assert_eq!(token.expose(), "issued-token");
            },
        )
        .await;
    }

    #[tokio::test]
    async fn test_environment_authenticator_token_endpoint_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        temp_env::async_with_vars(
            [
                (TENANT_ID_ENV, Some("contoso-tenant")),
                (CLIENT_ID_ENV, Some("sp-client")),
                (CLIENT_SECRET_ENV, Some("bad-secret")),
            ],
            async {
                let authenticator = EnvironmentAuthenticator::new().with_authority(server.uri());
                let result = authenticator.authorize("https://vault.azure.net").await;
                match result {
                    Err(SecretError::Authorization { message, .. }) => {
                        assert!(message.contains("401"));
                    }
                    other => panic!("expected Authorization error, got {other:?}"),
                }
            },
        )
        .await;
    }
}
