//! Key Vault REST client
//!
//! A [`KeyVaultClient`] is built once per resolution: the factory
//! ([`KeyVaultClient::connect`]) obtains a bearer credential scoped to the
//! vault resource audience and attaches it to a fresh HTTP client. There is
//! no credential caching and no retry; a failed call fails the resolution.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use kvsync_secrets::{ObjectKind, SecretError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::auth::{AccessToken, Authenticator};

/// Resource audience used for all vault access, independent of the target
/// vault's own endpoint.
pub const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// Version string selecting the latest version of an object.
pub const LATEST_VERSION: &str = "";

/// REST api-version pinned for all object reads.
const API_VERSION: &str = "2016-10-01";

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    BASE64_STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

/// Certificate object bundle: the public certificate, DER encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateBundle {
    /// Raw DER bytes of the certificate (`cer`, base64 on the wire)
    #[serde(rename = "cer", deserialize_with = "deserialize_base64")]
    pub der: Vec<u8>,

    /// Object identifier URL
    #[serde(default)]
    pub id: Option<String>,
}

/// JSON Web Key as returned inside a key bundle.
///
/// Public components are always present for RSA keys; private components are
/// only populated when the vault releases exportable key material.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonWebKey {
    /// Key type, e.g. `RSA`, `RSA-HSM`, `EC`
    #[serde(default)]
    pub kty: String,

    /// Key identifier URL
    #[serde(default)]
    pub kid: Option<String>,

    /// RSA modulus, base64url
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent, base64url
    #[serde(default)]
    pub e: Option<String>,

    /// RSA private exponent, base64url
    #[serde(default)]
    pub d: Option<String>,

    /// First RSA prime factor, base64url
    #[serde(default)]
    pub p: Option<String>,

    /// Second RSA prime factor, base64url
    #[serde(default)]
    pub q: Option<String>,
}

/// Key object bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyBundle {
    /// The key material
    pub key: JsonWebKey,
}

/// Secret object bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretBundle {
    /// The stored secret value, verbatim
    pub value: String,

    /// Object identifier URL
    #[serde(default)]
    pub id: Option<String>,
}

/// HTTP client for a vault's object-read operations, bound to one bearer
/// credential for the duration of a single resolution.
pub struct KeyVaultClient {
    http: reqwest::Client,
    token: AccessToken,
}

impl KeyVaultClient {
    /// Build a client bound to `resource`, obtaining a credential from the
    /// authenticator.
    ///
    /// # Errors
    /// Returns [`SecretError::Authorization`] when the authenticator fails or
    /// the HTTP client cannot be constructed; no vault call is attempted in
    /// either case.
    pub async fn connect<A>(resource: &str, authenticator: &A) -> Result<Self, SecretError>
    where
        A: Authenticator + ?Sized,
    {
        let token = authenticator.authorize(resource).await?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SecretError::Authorization {
                resource: resource.to_string(),
                message: format!("failed to construct HTTP client: {e}"),
            })?;
        Ok(Self { http, token })
    }

    /// Get a certificate object; an empty `version` selects the latest.
    ///
    /// # Errors
    /// Returns [`SecretError::Fetch`] tagged `certificate` on any transport,
    /// status or response-decoding failure.
    pub async fn get_certificate(
        &self,
        vault_base_url: &str,
        name: &str,
        version: &str,
    ) -> Result<CertificateBundle, SecretError> {
        self.get_object(ObjectKind::Certificate, vault_base_url, "certificates", name, version)
            .await
    }

    /// Get a key object; an empty `version` selects the latest.
    ///
    /// # Errors
    /// Returns [`SecretError::Fetch`] tagged `key` on any transport, status
    /// or response-decoding failure.
    pub async fn get_key(
        &self,
        vault_base_url: &str,
        name: &str,
        version: &str,
    ) -> Result<KeyBundle, SecretError> {
        self.get_object(ObjectKind::Key, vault_base_url, "keys", name, version)
            .await
    }

    /// Get a secret object; an empty `version` selects the latest.
    ///
    /// # Errors
    /// Returns [`SecretError::Fetch`] tagged `secret` on any transport,
    /// status or response-decoding failure.
    pub async fn get_secret(
        &self,
        vault_base_url: &str,
        name: &str,
        version: &str,
    ) -> Result<SecretBundle, SecretError> {
        self.get_object(ObjectKind::Secret, vault_base_url, "secrets", name, version)
            .await
    }

    async fn get_object<T>(
        &self,
        kind: ObjectKind,
        vault_base_url: &str,
        collection: &str,
        name: &str,
        version: &str,
    ) -> Result<T, SecretError>
    where
        T: DeserializeOwned,
    {
        let url = object_url(vault_base_url, collection, name, version);
        let fetch_err = |message: String| SecretError::Fetch {
            kind,
            name: name.to_string(),
            vault: vault_base_url.to_string(),
            message,
        };

        tracing::debug!(%kind, name, url, "fetching vault object");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| fetch_err(format!("failed to decode response: {e}")))
    }
}

impl std::fmt::Debug for KeyVaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVaultClient").finish_non_exhaustive()
    }
}

/// Assemble an object-read URL. The version segment is omitted entirely for
/// [`LATEST_VERSION`], which the service resolves to the newest version.
fn object_url(vault_base_url: &str, collection: &str, name: &str, version: &str) -> String {
    let base = vault_base_url.trim_end_matches('/');
    if version.is_empty() {
        format!("{base}/{collection}/{name}?api-version={API_VERSION}")
    } else {
        format!("{base}/{collection}/{name}/{version}?api-version={API_VERSION}")
    }
}
