//! Secret resolution for kvsync
//!
//! Provides the provider-independent pieces of secret resolution: the
//! [`SecretDescriptor`] input type, the [`SecretResolver`] contract
//! implemented by provider crates, the [`SecretError`] taxonomy, and
//! certificate normalization via the [`cert`] module.
//!
//! A descriptor names a vault, an object inside that vault, and the object's
//! type. Resolution turns it into a single string payload:
//!
//! ```ignore
//! use kvsync_secrets::{SecretDescriptor, SecretResolver};
//!
//! let descriptor = SecretDescriptor::new("prod-vault", "db-password", "secret");
//! let value = resolver.resolve(&descriptor).await?;
//! ```

pub mod cert;
mod types;

pub use types::SecureSecret;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The category of a stored vault object, used to tag fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// An X.509 certificate object
    Certificate,
    /// A cryptographic key object
    Key,
    /// A generic secret object
    Secret,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Certificate => f.write_str("certificate"),
            Self::Key => f.write_str("key"),
            Self::Secret => f.write_str("secret"),
        }
    }
}

/// Error types for secret resolution
#[derive(Debug, Error)]
pub enum SecretError {
    /// Credential acquisition or client construction failed; no provider
    /// call was made.
    #[error("failed to authorize for resource '{resource}': {message}")]
    Authorization {
        /// Resource audience the credential was requested for
        resource: String,
        /// Error message from the authenticator
        message: String,
    },

    /// A provider call failed, tagged by the kind of object being fetched.
    #[error("failed to get {kind} '{name}' from vault '{vault}': {message}")]
    Fetch {
        /// Kind of object being fetched when the call failed
        kind: ObjectKind,
        /// Object name within the vault
        name: String,
        /// Vault the object was requested from
        vault: String,
        /// Error message from the provider call
        message: String,
    },

    /// Returned certificate bytes did not parse as X.509.
    #[error("failed to parse certificate '{name}': {message}")]
    InvalidCertificate {
        /// Certificate object name
        name: String,
        /// Parser error message
        message: String,
    },

    /// A key bundle could not be composed into usable private-key text.
    #[error("failed to compose private key for '{name}': {message}")]
    KeyMaterial {
        /// Key object name
        name: String,
        /// Reason the bundle was unusable
        message: String,
    },
}

/// The type of object a [`SecretDescriptor`] points at.
///
/// Parsing is case-insensitive and infallible: any unrecognized or empty tag
/// maps to [`ObjectType::Secret`], the named fallback. Dispatch sites match
/// exhaustively, so adding a variant forces a review of every branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    /// An X.509 certificate paired with its key object
    Certificate,
    /// A plain stored value; also the fallback for unrecognized tags
    #[default]
    Secret,
}

impl ObjectType {
    /// Parse an object-type tag, case-insensitively.
    ///
    /// Unrecognized tags fall back to [`ObjectType::Secret`].
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "certificate" => Self::Certificate,
            _ => Self::Secret,
        }
    }

    /// The canonical lowercase tag for this object type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::Secret => "secret",
        }
    }
}

impl From<&str> for ObjectType {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<String> for ObjectType {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<ObjectType> for String {
    fn from(object_type: ObjectType) -> Self {
        object_type.as_str().to_string()
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a single object stored in a vault.
///
/// Immutable once constructed; a resolver turns it into concrete secret
/// material with one or more provider calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretDescriptor {
    /// Vault instance name; the vault's network endpoint is derived from it
    pub vault_name: String,

    /// Object name within the vault
    pub object_name: String,

    /// Object type; defaults to [`ObjectType::Secret`] when unspecified
    #[serde(default)]
    pub object_type: ObjectType,
}

impl SecretDescriptor {
    /// Create a new descriptor from a vault name, object name and type tag.
    #[must_use]
    pub fn new(
        vault_name: impl Into<String>,
        object_name: impl Into<String>,
        object_type: impl Into<ObjectType>,
    ) -> Self {
        Self {
            vault_name: vault_name.into(),
            object_name: object_name.into(),
            object_type: object_type.into(),
        }
    }

    /// Create a descriptor for a generic secret object.
    #[must_use]
    pub fn secret(vault_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self::new(vault_name, object_name, ObjectType::Secret)
    }

    /// Create a descriptor for a certificate object.
    #[must_use]
    pub fn certificate(vault_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self::new(vault_name, object_name, ObjectType::Certificate)
    }
}

/// Trait for resolving secret descriptors against a vault provider.
///
/// Implementors must provide:
/// - [`resolve`](SecretResolver::resolve) - descriptor to payload resolution
/// - [`provider_name`](SecretResolver::provider_name) - provider identifier
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Resolve a descriptor into a single string payload.
    ///
    /// For certificate descriptors the payload is private-key PEM and
    /// certificate PEM joined by a single newline, private key first.
    ///
    /// # Errors
    /// Returns a [`SecretError`] naming the failing step; resolution is
    /// single-attempt and never returns a partial value.
    async fn resolve(&self, descriptor: &SecretDescriptor) -> Result<String, SecretError>;

    /// Get the provider name for this resolver.
    ///
    /// Examples: `"azurekeyvault"`, `"env"`
    fn provider_name(&self) -> &'static str;

    /// Resolve a descriptor returning a secure value.
    ///
    /// The returned [`SecureSecret`] will automatically zero its memory on
    /// drop.
    ///
    /// # Errors
    /// Propagates the error from [`resolve`](SecretResolver::resolve).
    async fn resolve_secure(
        &self,
        descriptor: &SecretDescriptor,
    ) -> Result<SecureSecret, SecretError> {
        let value = self.resolve(descriptor).await?;
        Ok(SecureSecret::new(value))
    }
}
