//! Azure Key Vault integration for kvsync
//!
//! This crate resolves [`SecretDescriptor`](kvsync_secrets::SecretDescriptor)s
//! against Azure Key Vault:
//! - [`auth`] - bearer-credential acquisition from ambient environment identity
//! - [`client`] - the Key Vault REST client built once per resolution
//! - [`secrets`] - the [`AzureKeyVaultResolver`] implementing the resolution
//!   contract

pub mod auth;
pub mod client;
mod keys;
pub mod secrets;

// Re-export main types for convenience
pub use auth::{AccessToken, Authenticator, EnvironmentAuthenticator, StaticAuthenticator};
pub use client::{KeyVaultClient, VAULT_RESOURCE};
pub use secrets::{AzureKeyVaultConfig, AzureKeyVaultResolver};
