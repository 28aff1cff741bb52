//! Collaborator interfaces for key material. Signing, key storage and
//! transaction encoding live outside this crate; these traits are the only
//! surface the messenger stack consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AstraError, Result};

/// Account exposed by a wallet or extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Locally held signing identities.
#[async_trait]
pub trait Keyring: Send + Sync {
    /// Addresses this keyring can sign for.
    fn accounts(&self) -> Vec<String>;

    /// Sign `transaction` (a JSON transaction object whose `from` is one of
    /// [`Keyring::accounts`]) and return the encoded raw transaction as hex.
    async fn sign(&self, transaction: &Value) -> Result<String>;

    fn holds(&self, address: &str) -> bool {
        self.accounts()
            .iter()
            .any(|a| a.eq_ignore_ascii_case(address))
    }
}

/// Account session of an injected wallet extension.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn get_account(&self) -> Result<Identity>;

    async fn forget_identity(&self) -> Result<()>;
}

/// Keyring with no identities. Used where no local key material is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyKeyring;

#[async_trait]
impl Keyring for EmptyKeyring {
    fn accounts(&self) -> Vec<String> {
        Vec::new()
    }

    async fn sign(&self, transaction: &Value) -> Result<String> {
        Err(AstraError::IdentityNotFound(
            transaction
                .get("from")
                .and_then(Value::as_str)
                .map(str::to_string),
        ))
    }
}
