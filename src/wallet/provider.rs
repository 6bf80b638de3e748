//! Provider capability interface - what an injected wallet object may expose.
//!
//! Every operation is optional. Implementors override the methods they support
//! and list them in [`WalletApi::capabilities`]; the defaults reject with
//! [`ProviderError::Unsupported`]. Nothing outside [`super::handle`] asks a
//! provider what it supports.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0} not supported")]
    Unsupported(Capability),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Failed(String),
}

/// One optional provider method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Enable,
    IsEnabled,
    GetNetworkId,
    GetBalance,
    GetUsedAddresses,
    GetUnusedAddresses,
    GetAddresses,
    GetChangeAddress,
    GetRewardAddresses,
    SignTx,
    SignData,
    SubmitTx,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Enable => "enable",
            Capability::IsEnabled => "isEnabled",
            Capability::GetNetworkId => "getNetworkId",
            Capability::GetBalance => "getBalance",
            Capability::GetUsedAddresses => "getUsedAddresses",
            Capability::GetUnusedAddresses => "getUnusedAddresses",
            Capability::GetAddresses => "getAddresses",
            Capability::GetChangeAddress => "getChangeAddress",
            Capability::GetRewardAddresses => "getRewardAddresses",
            Capability::SignTx => "signTx",
            Capability::SignData => "signData",
            Capability::SubmitTx => "submitTx",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry returned by `getAddresses` on Lace-style providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub address: String,
}

/// What `enable()` handed back.
#[derive(Clone)]
pub enum EnableOutcome {
    /// Plain acknowledgement; the provider object itself serves the session.
    Acknowledged,
    /// A dedicated per-session API object.
    Api(Arc<dyn WalletApi>),
}

impl fmt::Debug for EnableOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnableOutcome::Acknowledged => f.write_str("Acknowledged"),
            EnableOutcome::Api(_) => f.write_str("Api(..)"),
        }
    }
}

fn unsupported<T>(capability: Capability) -> ProviderResult<T> {
    Err(ProviderError::Unsupported(capability))
}

/// Wallet provider surface, both for the injected object and the per-session API.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Methods this object actually implements.
    fn capabilities(&self) -> &[Capability];

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn icon(&self) -> Option<String> { None }
    fn version(&self) -> Option<String> { None }

    async fn enable(&self) -> ProviderResult<EnableOutcome> { unsupported(Capability::Enable) }
    async fn is_enabled(&self) -> ProviderResult<bool> { unsupported(Capability::IsEnabled) }
    async fn get_network_id(&self) -> ProviderResult<u8> { unsupported(Capability::GetNetworkId) }
    async fn get_balance(&self) -> ProviderResult<String> { unsupported(Capability::GetBalance) }
    async fn get_used_addresses(&self) -> ProviderResult<Vec<String>> { unsupported(Capability::GetUsedAddresses) }
    async fn get_unused_addresses(&self) -> ProviderResult<Vec<String>> { unsupported(Capability::GetUnusedAddresses) }
    async fn get_addresses(&self) -> ProviderResult<Vec<AddressEntry>> { unsupported(Capability::GetAddresses) }
    async fn get_change_address(&self) -> ProviderResult<String> { unsupported(Capability::GetChangeAddress) }
    async fn get_reward_addresses(&self) -> ProviderResult<Vec<String>> { unsupported(Capability::GetRewardAddresses) }
    async fn sign_tx(&self, _tx: &str, _partial_sign: bool) -> ProviderResult<String> { unsupported(Capability::SignTx) }
    async fn sign_data(&self, _address: &str, _payload: &str) -> ProviderResult<String> { unsupported(Capability::SignData) }
    async fn submit_tx(&self, _tx: &str) -> ProviderResult<String> { unsupported(Capability::SubmitTx) }
}

/// Providers injected into the host environment, in the order the host lists them.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<(String, Arc<dyn WalletApi>)>,
}

impl ProviderRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn with_provider(mut self, name: impl Into<String>, provider: Arc<dyn WalletApi>) -> Self {
        self.register(name, provider);
        self
    }

    /// Re-registering a name replaces the provider but keeps its position.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn WalletApi>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = provider,
            None => self.entries.push((name, provider)),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Providers that can be enabled, first-available first.
    pub fn enableable(&self) -> impl Iterator<Item = (&str, &Arc<dyn WalletApi>)> {
        self.entries
            .iter()
            .filter(|(_, p)| p.supports(Capability::Enable))
            .map(|(n, p)| (n.as_str(), p))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn len(&self) -> usize { self.entries.len() }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.names()).finish()
    }
}
