//! WalletHandle - one closed capability set per connected provider.
//!
//! Negotiation runs once at connect time: each operation is bound either to the
//! provider object that implements it or to a typed default. Call sites then
//! match on the bound slot and never probe the provider again.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use super::provider::{Capability, EnableOutcome, WalletApi};
use crate::error::{AmdtelError, AmdtelResult};

pub const DEFAULT_NETWORK_ID: u8 = 1;
pub const DEFAULT_BALANCE: &str = "0";
pub const DEFAULT_VERSION: &str = "1.0.0";

type Bound = Option<Arc<dyn WalletApi>>;

#[derive(Clone)]
struct Bindings {
    enable: Bound,
    is_enabled: Bound,
    network_id: Bound,
    balance: Bound,
    used_addresses: Bound,
    unused_addresses: Bound,
    /// Lace-style `getAddresses`, entries flattened to strings.
    listed_addresses: Bound,
    change_address: Bound,
    reward_addresses: Bound,
    sign_tx: Bound,
    sign_data: Bound,
    submit_tx: Bound,
}

/// Normalized wallet capability set exposed by a connected provider.
///
/// Bound provider objects stay valid only while the provider session is alive;
/// holding a handle does not keep the wallet enabled.
#[derive(Clone)]
pub struct WalletHandle {
    name: String,
    icon: String,
    version: String,
    bindings: Arc<Bindings>,
}

fn bind(api: &Arc<dyn WalletApi>, capability: Capability) -> Bound {
    api.supports(capability).then(|| api.clone())
}

fn first_non_empty(addresses: Vec<String>) -> Option<String> {
    addresses.into_iter().find(|a| !a.is_empty())
}

impl WalletHandle {
    /// Bind every operation against the per-session API, falling back to the
    /// injected object for `enable` and `isEnabled`.
    pub fn negotiate(name: &str, injected: &Arc<dyn WalletApi>, session: &Arc<dyn WalletApi>) -> Self {
        let bindings = Bindings {
            enable: bind(session, Capability::Enable).or_else(|| bind(injected, Capability::Enable)),
            is_enabled: bind(session, Capability::IsEnabled).or_else(|| bind(injected, Capability::IsEnabled)),
            network_id: bind(session, Capability::GetNetworkId),
            balance: bind(session, Capability::GetBalance),
            used_addresses: bind(session, Capability::GetUsedAddresses),
            unused_addresses: bind(session, Capability::GetUnusedAddresses),
            listed_addresses: bind(session, Capability::GetAddresses),
            change_address: bind(session, Capability::GetChangeAddress),
            reward_addresses: bind(session, Capability::GetRewardAddresses),
            sign_tx: bind(session, Capability::SignTx),
            sign_data: bind(session, Capability::SignData),
            submit_tx: bind(session, Capability::SubmitTx),
        };

        let handle = Self {
            name: name.to_string(),
            icon: injected.icon().unwrap_or_default(),
            version: injected.version().unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            bindings: Arc::new(bindings),
        };
        tracing::debug!(wallet = %handle.name, native = ?handle.native_capabilities(), "wallet capabilities negotiated");
        handle
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn icon(&self) -> &str { &self.icon }
    pub fn version(&self) -> &str { &self.version }

    /// Operations backed by the provider rather than a default.
    pub fn native_capabilities(&self) -> Vec<Capability> {
        let b = &self.bindings;
        let mut caps = Vec::new();
        let slots = [
            (Capability::Enable, b.enable.is_some()),
            (Capability::IsEnabled, b.is_enabled.is_some()),
            (Capability::GetNetworkId, b.network_id.is_some()),
            (Capability::GetBalance, b.balance.is_some()),
            (Capability::GetUsedAddresses, b.used_addresses.is_some()),
            (Capability::GetUnusedAddresses, b.unused_addresses.is_some()),
            (Capability::GetAddresses, b.listed_addresses.is_some()),
            (Capability::GetChangeAddress, b.change_address.is_some()),
            (Capability::GetRewardAddresses, b.reward_addresses.is_some()),
            (Capability::SignTx, b.sign_tx.is_some()),
            (Capability::SignData, b.sign_data.is_some()),
            (Capability::SubmitTx, b.submit_tx.is_some()),
        ];
        for (cap, native) in slots {
            if native {
                caps.push(cap);
            }
        }
        caps
    }

    pub async fn enable(&self) -> AmdtelResult<EnableOutcome> {
        match &self.bindings.enable {
            Some(api) => Ok(api.enable().await?),
            None => Err(AmdtelError::WalletCapability { capability: Capability::Enable }),
        }
    }

    pub async fn is_enabled(&self) -> AmdtelResult<bool> {
        match &self.bindings.is_enabled {
            Some(api) => Ok(api.is_enabled().await?),
            None => Err(AmdtelError::WalletCapability { capability: Capability::IsEnabled }),
        }
    }

    pub async fn get_network_id(&self) -> AmdtelResult<u8> {
        match &self.bindings.network_id {
            Some(api) => Ok(api.get_network_id().await?),
            None => Ok(DEFAULT_NETWORK_ID),
        }
    }

    pub async fn get_balance(&self) -> AmdtelResult<String> {
        match &self.bindings.balance {
            Some(api) => Ok(api.get_balance().await?),
            None => Ok(DEFAULT_BALANCE.to_string()),
        }
    }

    /// Used addresses, or the generic address list when the provider has no such call.
    pub async fn get_used_addresses(&self) -> AmdtelResult<Vec<String>> {
        let b = &self.bindings;
        match (&b.used_addresses, &b.listed_addresses) {
            (Some(api), _) => Ok(api.get_used_addresses().await?),
            (None, Some(api)) => Ok(api.get_addresses().await?.into_iter().map(|e| e.address).collect()),
            (None, None) => Ok(Vec::new()),
        }
    }

    /// First address from the first non-empty source: used, then unused, then
    /// the generic list. Errors when the provider has none of the three calls.
    pub async fn first_address(&self) -> AmdtelResult<Option<String>> {
        let b = &self.bindings;
        if b.used_addresses.is_none() && b.unused_addresses.is_none() && b.listed_addresses.is_none() {
            return Err(AmdtelError::WalletCapability { capability: Capability::GetUsedAddresses });
        }
        if let Some(api) = &b.used_addresses {
            if let Some(address) = first_non_empty(api.get_used_addresses().await?) {
                return Ok(Some(address));
            }
        }
        if let Some(api) = &b.unused_addresses {
            if let Some(address) = first_non_empty(api.get_unused_addresses().await?) {
                return Ok(Some(address));
            }
        }
        if let Some(api) = &b.listed_addresses {
            let listed = api.get_addresses().await?.into_iter().map(|e| e.address).collect();
            if let Some(address) = first_non_empty(listed) {
                return Ok(Some(address));
            }
        }
        Ok(None)
    }

    pub async fn get_unused_addresses(&self) -> AmdtelResult<Vec<String>> {
        match &self.bindings.unused_addresses {
            Some(api) => Ok(api.get_unused_addresses().await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_change_address(&self) -> AmdtelResult<String> {
        match &self.bindings.change_address {
            Some(api) => Ok(api.get_change_address().await?),
            None => Ok(String::new()),
        }
    }

    pub async fn get_reward_addresses(&self) -> AmdtelResult<Vec<String>> {
        match &self.bindings.reward_addresses {
            Some(api) => Ok(api.get_reward_addresses().await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn sign_tx(&self, tx: &str, partial_sign: bool) -> AmdtelResult<String> {
        match &self.bindings.sign_tx {
            Some(api) => Ok(api.sign_tx(tx, partial_sign).await?),
            None => Err(AmdtelError::WalletCapability { capability: Capability::SignTx }),
        }
    }

    pub async fn sign_data(&self, address: &str, payload: &str) -> AmdtelResult<String> {
        match &self.bindings.sign_data {
            Some(api) => Ok(api.sign_data(address, payload).await?),
            None => Err(AmdtelError::WalletCapability { capability: Capability::SignData }),
        }
    }

    pub async fn submit_tx(&self, tx: &str) -> AmdtelResult<String> {
        match &self.bindings.submit_tx {
            Some(api) => Ok(api.submit_tx(tx).await?),
            None => Err(AmdtelError::WalletCapability { capability: Capability::SubmitTx }),
        }
    }
}

impl fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletHandle")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("native", &self.native_capabilities())
            .finish()
    }
}

impl Serialize for WalletHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Meta<'a> {
            name: &'a str,
            icon: &'a str,
            version: &'a str,
        }
        Meta { name: &self.name, icon: &self.icon, version: &self.version }.serialize(serializer)
    }
}

/// Per-session API chosen from an enable outcome.
pub fn session_api(injected: &Arc<dyn WalletApi>, outcome: EnableOutcome) -> Arc<dyn WalletApi> {
    match outcome {
        EnableOutcome::Acknowledged => injected.clone(),
        EnableOutcome::Api(api) => api,
    }
}
