//! Scriptable wallet provider shared by the integration tests.
#![allow(dead_code)]

use amdtel::wallet::{AddressEntry, ProviderResult};
use amdtel::{Capability, ConnectionState, EnableOutcome, ProviderError, WalletApi};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every provider call by its CIP-30 name.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

#[derive(Clone, Default)]
pub struct MockWallet {
    caps: Vec<Capability>,
    used: Vec<String>,
    unused: Vec<String>,
    listed: Vec<String>,
    network_id: u8,
    balance: String,
    session_api: Option<Arc<dyn WalletApi>>,
    enable_error: Option<ProviderError>,
    balance_error: Option<ProviderError>,
    enable_delay: Option<Duration>,
    icon: Option<String>,
    pub calls: CallLog,
}

impl MockWallet {
    /// Provider exposing only `enable`.
    pub fn new() -> Self {
        Self { caps: vec![Capability::Enable], ..Default::default() }
    }

    /// Provider with no `enable` at all.
    pub fn inert() -> Self { Self::default() }

    fn with_cap(mut self, cap: Capability) -> Self {
        if !self.caps.contains(&cap) {
            self.caps.push(cap);
        }
        self
    }

    pub fn used(self, addresses: &[&str]) -> Self {
        let mut w = self.with_cap(Capability::GetUsedAddresses);
        w.used = addresses.iter().map(|a| a.to_string()).collect();
        w
    }

    pub fn unused(self, addresses: &[&str]) -> Self {
        let mut w = self.with_cap(Capability::GetUnusedAddresses);
        w.unused = addresses.iter().map(|a| a.to_string()).collect();
        w
    }

    pub fn listed(self, addresses: &[&str]) -> Self {
        let mut w = self.with_cap(Capability::GetAddresses);
        w.listed = addresses.iter().map(|a| a.to_string()).collect();
        w
    }

    pub fn network(self, id: u8) -> Self {
        let mut w = self.with_cap(Capability::GetNetworkId);
        w.network_id = id;
        w
    }

    pub fn balance(self, lovelace: &str) -> Self {
        let mut w = self.with_cap(Capability::GetBalance);
        w.balance = lovelace.to_string();
        w
    }

    pub fn failing_balance(self, error: ProviderError) -> Self {
        let mut w = self.with_cap(Capability::GetBalance);
        w.balance_error = Some(error);
        w
    }

    pub fn rejecting_enable(mut self, error: ProviderError) -> Self {
        self.enable_error = Some(error);
        self
    }

    /// `enable` resolves to a separate per-session API object.
    pub fn enabling_to(mut self, api: Arc<dyn WalletApi>) -> Self {
        self.session_api = Some(api);
        self
    }

    pub fn slow_enable(mut self, delay: Duration) -> Self {
        self.enable_delay = Some(delay);
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn into_api(self) -> Arc<dyn WalletApi> { Arc::new(self) }

    pub fn call_count(&self) -> usize { self.calls.lock().unwrap().len() }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletApi for MockWallet {
    fn capabilities(&self) -> &[Capability] { &self.caps }

    fn icon(&self) -> Option<String> { self.icon.clone() }

    async fn enable(&self) -> ProviderResult<EnableOutcome> {
        self.record("enable");
        if let Some(delay) = self.enable_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = &self.enable_error {
            return Err(e.clone());
        }
        Ok(match &self.session_api {
            Some(api) => EnableOutcome::Api(api.clone()),
            None => EnableOutcome::Acknowledged,
        })
    }

    async fn get_network_id(&self) -> ProviderResult<u8> {
        self.record("getNetworkId");
        Ok(self.network_id)
    }

    async fn get_balance(&self) -> ProviderResult<String> {
        self.record("getBalance");
        match &self.balance_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.balance.clone()),
        }
    }

    async fn get_used_addresses(&self) -> ProviderResult<Vec<String>> {
        self.record("getUsedAddresses");
        Ok(self.used.clone())
    }

    async fn get_unused_addresses(&self) -> ProviderResult<Vec<String>> {
        self.record("getUnusedAddresses");
        Ok(self.unused.clone())
    }

    async fn get_addresses(&self) -> ProviderResult<Vec<AddressEntry>> {
        self.record("getAddresses");
        Ok(self.listed.iter().map(|a| AddressEntry { address: a.clone() }).collect())
    }
}

/// Collects every state a store subscriber sees.
pub fn state_recorder() -> (
    Arc<Mutex<Vec<ConnectionState>>>,
    impl Fn(&ConnectionState) -> anyhow::Result<()> + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |state: &ConnectionState| {
        sink.lock().unwrap().push(state.clone());
        Ok(())
    })
}
