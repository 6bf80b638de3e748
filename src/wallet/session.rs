//! WalletSession - Disconnected -> Connecting -> {Connected | Disconnected(error)}
//!
//! One session drives one [`SessionStore`]. Only complete states reach the
//! store; a failed connect publishes nothing and emits `wallet-connect-failed`.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use super::handle::{session_api, WalletHandle};
use super::provider::{ProviderRegistry, WalletApi};
use super::state::{Connection, ConnectionState};
use crate::address::to_canonical_form;
use crate::error::{AmdtelError, AmdtelResult};
use crate::events::{EventBus, SessionEvent};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
}

pub struct WalletSession {
    /// `None` when the host exposes no provider mapping at all.
    providers: Option<ProviderRegistry>,
    store: SessionStore,
    events: EventBus,
    phase: Mutex<SessionPhase>,
}

impl WalletSession {
    pub fn new(providers: Option<ProviderRegistry>, store: SessionStore, events: EventBus) -> Self {
        let phase = if store.get_wallet_state().is_connected() {
            SessionPhase::Connected
        } else {
            SessionPhase::Disconnected
        };
        Self { providers, store, events, phase: Mutex::new(phase) }
    }

    /// Session over `providers` with a private store and event bus.
    pub fn with_providers(providers: ProviderRegistry) -> Self {
        Self::new(Some(providers), SessionStore::new(), EventBus::new())
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> &SessionStore { &self.store }
    pub fn events(&self) -> &EventBus { &self.events }

    pub fn state(&self) -> ConnectionState {
        self.store.get_wallet_state()
    }

    /// Names of providers that can be enabled, in discovery order.
    pub fn available_wallets(&self) -> Vec<String> {
        match &self.providers {
            Some(registry) => registry.enableable().map(|(name, _)| name.to_string()).collect(),
            None => Vec::new(),
        }
    }

    /// Enable the first available provider and publish the resulting state.
    ///
    /// Fails with `ConnectInProgress` while another connect on this session is
    /// still running.
    pub async fn connect(&self) -> AmdtelResult<ConnectionState> {
        let guard = ConnectingGuard::enter(&self.phase)?;
        let owned_connection = guard.previous == SessionPhase::Connected;

        match self.negotiate().await {
            Ok(connection) => {
                let state = ConnectionState::Connected(connection);
                self.store.set_wallet_state(state.clone());
                guard.finish(SessionPhase::Connected);
                if let Some(c) = state.connection() {
                    tracing::info!(wallet = %c.wallet.name(), network_id = c.network_id, "Wallet connected");
                }
                self.events.emit(SessionEvent::WalletConnected { state: state.clone() });
                Ok(state)
            }
            Err(e) => {
                guard.finish(SessionPhase::Disconnected);
                tracing::warn!(error = %e, "Wallet connection failed");
                self.events.emit(SessionEvent::WalletConnectFailed { error: e.to_string() });
                // The store is shared; only a connection this session made is dropped.
                if owned_connection {
                    self.disconnect();
                }
                Err(e)
            }
        }
    }

    /// Local bookkeeping only; the provider is not asked to revoke anything.
    pub fn disconnect(&self) -> ConnectionState {
        let state = ConnectionState::Disconnected;
        self.store.set_wallet_state(state.clone());
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = SessionPhase::Disconnected;
        tracing::info!("Wallet disconnected");
        self.events.emit(SessionEvent::WalletDisconnected);
        state
    }

    async fn negotiate(&self) -> AmdtelResult<Connection> {
        let registry = self.providers.as_ref().ok_or(AmdtelError::NoWalletProvider)?;
        let (name, injected): (String, Arc<dyn WalletApi>) = registry
            .enableable()
            .next()
            .map(|(name, api)| (name.to_string(), api.clone()))
            .ok_or(AmdtelError::NoWalletProvider)?;

        tracing::debug!(wallet = %name, "Enabling wallet");
        let outcome = injected.enable().await.map_err(|e| wrap(e.into()))?;
        let api = session_api(&injected, outcome);
        let wallet = WalletHandle::negotiate(&name, &injected, &api);

        read_connection(wallet).await.map_err(wrap)
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("providers", &self.providers)
            .field("phase", &self.phase())
            .finish()
    }
}

/// Sequential reads; the first failure aborts the whole connect.
async fn read_connection(wallet: WalletHandle) -> AmdtelResult<Connection> {
    let address = wallet
        .first_address()
        .await?
        .ok_or_else(|| AmdtelError::WalletProvider("wallet returned no addresses".into()))?;
    let network_id = wallet.get_network_id().await?;
    let balance = wallet.get_balance().await?;
    let canonical_address = to_canonical_form(&address);

    Ok(Connection { wallet, address, canonical_address, network_id, balance })
}

/// Capability gaps surface as they are; everything else gets the connect cause.
fn wrap(e: AmdtelError) -> AmdtelError {
    match e {
        AmdtelError::WalletCapability { .. } | AmdtelError::ConnectFailed { .. } => e,
        other => AmdtelError::ConnectFailed { cause: other.to_string() },
    }
}

/// Holds the phase at `Connecting`; resets to `Disconnected` if the connect
/// future is dropped before it finishes.
struct ConnectingGuard<'a> {
    phase: &'a Mutex<SessionPhase>,
    previous: SessionPhase,
    done: bool,
}

impl<'a> ConnectingGuard<'a> {
    fn enter(phase: &'a Mutex<SessionPhase>) -> AmdtelResult<Self> {
        let mut current = phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == SessionPhase::Connecting {
            return Err(AmdtelError::ConnectInProgress);
        }
        let previous = std::mem::replace(&mut *current, SessionPhase::Connecting);
        Ok(Self { phase, previous, done: false })
    }

    fn finish(mut self, next: SessionPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
        self.done = true;
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = SessionPhase::Disconnected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::provider::{Capability, EnableOutcome, ProviderError, ProviderResult};
    use async_trait::async_trait;

    struct Nami {
        addresses: Vec<String>,
    }

    #[async_trait]
    impl WalletApi for Nami {
        fn capabilities(&self) -> &[Capability] {
            &[Capability::Enable, Capability::GetUsedAddresses, Capability::GetNetworkId]
        }
        async fn enable(&self) -> ProviderResult<EnableOutcome> { Ok(EnableOutcome::Acknowledged) }
        async fn get_used_addresses(&self) -> ProviderResult<Vec<String>> { Ok(self.addresses.clone()) }
        async fn get_network_id(&self) -> ProviderResult<u8> { Ok(0) }
    }

    struct Refuses;

    #[async_trait]
    impl WalletApi for Refuses {
        fn capabilities(&self) -> &[Capability] { &[Capability::Enable] }
        async fn enable(&self) -> ProviderResult<EnableOutcome> {
            Err(ProviderError::Rejected("user declined".into()))
        }
    }

    /// Enables once, refuses afterwards.
    struct OneShot {
        enabled: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl WalletApi for OneShot {
        fn capabilities(&self) -> &[Capability] { &[Capability::Enable, Capability::GetUsedAddresses] }
        async fn enable(&self) -> ProviderResult<EnableOutcome> {
            if self.enabled.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(ProviderError::Rejected("session revoked".into()));
            }
            Ok(EnableOutcome::Acknowledged)
        }
        async fn get_used_addresses(&self) -> ProviderResult<Vec<String>> { Ok(vec!["A1".into()]) }
    }

    fn session_with(name: &str, api: impl WalletApi + 'static) -> WalletSession {
        WalletSession::with_providers(ProviderRegistry::new().with_provider(name, Arc::new(api)))
    }

    #[tokio::test]
    async fn connect_publishes_complete_state() {
        let session = session_with("nami", Nami { addresses: vec!["A1".into()] });
        let state = session.connect().await.unwrap();

        assert_eq!(session.phase(), SessionPhase::Connected);
        assert_eq!(state.address(), Some("A1"));
        assert_eq!(state.network_id(), Some(0));
        assert_eq!(state.balance(), Some("0"));
        assert_eq!(session.state().address(), Some("A1"));
    }

    #[tokio::test]
    async fn rejected_enable_is_wrapped_and_discarded() {
        let session = session_with("flint", Refuses);
        let err = session.connect().await.unwrap_err();

        assert!(matches!(err, AmdtelError::ConnectFailed { .. }));
        assert!(err.to_string().contains("user declined"));
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert!(!session.state().is_connected());
    }

    #[tokio::test]
    async fn empty_wallet_fails_to_connect() {
        let session = session_with("nami", Nami { addresses: vec![] });
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, AmdtelError::ConnectFailed { .. }));
        assert!(!session.state().is_connected());
    }

    #[tokio::test]
    async fn failed_reconnect_drops_own_connection() {
        let session = session_with("nami", OneShot { enabled: Default::default() });
        let mut rx = session.events().subscribe();
        session.connect().await.unwrap();
        assert!(session.connect().await.is_err());

        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert!(!session.state().is_connected());
        let names: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.name()).collect();
        assert_eq!(names, vec!["wallet-connected", "wallet-connect-failed", "wallet-disconnected"]);
    }

    #[test]
    fn no_environment_means_no_wallets() {
        let session = WalletSession::new(None, SessionStore::new(), EventBus::new());
        assert!(session.available_wallets().is_empty());
        assert_eq!(session.phase(), SessionPhase::Disconnected);
    }

    #[test]
    fn guard_resets_phase_when_dropped() {
        let phase = Mutex::new(SessionPhase::Disconnected);
        {
            let _guard = ConnectingGuard::enter(&phase).unwrap();
            assert!(matches!(ConnectingGuard::enter(&phase), Err(AmdtelError::ConnectInProgress)));
        }
        assert_eq!(*phase.lock().unwrap(), SessionPhase::Disconnected);
    }
}
