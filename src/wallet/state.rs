//! ConnectionState - canonical snapshot of the current wallet session.

use serde::{Serialize, Serializer};

use super::handle::WalletHandle;

/// Everything known about a connected wallet.
#[derive(Debug, Clone)]
pub struct Connection {
    pub wallet: WalletHandle,
    /// First address reported by the provider, in its transport encoding.
    pub address: String,
    /// Display form of `address` (bech32), or `address` when it cannot be decoded.
    pub canonical_address: String,
    pub network_id: u8,
    /// Lovelace, as reported by the provider.
    pub balance: String,
}

/// Immutable session snapshot. Replaced wholesale, never edited in place.
///
/// Being an enum, a disconnected state cannot carry stale wallet fields and a
/// connected one always has a wallet and an address.
#[derive(Debug, Clone, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(Connection),
}

impl ConnectionState {
    pub fn disconnected() -> Self { ConnectionState::Disconnected }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    pub fn connection(&self) -> Option<&Connection> {
        match self {
            ConnectionState::Connected(c) => Some(c),
            ConnectionState::Disconnected => None,
        }
    }

    pub fn wallet(&self) -> Option<&WalletHandle> { self.connection().map(|c| &c.wallet) }
    pub fn address(&self) -> Option<&str> { self.connection().map(|c| c.address.as_str()) }
    pub fn canonical_address(&self) -> Option<&str> { self.connection().map(|c| c.canonical_address.as_str()) }
    pub fn network_id(&self) -> Option<u8> { self.connection().map(|c| c.network_id) }
    pub fn balance(&self) -> Option<&str> { self.connection().map(|c| c.balance.as_str()) }
}

impl Serialize for ConnectionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct View<'a> {
            connected: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            wallet: Option<&'a WalletHandle>,
            #[serde(skip_serializing_if = "Option::is_none")]
            address: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            bech32_address: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            network_id: Option<u8>,
            #[serde(skip_serializing_if = "Option::is_none")]
            balance: Option<&'a str>,
        }
        View {
            connected: self.is_connected(),
            wallet: self.wallet(),
            address: self.address(),
            bech32_address: self.canonical_address(),
            network_id: self.network_id(),
            balance: self.balance(),
        }
        .serialize(serializer)
    }
}
