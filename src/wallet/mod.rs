//! Wallet module - provider negotiation and the connection state machine
//!
//! # Architecture
//!
//! ```text
//! ProviderRegistry (host-injected WalletApi objects, discovery order)
//!     │
//!     │ first provider exposing `enable`
//!     ▼
//! WalletSession::connect ── enable() ──► EnableOutcome (ack | per-session API)
//!     │
//!     ▼
//! WalletHandle::negotiate    each operation bound once: provider or typed default
//!     │
//!     ├── used → unused → listed addresses (first non-empty wins)
//!     ├── network id (default 1), balance (default "0")
//!     └── address::to_canonical_form
//!     │
//!     ▼
//! ConnectionState::Connected ──► SessionStore ──► subscribers
//!                            └─► EventBus     ──► wallet-connected
//! ```
//!
//! # Handle defaults
//!
//! | Operation | Missing from provider |
//! |-----------|-----------------------|
//! | `enable`, `isEnabled` | injected object, else `WalletCapability` |
//! | `getNetworkId` | `1` |
//! | `getBalance` | `"0"` |
//! | `getUsedAddresses` | `getAddresses`, else `[]` |
//! | `getUnusedAddresses`, `getRewardAddresses` | `[]` |
//! | `getChangeAddress` | `""` |
//! | `signTx`, `signData`, `submitTx` | `WalletCapability` |

mod format;
mod handle;
mod provider;
mod session;
mod state;

pub use format::{format_balance, network_label};
pub use handle::{session_api, WalletHandle, DEFAULT_BALANCE, DEFAULT_NETWORK_ID, DEFAULT_VERSION};
pub use provider::{AddressEntry, Capability, EnableOutcome, ProviderError, ProviderRegistry, ProviderResult, WalletApi};
pub use session::{SessionPhase, WalletSession};
pub use state::{Connection, ConnectionState};
