//! Amdtel: wallet login sessions and wallet-encrypted profiles on content-addressed storage.
//!
//! # Architecture
//!
//! ```text
//! ProviderRegistry ──► WalletSession ──► SessionStore ──► subscribers (sync, in order)
//!                          │   │               │
//!                          │   └── address::to_canonical_form
//!                          ▼                   ▼
//!                       EventBus ◄──────── ProfilePipeline
//!                          │                   │
//!                          ▼                   ├── crypto (PBKDF2 + AES-256-GCM)
//!              wallet-connected                └── ContentStore (memory | fs | ipfs)
//!              wallet-connect-failed
//!              wallet-disconnected
//!              profile-saved
//! ```
//!
//! # Features
//!
//! - `ipfs` (default) - IPFS HTTP API content store
//!
//! # Usage
//!
//! ```ignore
//! use amdtel::{EventBus, MemoryContentStore, ProfileDraft, ProfilePipeline, ProviderRegistry, SessionStore, WalletSession};
//! use std::sync::Arc;
//!
//! let store = SessionStore::new();
//! let events = EventBus::new();
//! let session = WalletSession::new(Some(ProviderRegistry::new().with_provider("nami", nami)), store.clone(), events.clone());
//! let state = session.connect().await?;
//!
//! let pipeline = ProfilePipeline::new(Arc::new(MemoryContentStore::new()), events);
//! let saved = pipeline.save_profile(&state, ProfileDraft::new().with_username("bob")).await?;
//! let profile = pipeline.load_profile(&saved.content_id, state.address().unwrap_or_default()).await?;
//! ```

pub mod address;
pub mod config;
pub mod content;
pub mod crypto;
pub mod error;
pub mod events;
pub mod logging;
pub mod profile;
pub mod session;
pub mod wallet;

pub use address::{is_valid_address, to_canonical_form, try_canonical_form};
pub use config::{AmdtelConfig, ContentBackend, ContentStoreConfig};
pub use content::{read_all, ContentId, ContentStore, FsContentStore, MemoryContentStore};
#[cfg(feature = "ipfs")]
pub use content::IpfsHttpStore;
pub use crypto::{decrypt_profile, derive_key, encrypt_profile, generate_user_id, EncryptedProfile};
pub use error::{AmdtelError, AmdtelResult};
pub use events::{EventBus, SessionEvent};
pub use profile::{ProfileDraft, ProfilePipeline, SavedProfile, UserProfile};
pub use session::{SessionStore, Subscription};
pub use wallet::{
    Capability, ConnectionState, EnableOutcome, ProviderError, ProviderRegistry, SessionPhase, WalletApi,
    WalletHandle, WalletSession,
};
