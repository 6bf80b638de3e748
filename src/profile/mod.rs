//! Profile records and the save/load pipeline
//!
//! ```text
//! save: ConnectionState.address ─► generate_user_id ─► UserProfile
//!          └─► encrypt_profile(profile, address) ─► JSON ─► ContentStore::add ─► ContentId
//! load: ContentId ─► ContentStore::fetch ─► JSON ─► decrypt_profile(_, address) ─► UserProfile
//! ```
//!
//! The wallet address is the encryption secret. Anyone who knows the address
//! can open the envelope; possession of the address does not grant control of
//! the wallet.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::content::{read_all, ContentId, ContentStore};
use crate::crypto::{decrypt_profile, encrypt_profile, generate_user_id, EncryptedProfile};
use crate::error::{AmdtelError, AmdtelResult};
use crate::events::{EventBus, SessionEvent};
use crate::wallet::ConnectionState;

pub type Preferences = serde_json::Map<String, serde_json::Value>;

/// Plaintext profile. Never leaves the pipeline unencrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// RFC 3339, millisecond precision, UTC.
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

/// User-entered fields for a new profile version. Blank values are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub preferences: Option<Preferences>,
}

impl ProfileDraft {
    pub fn new() -> Self { Self::default() }
    pub fn with_username(mut self, v: impl Into<String>) -> Self { self.username = non_empty(v); self }
    pub fn with_email(mut self, v: impl Into<String>) -> Self { self.email = non_empty(v); self }
    pub fn with_avatar(mut self, v: impl Into<String>) -> Self { self.avatar = non_empty(v); self }
    pub fn with_bio(mut self, v: impl Into<String>) -> Self { self.bio = non_empty(v); self }
    pub fn with_preferences(mut self, p: Preferences) -> Self {
        self.preferences = (!p.is_empty()).then_some(p);
        self
    }

    /// Build the record for `wallet_address`, stamping both timestamps with `now`.
    pub fn into_profile(self, wallet_address: &str, now: &str) -> UserProfile {
        UserProfile {
            id: generate_user_id(wallet_address),
            wallet_address: wallet_address.to_string(),
            username: self.username.and_then(non_empty),
            email: self.email.and_then(non_empty),
            avatar: self.avatar.and_then(non_empty),
            bio: self.bio.and_then(non_empty),
            created_at: now.to_string(),
            updated_at: now.to_string(),
            preferences: self.preferences.filter(|p| !p.is_empty()),
        }
    }
}

fn non_empty(v: impl Into<String>) -> Option<String> {
    let v = v.into();
    (!v.is_empty()).then_some(v)
}

pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Result of a save. The caller persists `content_id` under [`SavedProfile::pointer_key`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProfile {
    pub profile: UserProfile,
    pub content_id: ContentId,
}

impl SavedProfile {
    pub fn pointer_key(&self) -> String { pointer_key(&self.profile.id) }
}

pub fn pointer_key(user_id: &str) -> String {
    format!("amdtel_profile_{user_id}")
}

/// Saves and restores profiles tied to a wallet session.
#[derive(Clone)]
pub struct ProfilePipeline {
    store: Arc<dyn ContentStore>,
    events: EventBus,
}

impl ProfilePipeline {
    pub fn new(store: Arc<dyn ContentStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> { &self.store }

    /// Encrypt a new profile version under the session address and upload it.
    pub async fn save_profile(&self, session: &ConnectionState, draft: ProfileDraft) -> AmdtelResult<SavedProfile> {
        let address = session.address().filter(|a| !a.is_empty()).ok_or(AmdtelError::NoAddress)?;
        self.save_for_address(address, draft).await
    }

    pub async fn save_for_address(&self, address: &str, draft: ProfileDraft) -> AmdtelResult<SavedProfile> {
        if address.is_empty() {
            return Err(AmdtelError::NoAddress);
        }
        let profile = draft.into_profile(address, &timestamp_now());

        let sealed = {
            let profile = profile.clone();
            let secret = address.to_string();
            tokio::task::spawn_blocking(move || encrypt_profile(&profile, &secret))
                .await
                .map_err(|e| AmdtelError::Encryption(format!("crypto task: {e}")))??
        };

        let content_id = self.store.add(serde_json::to_vec(&sealed)?).await?;
        tracing::info!(user_id = %profile.id, cid = %content_id, backend = self.store.backend(), "Profile saved");

        self.events.emit(SessionEvent::ProfileSaved { profile: profile.clone(), content_id: content_id.clone() });
        Ok(SavedProfile { profile, content_id })
    }

    /// Fetch, parse and decrypt. `NotFound` and `Decryption` pass through unchanged.
    pub async fn load_profile(&self, content_id: &ContentId, address: &str) -> AmdtelResult<UserProfile> {
        let bytes = read_all(self.store.fetch(content_id).await?).await?;
        let sealed: EncryptedProfile = serde_json::from_slice(&bytes)
            .map_err(|e| AmdtelError::Decryption(format!("envelope: {e}")))?;

        let secret = address.to_string();
        let profile = tokio::task::spawn_blocking(move || decrypt_profile(&sealed, &secret))
            .await
            .map_err(|e| AmdtelError::Decryption(format!("crypto task: {e}")))??;
        tracing::info!(user_id = %profile.id, cid = %content_id, "Profile loaded");
        Ok(profile)
    }
}

impl std::fmt::Debug for ProfilePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilePipeline").field("backend", &self.store.backend()).finish()
    }
}
