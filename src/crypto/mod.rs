//! Profile sealing: PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM.
//!
//! The envelope is `{encryptedData, iv, salt, version}`. `encryptedData` and
//! `iv` are base64; `salt` is the hex salt string itself, and those hex
//! characters (not the decoded bytes) are what PBKDF2 consumes.
//!
//! These functions are CPU bound (100k rounds). Async callers should run them
//! on `tokio::task::spawn_blocking`, as [`crate::profile::ProfilePipeline`] does.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::Hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AmdtelError, AmdtelResult};
use crate::profile::UserProfile;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Random salt bytes before hex encoding.
pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;
pub const FORMAT_VERSION: &str = "1.0";
/// Hex characters kept from the address digest.
pub const USER_ID_LEN: usize = 16;

/// Sealed profile, the only form that leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedProfile {
    pub encrypted_data: String,
    pub iv: String,
    pub salt: String,
    pub version: String,
}

/// 256-bit AES key, wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ProfileKey([u8; KEY_LEN]);

impl ProfileKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] { &self.0 }
}

impl std::fmt::Debug for ProfileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProfileKey(..)")
    }
}

/// `len` random bytes, hex encoded.
pub fn generate_salt(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// PBKDF2-HMAC-SHA256 over the UTF-8 bytes of `secret` and `salt`.
pub fn derive_key(secret: &str, salt: &str) -> AmdtelResult<ProfileKey> {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(secret.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut key)
        .map_err(|e| AmdtelError::Encryption(format!("key derivation: {e}")))?;
    let derived = ProfileKey(key);
    key.zeroize();
    Ok(derived)
}

/// Seal `profile` under `secret` with a fresh salt and IV.
pub fn encrypt_profile(profile: &UserProfile, secret: &str) -> AmdtelResult<EncryptedProfile> {
    let salt = generate_salt(SALT_LEN);
    let mut iv = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let key = derive_key(secret, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| AmdtelError::Encryption(format!("cipher init: {e}")))?;

    let mut plaintext = serde_json::to_vec(profile)?;
    let sealed = cipher.encrypt(Nonce::from_slice(&iv), plaintext.as_ref());
    plaintext.zeroize();
    let ciphertext = sealed.map_err(|e| AmdtelError::Encryption(format!("aes-gcm: {e}")))?;

    Ok(EncryptedProfile {
        encrypted_data: BASE64.encode(ciphertext),
        iv: BASE64.encode(iv),
        salt,
        version: FORMAT_VERSION.to_string(),
    })
}

/// Open a sealed profile. Any authentication or format failure is a
/// `Decryption` error; no partial plaintext is ever returned.
pub fn decrypt_profile(sealed: &EncryptedProfile, secret: &str) -> AmdtelResult<UserProfile> {
    if sealed.version != FORMAT_VERSION {
        return Err(AmdtelError::Decryption(format!("unsupported format version {:?}", sealed.version)));
    }
    let iv = BASE64
        .decode(&sealed.iv)
        .map_err(|e| AmdtelError::Decryption(format!("iv base64: {e}")))?;
    if iv.len() != NONCE_LEN {
        return Err(AmdtelError::Decryption(format!("iv must be {NONCE_LEN} bytes, got {}", iv.len())));
    }
    let ciphertext = BASE64
        .decode(&sealed.encrypted_data)
        .map_err(|e| AmdtelError::Decryption(format!("ciphertext base64: {e}")))?;

    let key = derive_key(secret, &sealed.salt)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| AmdtelError::Decryption(format!("cipher init: {e}")))?;
    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
        .map_err(|_| AmdtelError::Decryption("authentication failed".into()))?;

    let parsed = serde_json::from_slice(&plaintext)
        .map_err(|e| AmdtelError::Decryption(format!("profile record: {e}")));
    plaintext.zeroize();
    parsed
}

/// First 16 hex chars of SHA-256(address). 64 bits: stable per address, but
/// collisions across the address space are possible.
pub fn generate_user_id(wallet_address: &str) -> String {
    let digest = Sha256::digest(wallet_address.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(USER_ID_LEN);
    id
}
