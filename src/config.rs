//! Configuration - passed from higher layers, or read from the environment

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::content::{ContentStore, FsContentStore, MemoryContentStore};
use crate::error::{AmdtelError, AmdtelResult};

pub const DEFAULT_GATEWAY: &str = "https://ipfs.io";

pub const ENV_BACKEND: &str = "AMDTEL_BACKEND";
pub const ENV_ROOT: &str = "AMDTEL_ROOT";
pub const ENV_GATEWAY: &str = "AMDTEL_GATEWAY";
pub const ENV_API_KEY: &str = "AMDTEL_API_KEY";
pub const ENV_PINNING_SERVICE: &str = "AMDTEL_PINNING_SERVICE";

/// Remote content store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStoreConfig {
    pub gateway: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinning_service: Option<String>,
}

impl Default for ContentStoreConfig {
    fn default() -> Self { Self::new(DEFAULT_GATEWAY) }
}

impl ContentStoreConfig {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self { gateway: gateway.into(), api_key: None, pinning_service: None }
    }
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self { self.api_key = Some(key.into()); self }
    pub fn with_pinning_service(mut self, url: impl Into<String>) -> Self { self.pinning_service = Some(url.into()); self }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentBackend {
    Memory,
    #[default]
    Fs,
    Ipfs,
}

impl ContentBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentBackend::Memory => "memory",
            ContentBackend::Fs => "fs",
            ContentBackend::Ipfs => "ipfs",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(ContentBackend::Memory),
            "fs" | "file" | "disk" => Some(ContentBackend::Fs),
            "ipfs" => Some(ContentBackend::Ipfs),
            _ => None,
        }
    }
}

/// Top-level configuration. `app` namespaces on-disk data.
#[derive(Debug, Clone, Default)]
pub struct AmdtelConfig {
    pub app: String,
    pub backend: ContentBackend,
    /// Data root; `{root}/{app}/content` holds filesystem blobs.
    pub root: Option<PathBuf>,
    pub content: ContentStoreConfig,
}

impl AmdtelConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn with_backend(mut self, backend: ContentBackend) -> Self { self.backend = backend; self }
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self { self.root = Some(root.into()); self }
    pub fn with_content(mut self, content: ContentStoreConfig) -> Self { self.content = content; self }

    /// Builder defaults overridden by `AMDTEL_*` variables that are set and non-empty.
    pub fn from_env(app: impl Into<String>) -> AmdtelResult<Self> {
        let mut config = Self::new(app);
        if let Some(value) = env_var(ENV_BACKEND) {
            config.backend = ContentBackend::parse(&value)
                .ok_or_else(|| AmdtelError::Config(format!("{ENV_BACKEND}: unknown backend {value:?}")))?;
        }
        if let Some(root) = env_var(ENV_ROOT) {
            config.root = Some(PathBuf::from(root));
        }
        if let Some(gateway) = env_var(ENV_GATEWAY) {
            config.content.gateway = gateway;
        }
        config.content.api_key = env_var(ENV_API_KEY);
        config.content.pinning_service = env_var(ENV_PINNING_SERVICE);
        Ok(config)
    }

    /// `{root}/{app}/content`, with the platform data dir as the default root.
    pub fn content_dir(&self) -> PathBuf {
        let root = self
            .root
            .clone()
            .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")));
        root.join(&self.app).join("content")
    }

    pub fn open_content_store(&self) -> AmdtelResult<Arc<dyn ContentStore>> {
        tracing::debug!(backend = self.backend.as_str(), "opening content store");
        match self.backend {
            ContentBackend::Memory => Ok(Arc::new(MemoryContentStore::new())),
            ContentBackend::Fs => Ok(Arc::new(FsContentStore::new(self.content_dir()))),
            #[cfg(feature = "ipfs")]
            ContentBackend::Ipfs => Ok(Arc::new(crate::content::IpfsHttpStore::new(self.content.clone())?)),
            #[cfg(not(feature = "ipfs"))]
            ContentBackend::Ipfs => Err(AmdtelError::Config("built without the `ipfs` feature".into())),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_config_defaults_to_public_gateway() {
        let config = ContentStoreConfig::default();
        assert_eq!(config.gateway, "https://ipfs.io");
        assert_eq!(serde_json::to_value(&config).unwrap(), serde_json::json!({"gateway": "https://ipfs.io"}));
    }

    #[test]
    fn content_config_reads_camel_case() {
        let config: ContentStoreConfig =
            serde_json::from_str(r#"{"gateway":"http://localhost:5001","apiKey":"k","pinningService":"https://pin"}"#)
                .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.pinning_service.as_deref(), Some("https://pin"));
    }

    #[test]
    fn backend_names() {
        assert_eq!(ContentBackend::parse("IPFS"), Some(ContentBackend::Ipfs));
        assert_eq!(ContentBackend::parse("disk"), Some(ContentBackend::Fs));
        assert_eq!(ContentBackend::parse("s3"), None);
        assert_eq!(ContentBackend::default().as_str(), "fs");
    }

    #[test]
    fn content_dir_nests_app() {
        let config = AmdtelConfig::new("demo").with_root("/tmp/amdtel");
        assert_eq!(config.content_dir(), PathBuf::from("/tmp/amdtel/demo/content"));
    }
}
