//! IPFS HTTP API client (`/api/v0/add`, `/api/v0/cat`, `/api/v0/pin/add`).

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{ContentId, ContentStore, ContentStream};
use crate::config::ContentStoreConfig;
use crate::error::{AmdtelError, AmdtelResult};

const API_KEY_HEADER: &str = "X-API-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

pub struct IpfsHttpStore {
    client: Client,
    config: ContentStoreConfig,
}

impl IpfsHttpStore {
    pub fn new(config: ContentStoreConfig) -> AmdtelResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AmdtelError::Config(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(base: &str, path: &str) -> String {
        format!("{}/api/v0/{}", base.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn pin(&self, service: &str, id: &ContentId) -> AmdtelResult<()> {
        let request = self.client.post(Self::endpoint(service, "pin/add")).query(&[("arg", id.as_str())]);
        let response = self.authorized(request).send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(AmdtelError::ContentStore(format!("pin {id}: HTTP {}", response.status())));
        }
        tracing::info!(cid = %id, service, "content pinned");
        Ok(())
    }
}

#[async_trait]
impl ContentStore for IpfsHttpStore {
    async fn add(&self, bytes: Vec<u8>) -> AmdtelResult<ContentId> {
        let size = bytes.len();
        let form = Form::new().part("file", Part::bytes(bytes).file_name("profile.json"));
        let request = self.client.post(Self::endpoint(&self.config.gateway, "add")).multipart(form);
        let response = self.authorized(request).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmdtelError::ContentStore(format!("add: HTTP {status}: {body}")));
        }
        let added: AddResponse = response.json().await.map_err(transport)?;
        let id = ContentId::new(added.hash);
        tracing::debug!(cid = %id, size, gateway = %self.config.gateway, "content added");

        // The blob already lives on the node; a pin failure must not lose its id.
        if let Some(service) = &self.config.pinning_service {
            if let Err(e) = self.pin(service, &id).await {
                tracing::warn!(cid = %id, service = %service, error = %e, "content added but not pinned");
            }
        }
        Ok(id)
    }

    async fn fetch(&self, id: &ContentId) -> AmdtelResult<ContentStream> {
        let request = self.client.post(Self::endpoint(&self.config.gateway, "cat")).query(&[("arg", id.as_str())]);
        let response = self.authorized(request).send().await.map_err(transport)?;
        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(AmdtelError::NotFound(id.clone())),
            s => return Err(AmdtelError::ContentStore(format!("cat {id}: HTTP {s}"))),
        }
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(transport));
        Ok(stream.boxed())
    }

    fn backend(&self) -> &'static str { "ipfs" }
}

fn transport(e: reqwest::Error) -> AmdtelError {
    AmdtelError::ContentStore(e.to_string())
}
