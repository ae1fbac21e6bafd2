//! Content pinning through the Pinata HTTP API.

use async_trait::async_trait;
use mint_scape_types::{Locator, NftMetadata};
use serde::Deserialize;
use tracing::{info, warn};

#[async_trait]
pub trait ContentPinner: Send + Sync {
    async fn pin_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<Locator, crate::Error>;

    async fn pin_json(&self, document: &NftMetadata) -> Result<Locator, crate::Error>;
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Pinata client authenticated by a static key pair.
pub struct PinataClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    secret_key: String,
}

impl PinataClient {
    pub fn new(
        api_url: &str,
        api_key: Option<String>,
        secret_key: Option<String>,
    ) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| crate::Error::Config(format!("HTTP client build failed: {e}")))?;
        let api_key = api_key.unwrap_or_default();
        let secret_key = secret_key.unwrap_or_default();
        if api_key.is_empty() || secret_key.is_empty() {
            warn!("Pinning credentials not configured, pin requests will be rejected");
        }
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            secret_key,
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
    }

    async fn read_locator(response: reqwest::Response) -> Result<Locator, crate::Error> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::Error::Pinning(format!("HTTP {status}: {body}")));
        }
        let parsed: PinResponse = response
            .json()
            .await
            .map_err(|e| crate::Error::Pinning(format!("parse error: {e}")))?;
        locator_from_hash(&parsed.ipfs_hash)
    }
}

#[async_trait]
impl ContentPinner for PinataClient {
    async fn pin_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<Locator, crate::Error> {
        let len = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| crate::Error::Pinning(format!("invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authed(self.http.post(format!("{}/pinning/pinFileToIPFS", self.api_url)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| crate::Error::Pinning(format!("file upload failed: {e}")))?;

        let locator = Self::read_locator(response).await?;
        info!(cid = locator.cid(), len, file_name, "File pinned");
        Ok(locator)
    }

    async fn pin_json(&self, document: &NftMetadata) -> Result<Locator, crate::Error> {
        let response = self
            .authed(self.http.post(format!("{}/pinning/pinJSONToIPFS", self.api_url)))
            .json(document)
            .send()
            .await
            .map_err(|e| crate::Error::Pinning(format!("metadata upload failed: {e}")))?;

        let locator = Self::read_locator(response).await?;
        info!(cid = locator.cid(), name = %document.name, "Metadata pinned");
        Ok(locator)
    }
}

fn locator_from_hash(hash: &str) -> Result<Locator, crate::Error> {
    if hash.trim().is_empty() {
        return Err(crate::Error::Pinning("response carried an empty hash".into()));
    }
    Ok(Locator::new(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin_response() {
        let parsed: PinResponse = serde_json::from_str(
            r#"{"IpfsHash":"QmHash","PinSize":123,"Timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let loc = locator_from_hash(&parsed.ipfs_hash).unwrap();
        assert_eq!(loc.uri(), "ipfs://QmHash");
    }

    #[test]
    fn test_empty_hash_is_pinning_error() {
        assert!(matches!(
            locator_from_hash("  "),
            Err(crate::Error::Pinning(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_pinning_error() {
        let client =
            PinataClient::new("http://127.0.0.1:1", Some("k".into()), Some("s".into())).unwrap();
        let document = mint_scape_types::build_metadata_document(
            &mint_scape_types::MintDetails::default(),
            mint_scape_types::SourceMode::Upload,
            None,
            &Locator::new("QmImage"),
        );
        let err = client.pin_json(&document).await.unwrap_err();
        assert!(matches!(err, crate::Error::Pinning(_)));
    }
}
