//! Image sources: a user upload or Stability AI text-to-image.

use async_trait::async_trait;
use axum::extract::multipart::{Multipart, MultipartError};
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

const CFG_SCALE: u32 = 7;
const SAMPLES: u32 = 1;
const STEPS: u32 = 30;
const GENERATED_FILE_NAME: &str = "image.png";
const UPLOAD_FILE_NAME: &str = "upload";
pub const UPLOAD_FIELD: &str = "file";

/// Image bytes plus what the pinner needs to label them.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl ImagePayload {
    /// `data:<type>;base64,...` for display.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, B64.encode(&self.bytes))
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn square(edge: u32) -> Self {
        Self {
            width: edge,
            height: edge,
        }
    }
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// One blocking request, exactly one artifact expected.
    async fn generate(&self, prompt: &str, size: ImageSize) -> Result<ImagePayload, crate::Error>;
}

// --- Stability REST API types ---

#[derive(Serialize)]
struct TextToImageRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: u32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
}

#[derive(Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: u32,
}

#[derive(Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Deserialize)]
struct Artifact {
    base64: String,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Stability AI client.
pub struct HttpImageSource {
    http: reqwest::Client,
    api_url: String,
    engine: String,
    api_key: Option<String>,
}

impl HttpImageSource {
    pub fn new(
        api_url: &str,
        engine: &str,
        api_key: Option<String>,
    ) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| crate::Error::Config(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            engine: engine.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/generation/{}/text-to-image",
            self.api_url, self.engine
        )
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn generate(&self, prompt: &str, size: ImageSize) -> Result<ImagePayload, crate::Error> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| crate::Error::Generation("generation API key not configured".into()))?;

        let body = TextToImageRequest {
            text_prompts: [TextPrompt {
                text: prompt,
                weight: 1,
            }],
            cfg_scale: CFG_SCALE,
            height: size.height,
            width: size.width,
            samples: SAMPLES,
            steps: STEPS,
        };

        debug!(
            engine = %self.engine,
            width = size.width,
            height = size.height,
            "Requesting generation"
        );
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| crate::Error::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!(status = %status, message = %message, "Generation API error");
            return Err(crate::Error::Generation(message));
        }

        let parsed: TextToImageResponse = response
            .json()
            .await
            .map_err(|e| crate::Error::Generation(format!("parse error: {e}")))?;
        decode_artifact(parsed)
    }
}

fn decode_artifact(response: TextToImageResponse) -> Result<ImagePayload, crate::Error> {
    let artifact = response
        .artifacts
        .into_iter()
        .next()
        .ok_or(crate::Error::GenerationEmpty)?;
    if let Some(reason) = artifact.finish_reason.as_deref() {
        if reason != "SUCCESS" {
            warn!(finish_reason = reason, "Generation finished abnormally");
        }
    }
    let bytes = B64
        .decode(artifact.base64.as_bytes())
        .map_err(|e| crate::Error::Generation(format!("invalid base64 artifact: {e}")))?;
    if bytes.is_empty() {
        return Err(crate::Error::GenerationEmpty);
    }
    info!(len = bytes.len(), "Image generated");
    Ok(ImagePayload {
        bytes,
        file_name: GENERATED_FILE_NAME.to_string(),
        content_type: "image/png".to_string(),
    })
}

/// Read the `file` part of a multipart upload. Only the bytes the client sent
/// are used; the client-supplied name is reduced to its final component.
pub async fn read_upload(mut multipart: Multipart) -> Result<ImagePayload, crate::Error> {
    let read_err = |e: MultipartError| crate::Error::FileRead(e.body_text());
    while let Some(field) = multipart.next_field().await.map_err(read_err)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(|n| Path::new(n).file_name())
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UPLOAD_FILE_NAME)
            .to_string();
        let declared = field
            .content_type()
            .filter(|t| t.starts_with("image/"))
            .map(str::to_string);
        let bytes = field.bytes().await.map_err(read_err)?;
        if bytes.is_empty() {
            return Err(crate::Error::FileRead(format!("{file_name} is empty")));
        }
        let content_type = declared.unwrap_or_else(|| content_type_for(&file_name).to_string());
        info!(file_name = %file_name, len = bytes.len(), "Upload received");
        return Ok(ImagePayload {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        });
    }
    Err(crate::Error::FileRead(format!(
        "multipart body has no `{UPLOAD_FIELD}` part"
    )))
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_artifacts_is_generation_empty() {
        let parsed: TextToImageResponse = serde_json::from_str(r#"{"artifacts":[]}"#).unwrap();
        assert!(matches!(decode_artifact(parsed), Err(crate::Error::GenerationEmpty)));

        let parsed: TextToImageResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(decode_artifact(parsed), Err(crate::Error::GenerationEmpty)));
    }

    #[test]
    fn test_first_artifact_decoded() {
        let encoded = B64.encode(b"\x89PNG fake");
        let json = format!(
            r#"{{"artifacts":[{{"base64":"{encoded}","seed":1,"finishReason":"SUCCESS"}}]}}"#
        );
        let parsed: TextToImageResponse = serde_json::from_str(&json).unwrap();
        let payload = decode_artifact(parsed).unwrap();
        assert_eq!(payload.bytes, b"\x89PNG fake");
        assert_eq!(payload.content_type, "image/png");
        assert!(payload.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = TextToImageRequest {
            text_prompts: [TextPrompt {
                text: "a cat",
                weight: 1,
            }],
            cfg_scale: CFG_SCALE,
            height: 1024,
            width: 1024,
            samples: SAMPLES,
            steps: STEPS,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["text_prompts"][0]["text"], "a cat");
        assert_eq!(v["cfg_scale"], 7);
        assert_eq!(v["samples"], 1);
        assert_eq!(v["steps"], 30);
        assert_eq!(v["width"], 1024);
    }

    #[test]
    fn test_content_type_inference() {
        assert_eq!(content_type_for("b.JPG"), "image/jpeg");
        assert_eq!(content_type_for("x.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "image/png");
    }

    #[tokio::test]
    async fn test_generate_without_key_fails_locally() {
        let source =
            HttpImageSource::new("http://127.0.0.1:1", "engine", Some(String::new())).unwrap();
        let err = source.generate("a cat", ImageSize::square(64)).await.unwrap_err();
        assert!(matches!(err, crate::Error::Generation(_)));
    }
}
