//! Vision-LLM decoder backend (Ollama).
//!
//! The learned alternative to the classical rqrr backend: the crop is
//! PNG-encoded, base64'd, and sent to an Ollama vision model with a
//! read-the-code prompt. A sentinel token in the reply marks "no readable
//! code", which maps to the normal miss outcome.

use std::io::Cursor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use qrx_core::defaults::{
    DEFAULT_VISION_MODEL, ENV_VISION_MODEL, OLLAMA_URL, VISION_DECODE_TIMEOUT_SECS,
};
use qrx_core::{Error, PageImage, RegionDecoder, Result};

const DECODE_PROMPT: &str = "This image contains a QR code. Reply with the exact decoded \
     text content of the code and nothing else. If no QR code is present or it cannot be \
     read, reply with exactly NOT_FOUND.";

const NOT_FOUND_TOKEN: &str = "NOT_FOUND";

pub struct OllamaVisionDecoder {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OllamaVisionDecoder {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
            timeout_secs: VISION_DECODE_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables, falling back to the defaults.
    pub fn from_env() -> Self {
        let model =
            std::env::var(ENV_VISION_MODEL).unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string());
        let base_url = std::env::var("OLLAMA_URL").unwrap_or_else(|_| OLLAMA_URL.to_string());
        Self::new(base_url, model)
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    fn encode_png(region: &PageImage) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        region
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| Error::Decode(format!("failed to encode region as PNG: {}", e)))?;
        Ok(buf)
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>, // base64 encoded
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait]
impl RegionDecoder for OllamaVisionDecoder {
    async fn decode(&self, region: &PageImage) -> Result<Option<String>> {
        use base64::Engine;
        let png = Self::encode_png(region)?;
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(png);

        let request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: DECODE_PROMPT.to_string(),
            images: vec![image_b64],
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Decode(format!("vision request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Decode(format!(
                "vision API returned {}: {}",
                status, body
            )));
        }

        let result: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("failed to parse vision response: {}", e)))?;

        let value = result.response.trim();
        if value.is_empty() || value == NOT_FOUND_TOKEN {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama-vision"
    }
}
