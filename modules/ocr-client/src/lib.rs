//! Client for a captcha recognition service: post the challenge image URL,
//! get the solved text back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OcrError>;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Recognition returned no text")]
    Empty,
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        OcrError::Network(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    image_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    text: String,
}

pub struct OcrClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OcrClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Solve one challenge image. Whitespace is stripped; an empty answer
    /// is an error so callers never submit a blank captcha code.
    pub async fn recognize(&self, image_url: &str) -> Result<String> {
        tracing::debug!(image_url, "Recognizing captcha");
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&RecognizeRequest { image_url })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OcrError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: RecognizeResponse = resp.json().await?;
        let text: String = parsed.text.split_whitespace().collect();
        if text.is_empty() {
            return Err(OcrError::Empty);
        }
        tracing::info!(image_url, %text, "Captcha recognized");
        Ok(text)
    }
}
