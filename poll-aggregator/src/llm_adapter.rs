use crate::traits::TextGenerator;
use crate::types::{PollError, Result, UpstreamConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// Text generation through the Gemini `generateContent` endpoint.
pub struct GeminiAdapter {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Trimmed text of the first part of the first candidate, if non-empty.
    pub fn first_text(&self) -> Option<String> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .first()?
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}

impl GeminiAdapter {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;

        let base = config.gemini_api_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!(
            "{}/models/{}:generateContent",
            base, config.gemini_model
        ))
        .map_err(|e| PollError::InvalidArgument(format!("gemini api url: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiAdapter {
    fn adapter_name(&self) -> String {
        format!("Gemini ({})", self.model)
    }

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Generation request failed with HTTP {}: {}", status, body);
            return Err(PollError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body.first_text();
        debug!(
            "Generation returned {} characters",
            text.as_ref().map(String::len).unwrap_or(0)
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_api_shape() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn first_text_is_trimmed() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  Question: x?\n1) a\n2) b \n"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.first_text().as_deref(), Some("Question: x?\n1) a\n2) b"));
    }

    #[test]
    fn missing_or_blank_candidates_yield_none() {
        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.first_text(), None);

        let absent: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(absent.first_text(), None);

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#)
                .unwrap();
        assert_eq!(blank.first_text(), None);
    }

    #[test]
    fn endpoint_includes_model() {
        let adapter = GeminiAdapter::new(&UpstreamConfig::default()).unwrap();
        assert!(adapter
            .endpoint
            .as_str()
            .ends_with("/models/gemini-1.5-flash:generateContent"));
    }
}
