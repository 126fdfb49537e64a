use crate::error::GenerateError;
use crate::models::{GenerateRequest, GenerationResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, error};

const GEMINI_MODEL: &str = "gemini-1.5-flash";
const TEMPERATURE: f64 = 0.8;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Resolve the Gemini API base URL, overridable for tests and proxies.
pub fn api_base_from_env() -> String {
    std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
}

/// One-shot client for the Gemini `generateContent` endpoint, configured with
/// the credential supplied for the current submission.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self { client, api_key, base_url }
    }

    /// Prompt string embedding the five content fields verbatim, asking the
    /// model for a JSON reply with the five named chapter fields.
    pub fn build_chapter_prompt(req: &GenerateRequest) -> String {
        format!(
            r#"You are a professional book author.

Write a chapter using the following structured inputs:

Book Name: {book_name}
Chapter Title: {chapter_title}
Narrative Style: {narrative_style}
Chapter Sequence: {sequence}
Additional Details: {details}

Return your response in JSON with the following structure:
{{
  "book_name": "",
  "chapter_title": "",
  "narrative_style": "",
  "chapter_summary": "",
  "chapter_content": ""
}}"#,
            book_name = req.book_name,
            chapter_title = req.chapter_title,
            narrative_style = req.narrative_style,
            sequence = req.sequence,
            details = req.details,
        )
    }

    /// Issue exactly one generation call and parse the reply text. A reply
    /// that is not valid JSON is not an error: it degrades to a raw result.
    pub async fn generate_chapter(
        &self,
        req: &GenerateRequest,
    ) -> Result<GenerationResult, GenerateError> {
        let prompt = Self::build_chapter_prompt(req);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, self.api_key
        );

        info!("🔗 Making request to: {}", url.replace(&self.api_key, "***"));

        let payload = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "responseMimeType": "application/json"
            }
        });

        let response = self.client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| GenerateError::Http(e.to_string()))?;

        if !status.is_success() {
            error!("❌ Gemini API request failed with status {}: {}", status, response_text);
            return Err(GenerateError::Provider {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| GenerateError::Provider {
                status: status.as_u16(),
                body: format!("unexpected response shape: {}", e),
            })?;

        let text = extract_first_text(&parsed).ok_or(GenerateError::EmptyReply)?;
        info!("✅ Received reply text ({} chars)", text.len());

        Ok(GenerationResult::from_reply_text(&text))
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

fn extract_first_text(resp: &GeminiResponse) -> Option<String> {
    for c in &resp.candidates {
        for p in &c.content.parts {
            if let Part::Text { text } = p {
                return Some(text.trim().to_string());
            }
        }
    }
    info!("⚠️ No text part found in response structure");
    None
}
