use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateRequest {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub book_name: String,
    #[serde(default)]
    pub chapter_title: String,
    #[serde(default)]
    pub narrative_style: String, // e.g. first-person, poetic, dark fantasy
    #[serde(default)]
    pub sequence: String, // chapter sequence / outline
    #[serde(default)]
    pub details: String, // themes, tone, pacing, word count, etc.
}

/// Outcome of one generation call: the reply text parsed as JSON, or the
/// raw text when parsing fails. Serialize-only; results are constructed
/// through [`GenerationResult::from_reply_text`], never deserialized, so a
/// structured reply that happens to carry a `raw_output` key stays
/// structured.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum GenerationResult {
    Raw { raw_output: String },
    Structured(serde_json::Value),
}

impl GenerationResult {
    /// Strict JSON decode of the reply text; any valid JSON value is accepted
    /// as structured, anything else degrades to raw text.
    pub fn from_reply_text(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => GenerationResult::Structured(value),
            Err(_) => GenerationResult::Raw { raw_output: text.to_string() },
        }
    }

    /// A result is well-formed when it is a JSON object carrying a
    /// `chapter_content` key; everything else takes the degraded path.
    pub fn is_well_formed(&self) -> bool {
        match self {
            GenerationResult::Structured(value) => value.get("chapter_content").is_some(),
            GenerationResult::Raw { .. } => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub api_key: String,
    pub last_result: Option<GenerationResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            api_key: String::new(),
            last_result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable projection of a session. The credential is deliberately
/// absent so it can never leak through the API.
#[derive(Debug, Serialize, Clone)]
pub struct SessionView {
    pub id: Uuid,
    pub has_api_key: bool,
    pub last_result: Option<GenerationResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        SessionView {
            id: session.id,
            has_api_key: !session.api_key.is_empty(),
            last_result: session.last_result.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
