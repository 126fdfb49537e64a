use crate::models::GenerationResult;
use html_escape::encode_text;
use serde_json::Value;

/// What the result region shows: a chapter when the structured reply carries
/// `chapter_content`, a warning plus the captured value otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedView {
    Chapter {
        title: String,
        content: String,
        payload: Value,
    },
    Degraded {
        raw: String,
    },
}

impl RenderedView {
    pub fn from_result(result: &GenerationResult) -> Self {
        match result {
            GenerationResult::Structured(value) if value.get("chapter_content").is_some() => {
                RenderedView::Chapter {
                    title: field_as_text(value, "chapter_title"),
                    content: field_as_text(value, "chapter_content"),
                    payload: value.clone(),
                }
            }
            GenerationResult::Structured(value) => RenderedView::Degraded {
                raw: serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            },
            GenerationResult::Raw { raw_output } => RenderedView::Degraded {
                raw: raw_output.clone(),
            },
        }
    }

    /// Server-side HTML for the result region. Model-supplied text is escaped.
    pub fn to_html(&self) -> String {
        match self {
            RenderedView::Chapter { title, content, payload } => {
                let payload_pretty = serde_json::to_string_pretty(payload)
                    .unwrap_or_else(|_| payload.to_string());
                format!(
                    concat!(
                        r#"<section class="result">"#,
                        "<h3>{}</h3>",
                        r#"<div class="chapter-content">{}</div>"#,
                        "<details><summary>📦 Structured JSON Output</summary><pre>{}</pre></details>",
                        "</section>"
                    ),
                    encode_text(title),
                    encode_text(content),
                    encode_text(&payload_pretty),
                )
            }
            RenderedView::Degraded { raw } => format!(
                concat!(
                    r#"<section class="result">"#,
                    r#"<div class="warning">⚠️ Could not parse structured output.</div>"#,
                    "<pre>{}</pre>",
                    "</section>"
                ),
                encode_text(raw),
            ),
        }
    }
}

/// Render the result region; empty until a first result exists.
pub fn render_region(result: Option<&GenerationResult>) -> String {
    match result {
        Some(result) => RenderedView::from_result(result).to_html(),
        None => String::new(),
    }
}

fn field_as_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
