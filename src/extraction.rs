//! Request assembly and output handling for document extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::{ChatMessage, ContentItem, ImageUrl};

/// Value the prompt asks the model to use for fields it cannot determine.
pub const UNKNOWN: &str = "inconnu";

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n\s*```").expect("valid fence regex")
});

/// Extraction output errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Model output is not a JSON object: {0}")]
    InvalidJson(String),
}

/// Build the request messages: the system instruction, then one user
/// message carrying the extraction prompt followed by the image.
pub fn build_messages(system: &str, prompt: &str, image: ImageUrl) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system),
        ChatMessage::user(vec![ContentItem::text(prompt), ContentItem::image(image)]),
    ]
}

/// Strip a Markdown code fence or surrounding chatter from model output.
///
/// Takes the body of the leading fenced block when the output opens with one,
/// then narrows to the span from the first `{` to the last `}`. Falls back to
/// the trimmed text when there is no such span.
pub fn extract_json_block(content: &str) -> &str {
    let text = FENCE_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map_or(content, |body| body.as_str());

    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Read a string field, turning `null` into the unknown sentinel.
fn null_as_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| UNKNOWN.to_string()))
}

/// Fields requested by the extraction prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalRecord {
    #[serde(deserialize_with = "null_as_unknown")]
    pub date_examen: String,
    #[serde(deserialize_with = "null_as_unknown")]
    pub type_document: String,
    #[serde(deserialize_with = "null_as_unknown")]
    pub specialite_medecin: String,
    #[serde(deserialize_with = "null_as_unknown")]
    pub conclusions: String,
}

impl Default for MedicalRecord {
    fn default() -> Self {
        Self {
            date_examen: UNKNOWN.to_string(),
            type_document: UNKNOWN.to_string(),
            specialite_medecin: UNKNOWN.to_string(),
            conclusions: UNKNOWN.to_string(),
        }
    }
}

impl MedicalRecord {
    /// Parse a record from raw model output. Missing or null fields become "inconnu".
    pub fn from_content(content: &str) -> Result<Self, ExtractionError> {
        serde_json::from_str(extract_json_block(content))
            .map_err(|e| ExtractionError::InvalidJson(e.to_string()))
    }

    /// Whether a field value is the unknown sentinel.
    pub fn is_unknown(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case(UNKNOWN)
    }

    /// Names of the fields the model could not determine.
    pub fn unknown_fields(&self) -> Vec<&'static str> {
        [
            ("date_examen", &self.date_examen),
            ("type_document", &self.type_document),
            ("specialite_medecin", &self.specialite_medecin),
            ("conclusions", &self.conclusions),
        ]
        .into_iter()
        .filter(|(_, value)| Self::is_unknown(value))
        .map(|(name, _)| name)
        .collect()
    }
}
