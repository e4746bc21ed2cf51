//! Chat message types for the chat-completions API.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Image loading errors.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to read image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Image file is empty: {0}")]
    Empty(String),
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Cannot determine image format for {0}")]
    UnknownFormat(String),
}

/// How much detail the model should use when looking at an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetailLevel {
    Auto,
    Low,
    High,
}

impl FromStr for ImageDetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ImageDetailLevel::Auto),
            "low" => Ok(ImageDetailLevel::Low),
            "high" => Ok(ImageDetailLevel::High),
            other => Err(format!("Unknown image detail level: {}", other)),
        }
    }
}

/// Image reference, either a remote URL or an inline data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetailLevel>,
}

impl ImageUrl {
    /// Reference an image by URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            detail: None,
        }
    }

    /// Set the detail level.
    pub fn with_detail(mut self, detail: ImageDetailLevel) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Load a local image file and embed it as a base64 data URL.
    ///
    /// # Arguments
    /// * `path` - Path of the image file.
    /// * `format` - Format used in the MIME type (e.g. "jpg", "png"). Inferred
    ///   from the file extension when `None`.
    /// * `detail` - Optional detail level.
    ///
    /// # Returns
    /// ImageUrl with `data:image/<format>;base64,...` as URL.
    pub fn load(
        path: impl AsRef<Path>,
        format: Option<&str>,
        detail: Option<ImageDetailLevel>,
    ) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let format = match format {
            Some(f) if !f.trim().is_empty() => f.trim().to_lowercase(),
            _ => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_lowercase())
                .ok_or_else(|| ImageError::UnknownFormat(shown.clone()))?,
        };

        let bytes = fs::read(path).map_err(|source| ImageError::Io {
            path: shown.clone(),
            source,
        })?;

        if bytes.is_empty() {
            return Err(ImageError::Empty(shown));
        }

        // Make sure we are not sending garbage to the model
        let img = image::load_from_memory(&bytes).map_err(|e| ImageError::Decode {
            path: shown.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(
            "Loaded image {} ({}x{}, {} bytes)",
            shown,
            img.width(),
            img.height(),
            bytes.len()
        );

        Ok(Self {
            url: format!("data:image/{};base64,{}", format, STANDARD.encode(&bytes)),
            detail,
        })
    }
}

/// A single item of multimodal user content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    pub fn image(image_url: ImageUrl) -> Self {
        ContentItem::ImageUrl { image_url }
    }
}

/// User message content: plain text or a list of content items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Items(Vec<ContentItem>),
}

/// Role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System { content: String },
    User { content: UserContent },
    Assistant { content: String },
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    /// Create a text-only user message.
    pub fn user_text(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: UserContent::Text(content.into()),
        }
    }

    /// Create a multimodal user message.
    pub fn user(items: Vec<ContentItem>) -> Self {
        ChatMessage::User {
            content: UserContent::Items(items),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
        }
    }
}
