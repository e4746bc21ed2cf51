// Copyright 2025 ModerRAS
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Vision Extract
//!
//! Extract structured fields from medical document images with a hosted
//! vision-language model.
//!
//! The library sends one chat-completion request (a system instruction, an
//! extraction prompt and the document image embedded as a data URL) to an
//! OpenAI-compatible inference endpoint and returns the model's reply.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vision_extract::config::{get_extraction_prompt, SYSTEM_PROMPT};
//! use vision_extract::extraction::build_messages;
//! use vision_extract::model::{ImageDetailLevel, ImageUrl};
//! use vision_extract::{ModelClient, ModelConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let token = std::env::var("GITHUB_TOKEN")?;
//!     let client = ModelClient::new(ModelConfig::default().with_api_key(token));
//!
//!     let image = ImageUrl::load("f1.jpg", Some("jpg"), Some(ImageDetailLevel::Low))?;
//!     let messages = build_messages(SYSTEM_PROMPT, get_extraction_prompt("fr"), image);
//!
//!     let completion = client.complete(&messages).await?;
//!     println!("{}", completion.first_content()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod extraction;
pub mod model;
pub mod settings;

pub use extraction::{ExtractionError, MedicalRecord};
pub use model::{ChatCompletion, ChatMessage, ModelClient, ModelConfig, ModelError};
pub use settings::{AppSettings, SettingsError};
