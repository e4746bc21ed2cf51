//! Configuration module for Vision Extract.

mod prompts;

pub use prompts::{get_extraction_prompt, EXTRACTION_PROMPT_EN, EXTRACTION_PROMPT_FR, SYSTEM_PROMPT};
