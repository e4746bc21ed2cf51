//! Vision Extract - medical document field extraction
//!
//! This is the CLI entry point for the vision-extract tool.
//! Run with: cargo run --bin vision-extract -- [--parse] [--save-settings] [IMAGE_PATH]

use anyhow::Context;
use std::env;
use tracing_subscriber::EnvFilter;
use vision_extract::config::{get_extraction_prompt, SYSTEM_PROMPT};
use vision_extract::extraction::{build_messages, MedicalRecord};
use vision_extract::model::{ImageUrl, ModelClient};
use vision_extract::AppSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout carries only the model output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let parse_output = args.iter().any(|arg| arg == "--parse");
    let save_settings = args.iter().any(|arg| arg == "--save-settings");
    let image_arg = args.iter().find(|arg| !arg.starts_with("--"));

    // Settings file < environment < command line
    let mut settings = AppSettings::load().apply_env();
    if let Some(path) = image_arg {
        settings.image_path = path.clone();
    }

    if save_settings {
        let path = settings.save()?;
        eprintln!("Settings saved to {}", path.display());
        return Ok(());
    }

    let token = settings.read_token()?;
    let image = ImageUrl::load(
        &settings.image_path,
        settings.image_format(),
        Some(settings.image_detail),
    )
    .with_context(|| format!("loading image {}", settings.image_path))?;

    let messages = build_messages(SYSTEM_PROMPT, get_extraction_prompt(&settings.lang), image);
    let client = ModelClient::new(settings.to_model_config(token));

    tracing::debug!(
        "Extracting from {} with {} @ {}",
        settings.image_path,
        settings.model_name,
        settings.endpoint
    );

    let completion = client.complete(&messages).await?;
    let content = completion.first_content()?;

    if parse_output {
        let record = MedicalRecord::from_content(content)?;
        let unknown = record.unknown_fields();
        if !unknown.is_empty() {
            tracing::info!("Fields not found in document: {}", unknown.join(", "));
        }
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", content);
    }

    Ok(())
}
