use anyhow::{Context, Result};
use bilingual_reader::{
    DocumentPort, MemoryDocument, ModeController, ReadingMode, RetryConfig, TextUnitExtractor,
    TranslateError, TranslatorConfig,
};
use tracing::{info, warn};

fn usage() -> String {
    "Usage: bilingual-reader <text-file> [original|translated|bilingual]".to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bilingual_reader=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().with_context(usage)?;
    let mode: ReadingMode = match args.next() {
        Some(value) => value.parse()?,
        None => ReadingMode::Bilingual,
    };

    let config = TranslatorConfig::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path))?;
    let document = MemoryDocument::from_text(&text).with_error_display(config.error_display);

    let extractor = TextUnitExtractor::new(config.min_unit_chars);
    let units = match extractor
        .extract_with_retry(&document, &RetryConfig::extraction())
        .await
    {
        Ok(units) => units,
        Err(TranslateError::ExtractionEmpty) => {
            warn!("No translatable paragraphs in {}", path);
            return Ok(());
        }
        Err(e) => return Err(e).context("Paragraph extraction failed"),
    };
    info!("Loaded {} paragraphs from {}", units.len(), path);

    let controller =
        ModeController::from_config(&config).context("Failed to create translation provider")?;
    let report = controller
        .switch_mode(mode, &document, &document)
        .await
        .context("Mode switch failed")?;

    for unit in &units {
        if document.is_original_visible(unit.anchor) {
            println!("{}", document.text_content(unit.anchor));
        }
        if let Some(translation) = document.translation(unit.anchor) {
            println!("{}", translation);
        }
        if let Some(error) = document.error(unit.anchor) {
            println!("[{}]", error);
        }
        println!();
    }

    info!(
        "{} mode: {} fetched, {} cached, {} failed",
        report.mode,
        report.fetched(),
        report.hits(),
        report.failures()
    );
    let metrics = serde_json::to_string_pretty(&controller.metrics().report())?;
    info!("Translation metrics:\n{}", metrics);

    Ok(())
}
