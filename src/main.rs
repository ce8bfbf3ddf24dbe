use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use text_extractor::config::{Args, Command, Config, SettingsAction};
use text_extractor::engines::EngineRegistry;
use text_extractor::error::ErrorResponse;
use text_extractor::preferences::JsonFileStore;
use text_extractor::preprocessing::Pipeline;
use text_extractor::{languages, search};
use text_extractor::{ConfigurationUpdate, RecognitionConfiguration, RecognitionLevel, TextExtractor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// JSON output of `extract --json`
#[derive(Serialize)]
struct ExtractResponse {
    text: String,
    confidence: f32,
    processing_time_ms: u64,
    engine: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<usize>,
}

#[derive(Serialize)]
struct LanguageEntry {
    tag: &'static str,
    name: &'static str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; stdout is reserved for results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from(&args);
    tracing::debug!("text-extractor v{} ({:?})", env!("CARGO_PKG_VERSION"), config);

    match args.command {
        Command::Extract {
            image,
            search,
            level,
            custom_words,
            json,
        } => run_extract(&config, &image, search, level, custom_words, json).await,
        Command::Settings { action } => run_settings(&config, action),
        Command::Languages => run_languages(),
        Command::Engines => run_engines(&config),
    }
}

async fn run_extract(
    config: &Config,
    image: &Path,
    query: Option<String>,
    level: Option<RecognitionLevel>,
    custom_words: Option<Vec<String>>,
    json: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let bytes = std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;

    let registry = EngineRegistry::new(config)?;
    let engine = registry.select(config.engine.as_deref())?;
    let store = JsonFileStore::open(&config.preferences_path)?;
    let extractor = TextExtractor::new(engine, Pipeline::new(config.preset), Box::new(store));

    // Level and custom words only apply to this run
    extractor.update_configuration(ConfigurationUpdate {
        recognition_level: level,
        custom_words,
        ..Default::default()
    })?;

    let result = match extractor.extract_bytes(&bytes).await {
        Ok(result) => result,
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            }
            return Err(e.into());
        }
    };

    let (text, matches) = match query.as_deref() {
        Some(q) => (
            search::filter_lines(&result.combined_text, q),
            Some(search::count_matches(&result.combined_text, q)),
        ),
        None => (result.combined_text.clone(), None),
    };

    if json {
        let response = ExtractResponse {
            text,
            confidence: result.average_confidence,
            processing_time_ms: start.elapsed().as_millis() as u64,
            engine: extractor.engine_name().to_string(),
            matches,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", text);
        tracing::info!(
            "Average confidence: {:.2} ({}ms)",
            result.average_confidence,
            start.elapsed().as_millis()
        );
    }

    Ok(())
}

fn run_settings(config: &Config, action: SettingsAction) -> anyhow::Result<()> {
    let mut store = JsonFileStore::open(&config.preferences_path)?;
    let mut configuration = RecognitionConfiguration::load(&mut store);

    if let SettingsAction::Set {
        languages,
        min_text_height,
        language_correction,
        auto_detect,
    } = action
    {
        let update = ConfigurationUpdate {
            recognition_languages: languages,
            minimum_text_height: min_text_height,
            use_language_correction: language_correction,
            automatically_detects_language: auto_detect,
            ..Default::default()
        };
        if update.is_empty() {
            anyhow::bail!("Nothing to change; pass at least one setting");
        }
        configuration.update(update, &mut store)?;
        tracing::info!("Saved settings to {:?}", store.path());
    }

    println!("{}", serde_json::to_string_pretty(&configuration)?);
    Ok(())
}

fn run_languages() -> anyhow::Result<()> {
    let entries: Vec<LanguageEntry> = languages::SUPPORTED_LANGUAGES
        .iter()
        .map(|&(tag, name)| LanguageEntry { tag, name })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn run_engines(config: &Config) -> anyhow::Result<()> {
    let registry = EngineRegistry::new(config)?;
    println!("{}", serde_json::to_string_pretty(&registry.info())?);
    Ok(())
}
