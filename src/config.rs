use crate::preferences::JsonFileStore;
use crate::preprocessing::Preset;
use crate::settings::RecognitionLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "text-extractor")]
#[command(about = "Extract, search and tidy up text from photos")]
#[command(version)]
pub struct Args {
    /// OCR engine to use (defaults to the first available)
    #[arg(long, env = "TEXT_EXTRACTOR_ENGINE", global = true)]
    pub engine: Option<String>,

    /// Preferences file (defaults to <config dir>/text-extractor/preferences.json)
    #[arg(long, env = "TEXT_EXTRACTOR_PREFERENCES", global = true)]
    pub preferences: Option<PathBuf>,

    /// Image preprocessing preset: "enhance" or "none"
    #[arg(long, env = "TEXT_EXTRACTOR_PRESET", default_value = "enhance", global = true)]
    pub preset: Preset,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX", global = true)]
    pub tessdata_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recognize text in an image file
    Extract {
        /// Image to read (any format the image crate decodes)
        image: PathBuf,

        /// Only print lines containing this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,

        /// Recognition level for this run: "fast" or "accurate"
        #[arg(long)]
        level: Option<RecognitionLevel>,

        /// Extra vocabulary for this run, comma separated
        #[arg(long, value_delimiter = ',')]
        custom_words: Option<Vec<String>>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change stored recognition settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List supported recognition languages
    Languages,

    /// List available OCR engines
    Engines,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current settings
    Show,

    /// Change one or more settings; omitted ones keep their value
    Set {
        /// Recognition languages, comma separated (e.g. "en-US,fr-FR")
        #[arg(long, value_delimiter = ',')]
        languages: Option<Vec<String>>,

        /// Minimum text height as a fraction of the image height, in (0, 1]
        #[arg(long)]
        min_text_height: Option<f32>,

        /// Let the engine correct words with a language model
        #[arg(long)]
        language_correction: Option<bool>,

        /// Let the engine detect the language automatically
        #[arg(long)]
        auto_detect: Option<bool>,
    },
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: Option<String>,
    pub preferences_path: PathBuf,
    pub preset: Preset,
    pub tessdata_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: None,
            preferences_path: JsonFileStore::default_path(),
            preset: Preset::default(),
            tessdata_path: None,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            engine: args.engine.clone(),
            preferences_path: args
                .preferences
                .clone()
                .unwrap_or_else(JsonFileStore::default_path),
            preset: args.preset,
            tessdata_path: args.tessdata_path.clone(),
        }
    }
}
