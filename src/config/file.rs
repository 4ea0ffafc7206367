//! TOML configuration file loading
//!
//! Supports `~/.config/character-voice/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::audio::OutputFormat;
use crate::voice::AudioEncoding;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Synthesis request shaping
    #[serde(default)]
    pub synthesis: SynthesisFileConfig,

    /// Final artifact encoding
    #[serde(default)]
    pub output: OutputFileConfig,

    /// Effects chain levels and timings
    #[serde(default)]
    pub effects: EffectsFileConfig,

    /// Voice capability overrides
    #[serde(default)]
    pub voices: VoicesFileConfig,

    /// Reply translation
    #[serde(default)]
    pub translation: TranslationFileConfig,

    /// Credentials for Google Cloud APIs
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Synthesis request configuration
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisFileConfig {
    /// Text-to-Speech base URL
    pub endpoint: Option<String>,

    /// Requested sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Requested encoding (`MP3` or `LINEAR16`)
    pub audio_encoding: Option<AudioEncoding>,

    /// Effects profile hint; empty string disables it
    pub effects_profile: Option<String>,

    /// Directory for temporary raw audio
    pub temp_dir: Option<String>,
}

/// Output artifact configuration
#[derive(Debug, Default, Deserialize)]
pub struct OutputFileConfig {
    /// `mp3` or `wav`; guessed from the output path when unset
    pub format: Option<OutputFormat>,

    /// MP3 bitrate in kbps
    pub bitrate_kbps: Option<u32>,
}

/// Effects chain configuration
#[derive(Debug, Default, Deserialize)]
pub struct EffectsFileConfig {
    pub low_cutoff_hz: Option<f32>,
    pub high_cutoff_hz: Option<f32>,
    pub headroom_db: Option<f32>,
    /// Ambience level; set `ambience = false` to disable the bed
    pub ambience_db: Option<f32>,
    pub ambience: Option<bool>,
    pub breath_db: Option<f32>,
    pub breath_interval_ms: Option<u64>,
    pub breath_duration_ms: Option<u64>,
}

/// Voice capability configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoicesFileConfig {
    /// Voice names known to honor SSML
    #[serde(default)]
    pub ssml_voices: Vec<String>,
}

/// Translation configuration
#[derive(Debug, Default, Deserialize)]
pub struct TranslationFileConfig {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    /// Google Cloud project hosting the Translation API
    pub project: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub google: Option<String>,
    pub google_access_token: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            ConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file can't be read or isn't valid TOML
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/character-voice/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.config_dir().join("character-voice").join("config.toml"))
}
