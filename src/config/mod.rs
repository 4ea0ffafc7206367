//! Configuration management
//!
//! Precedence is environment, then TOML file, then built-in defaults.

pub mod file;

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use crate::Result;
use crate::audio::{DEFAULT_BITRATE_KBPS, EffectsConfig, OutputFormat, SAMPLE_RATE};
use crate::translate::GOOGLE_TRANSLATE_ENDPOINT;
use crate::voice::{
    AudioEncoding, DEFAULT_EFFECTS_PROFILE, GOOGLE_TTS_ENDPOINT, GoogleAuth, SynthesisOptions,
    VoiceCatalog,
};

pub use file::{ConfigFile, config_file_path, load_config_file, read_config_file};

/// Character voice configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Synthesis request shaping
    pub synthesis: SynthesisConfig,

    /// Final artifact encoding
    pub output: OutputConfig,

    /// Effects chain levels and timings
    pub effects: EffectsConfig,

    /// Voices known to honor SSML (empty by default)
    pub ssml_voices: Vec<String>,

    /// Reply translation
    pub translation: TranslationConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Synthesis request configuration
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Text-to-Speech base URL
    pub endpoint: String,

    /// Requested sample rate in Hz
    pub sample_rate: u32,

    /// Requested encoding
    pub encoding: AudioEncoding,

    /// Effects profile hint
    pub effects_profile: Option<String>,

    /// Directory for temporary raw audio
    pub temp_dir: Option<PathBuf>,
}

/// Output artifact configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Forced container; guessed from the output path when `None`
    pub format: Option<OutputFormat>,

    /// MP3 bitrate in kbps
    pub bitrate_kbps: u32,
}

impl OutputConfig {
    /// Container for an output path
    #[must_use]
    pub fn format_for(&self, path: &Path) -> OutputFormat {
        self.format.unwrap_or_else(|| OutputFormat::from_path(path))
    }
}

/// Translation configuration
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub project: Option<String>,
}

/// API keys for Google Cloud services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// API key (`GOOGLE_TTS_API_KEY` or `GOOGLE_API_KEY`)
    pub google: Option<String>,

    /// OAuth access token (`GOOGLE_ACCESS_TOKEN`)
    pub google_access_token: Option<String>,
}

impl Config {
    /// Load configuration from the standard config file and environment
    ///
    /// Falls back to defaults when the standard file is missing or invalid.
    #[must_use]
    pub fn load() -> Self {
        Self::from_sources(load_config_file(), |k| std::env::var(k).ok())
    }

    /// Load configuration from an explicit file, or the standard one
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file can't be read or parsed
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let fc = read_config_file(path)?;
                tracing::info!(path = %path.display(), "loaded config file");
                Ok(Self::from_sources(fc, |k| std::env::var(k).ok()))
            }
            None => Ok(Self::load()),
        }
    }

    /// Build configuration from a parsed file and an environment lookup
    pub fn from_sources(fc: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = EffectsConfig::default();
        let effects = EffectsConfig {
            low_cutoff_hz: fc.effects.low_cutoff_hz.unwrap_or(defaults.low_cutoff_hz),
            high_cutoff_hz: fc.effects.high_cutoff_hz.unwrap_or(defaults.high_cutoff_hz),
            headroom_db: fc.effects.headroom_db.unwrap_or(defaults.headroom_db),
            ambience_db: if fc.effects.ambience == Some(false) {
                None
            } else {
                fc.effects.ambience_db.or(defaults.ambience_db)
            },
            breath_db: fc.effects.breath_db.unwrap_or(defaults.breath_db),
            breath_interval_ms: fc
                .effects
                .breath_interval_ms
                .unwrap_or(defaults.breath_interval_ms),
            breath_duration_ms: fc
                .effects
                .breath_duration_ms
                .unwrap_or(defaults.breath_duration_ms),
        };

        let synthesis = SynthesisConfig {
            endpoint: env("CHARVOICE_TTS_ENDPOINT")
                .or(fc.synthesis.endpoint)
                .unwrap_or_else(|| GOOGLE_TTS_ENDPOINT.to_string()),
            sample_rate: fc.synthesis.sample_rate.unwrap_or(SAMPLE_RATE),
            encoding: fc.synthesis.audio_encoding.unwrap_or_default(),
            effects_profile: match fc.synthesis.effects_profile {
                Some(p) if p.is_empty() => None,
                Some(p) => Some(p),
                None => Some(DEFAULT_EFFECTS_PROFILE.to_string()),
            },
            temp_dir: fc.synthesis.temp_dir.map(PathBuf::from),
        };

        let output = OutputConfig {
            format: fc.output.format,
            bitrate_kbps: fc.output.bitrate_kbps.unwrap_or(DEFAULT_BITRATE_KBPS),
        };

        let ssml_voices = env("CHARVOICE_SSML_VOICES").map_or(fc.voices.ssml_voices, |list| {
            list.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        });

        let translation = TranslationConfig {
            enabled: fc.translation.enabled.unwrap_or(false),
            endpoint: fc
                .translation
                .endpoint
                .unwrap_or_else(|| GOOGLE_TRANSLATE_ENDPOINT.to_string()),
            project: env("GOOGLE_CLOUD_PROJECT").or(fc.translation.project),
        };

        let api_keys = ApiKeys {
            google: env("GOOGLE_TTS_API_KEY")
                .or_else(|| env("GOOGLE_API_KEY"))
                .or(fc.api_keys.google),
            google_access_token: env("GOOGLE_ACCESS_TOKEN").or(fc.api_keys.google_access_token),
        };

        Self {
            synthesis,
            output,
            effects,
            ssml_voices,
            translation,
            api_keys,
        }
    }

    /// Credentials for Google APIs, preferring an access token over a key
    #[must_use]
    pub fn google_auth(&self) -> Option<GoogleAuth> {
        self.api_keys
            .google_access_token
            .clone()
            .filter(|t| !t.is_empty())
            .map(|t| GoogleAuth::Bearer(SecretString::from(t)))
            .or_else(|| {
                self.api_keys
                    .google
                    .clone()
                    .filter(|k| !k.is_empty())
                    .map(|k| GoogleAuth::ApiKey(SecretString::from(k)))
            })
    }

    /// Voice catalog with the configured SSML allow-list
    #[must_use]
    pub fn voice_catalog(&self) -> VoiceCatalog {
        VoiceCatalog::new()
            .with_ssml_voices(self.ssml_voices.iter().cloned())
    }

    /// Request shaping for the synthesis invoker
    #[must_use]
    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            sample_rate: self.synthesis.sample_rate,
            encoding: self.synthesis.encoding,
            effects_profile: self.synthesis.effects_profile.clone(),
            temp_dir: self.synthesis.temp_dir.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_sources(ConfigFile::default(), |_| None)
    }
}
