//! Speech output pipeline
//!
//! Sequences one reply from text to a finished audio file:
//! optional translation, synthesis, persona effects, then encoding to the
//! caller's path. The raw service artifact is scoped to a single
//! [`VoicePipeline::speak`] call and is removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::{AudioEffects, OutputFormat};
use crate::config::{Config, OutputConfig};
use crate::persona::Persona;
use crate::translate::{GoogleTranslator, Translator, language_of, translate_or_passthrough};
use crate::voice::{GoogleTts, SpeechSynthesizer, Synthesizer, Utterance, sentence_boundaries};
use crate::{Error, Result};

/// Outcome of one spoken reply
#[derive(Debug, Clone)]
pub struct SpeechReport {
    /// Where the encoded artifact was written
    pub path: PathBuf,
    pub persona: Persona,
    pub voice_id: String,
    /// Locale of the voice that spoke
    pub locale: String,
    /// Text that was actually spoken, after translation
    pub text: String,
    pub translated: bool,
    /// Sentences found in the spoken text
    pub sentences: usize,
    /// Whether the accepted request carried SSML
    pub ssml: bool,
    /// Whether the plain-text retry produced the audio
    pub fallback: bool,
    pub format: OutputFormat,
    pub duration_ms: u64,
    pub bytes: usize,
}

/// Text-to-audio pipeline for persona replies
pub struct VoicePipeline {
    synthesizer: Synthesizer,
    effects: AudioEffects,
    output: OutputConfig,
    translator: Option<Arc<dyn Translator>>,
}

impl VoicePipeline {
    #[must_use]
    pub const fn new(
        synthesizer: Synthesizer,
        effects: AudioEffects,
        output: OutputConfig,
    ) -> Self {
        Self {
            synthesizer,
            effects,
            output,
            translator: None,
        }
    }

    /// Translate every reply into the utterance language before speaking
    #[must_use]
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Build a pipeline around an explicit synthesis backend
    #[must_use]
    pub fn with_service(config: &Config, service: Arc<dyn SpeechSynthesizer>) -> Self {
        let synthesizer = Synthesizer::new(
            service,
            Arc::new(config.voice_catalog()),
            config.synthesis_options(),
        );

        Self::new(
            synthesizer,
            AudioEffects::new(config.effects.clone()),
            config.output.clone(),
        )
    }

    /// Build the Google-backed pipeline described by a configuration
    ///
    /// # Errors
    ///
    /// Returns error if no Google credential is configured, or translation is
    /// enabled without a project
    pub fn from_config(config: &Config) -> Result<Self> {
        let credential = || {
            config.google_auth().ok_or_else(|| {
                Error::Config(
                    "Google credential required: set GOOGLE_TTS_API_KEY or GOOGLE_ACCESS_TOKEN"
                        .to_string(),
                )
            })
        };

        let tts = GoogleTts::with_endpoint(credential()?, &config.synthesis.endpoint)?;
        let pipeline = Self::with_service(config, Arc::new(tts));

        if !config.translation.enabled {
            return Ok(pipeline);
        }

        let project = config.translation.project.clone().ok_or_else(|| {
            Error::Config("translation enabled but GOOGLE_CLOUD_PROJECT is not set".to_string())
        })?;
        let translator =
            GoogleTranslator::with_endpoint(project, credential()?, &config.translation.endpoint)?;

        Ok(pipeline.with_translator(Arc::new(translator)))
    }

    #[must_use]
    pub const fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    /// Speak an utterance into an audio file at `output_path`
    ///
    /// The container follows the configured format, or the path extension
    /// when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] when synthesis fails, and audio or IO
    /// errors from decoding, encoding, or writing the artifact
    pub async fn speak(&self, utterance: &Utterance, output_path: &Path) -> Result<SpeechReport> {
        let (text, translated) = match &self.translator {
            Some(translator) => {
                let target = language_of(&utterance.locale);
                let text = translate_or_passthrough(translator.as_ref(), &utterance.text, target)
                    .await;
                let translated = text != utterance.text;
                (text, translated)
            }
            None => (utterance.text.clone(), false),
        };

        let sentences = sentence_boundaries(&text).len();

        tracing::debug!(
            persona = %utterance.persona,
            locale = %utterance.locale,
            sentences,
            translated,
            "speaking reply"
        );

        let spoken = Utterance {
            text,
            ..utterance.clone()
        };

        let raw = self.synthesizer.synthesize(&spoken).await?;
        let buffer = raw.decode(self.synthesizer.options().sample_rate).await?;

        let persona = raw.voice().persona;
        let buffer = self.effects.apply(buffer, persona);

        let format = self.output.format_for(output_path);
        let encoded = buffer.encode(format, self.output.bitrate_kbps)?;
        write_artifact(output_path, &encoded).await?;

        let report = SpeechReport {
            path: output_path.to_path_buf(),
            persona,
            voice_id: raw.voice().voice_id.clone(),
            locale: raw.voice().locale.clone(),
            text: spoken.text,
            translated,
            sentences,
            ssml: raw.used_ssml(),
            fallback: raw.used_fallback(),
            format,
            duration_ms: buffer.duration_ms(),
            bytes: encoded.len(),
        };

        tracing::info!(
            path = %report.path.display(),
            persona = %report.persona,
            duration_ms = report.duration_ms,
            bytes = report.bytes,
            "wrote speech audio"
        );

        Ok(report)
    }
}

/// Write `bytes` to `path` through a staged file in the same directory
///
/// The destination either keeps its previous contents or receives the full
/// artifact. The staged file is removed when the write fails.
async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let staged = tempfile::Builder::new()
        .prefix(".charvoice_")
        .tempfile_in(dir)?;
    tokio::fs::write(staged.path(), bytes).await?;
    staged.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(())
}
