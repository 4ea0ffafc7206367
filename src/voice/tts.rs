//! Text-to-speech (TTS) synthesis
//!
//! [`Synthesizer`] sequences one synthesis call: resolve the persona voice,
//! pick SSML or plain input, call the injected [`SpeechSynthesizer`], and
//! retry once as plain text when the service rejects the markup. The raw
//! service audio lands in a scoped temporary file that is removed when the
//! returned [`SynthesizedAudio`] drops.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::catalog::{VoiceCatalog, VoiceGender, VoiceProfile};
use super::prosody::{annotate, strip_markup};
use crate::audio::AudioBuffer;
use crate::{Error, Result};

/// Public Google Cloud Text-to-Speech endpoint
pub const GOOGLE_TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com";

/// Effects profile hint sent with full-quality requests
pub const DEFAULT_EFFECTS_PROFILE: &str = "headphone-class-device";

/// Text handed to the synthesis service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisInput {
    Text(String),
    Ssml(String),
}

impl SynthesisInput {
    #[must_use]
    pub const fn is_ssml(&self) -> bool {
        matches!(self, Self::Ssml(_))
    }
}

/// Audio container requested from the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    #[default]
    Mp3,
    Linear16,
}

impl AudioEncoding {
    const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => ".mp3",
            Self::Linear16 => ".wav",
        }
    }
}

/// One request to the synthesis service
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub input: SynthesisInput,
    pub locale: String,
    pub voice_id: String,
    pub gender: VoiceGender,
    pub speaking_rate: f32,
    pub encoding: AudioEncoding,
    /// Omitted on minimal requests
    pub sample_rate_hertz: Option<u32>,
    /// Omitted on minimal requests
    pub effects_profile: Option<String>,
}

impl SynthesisRequest {
    /// Full-quality request for a resolved voice
    #[must_use]
    pub fn new(input: SynthesisInput, voice: &VoiceProfile, options: &SynthesisOptions) -> Self {
        Self {
            sample_rate_hertz: Some(options.sample_rate),
            effects_profile: options.effects_profile.clone(),
            ..Self::minimal(input, voice, options.encoding)
        }
    }

    /// Request without quality hints, used for the plain-text retry
    #[must_use]
    pub fn minimal(input: SynthesisInput, voice: &VoiceProfile, encoding: AudioEncoding) -> Self {
        Self {
            input,
            locale: voice.locale.clone(),
            voice_id: voice.voice_id.clone(),
            gender: voice.gender,
            speaking_rate: voice.speaking_rate,
            encoding,
            sample_rate_hertz: None,
            effects_profile: None,
        }
    }
}

/// A speech synthesis backend
///
/// Implementations return raw encoded audio. A rejection caused by the
/// SSML itself must surface as [`Error::MarkupRejected`] so the caller can
/// retry with plain text.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one request
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>>;
}

/// Credentials for Google Cloud APIs
pub enum GoogleAuth {
    /// API key sent as `x-goog-api-key`
    ApiKey(SecretString),
    /// OAuth access token sent as a bearer token
    Bearer(SecretString),
}

/// Google Cloud Text-to-Speech REST backend
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
    auth: GoogleAuth,
}

impl GoogleTts {
    /// Create a backend for the public endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the credential is empty
    pub fn new(auth: GoogleAuth) -> Result<Self> {
        Self::with_endpoint(auth, GOOGLE_TTS_ENDPOINT)
    }

    /// Create a backend for a custom endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the credential is empty
    pub fn with_endpoint(auth: GoogleAuth, endpoint: impl Into<String>) -> Result<Self> {
        let secret = match &auth {
            GoogleAuth::ApiKey(s) | GoogleAuth::Bearer(s) => s,
        };
        if secret.expose_secret().is_empty() {
            return Err(Error::Config(
                "Google API key or access token required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            auth,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRequest<'a> {
    input: &'a SynthesisInput,
    voice: GoogleVoice<'a>,
    audio_config: GoogleAudioConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVoice<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: VoiceGender,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleAudioConfig<'a> {
    audio_encoding: AudioEncoding,
    speaking_rate: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    effects_profile_id: Vec<&'a str>,
}

impl<'a> GoogleRequest<'a> {
    fn from_request(request: &'a SynthesisRequest) -> Self {
        Self {
            input: &request.input,
            voice: GoogleVoice {
                language_code: &request.locale,
                name: &request.voice_id,
                ssml_gender: request.gender,
            },
            audio_config: GoogleAudioConfig {
                audio_encoding: request.encoding,
                speaking_rate: request.speaking_rate,
                sample_rate_hertz: request.sample_rate_hertz,
                effects_profile_id: request.effects_profile.as_deref().into_iter().collect(),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleResponse {
    audio_content: String,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        let body = GoogleRequest::from_request(request);

        tracing::debug!(
            voice = %request.voice_id,
            locale = %request.locale,
            ssml = request.input.is_ssml(),
            "sending Google TTS request"
        );

        let builder = self
            .client
            .post(format!("{}/v1/text:synthesize", self.endpoint))
            .json(&body);
        let builder = match &self.auth {
            GoogleAuth::ApiKey(key) => builder.header("x-goog-api-key", key.expose_secret()),
            GoogleAuth::Bearer(token) => builder.bearer_auth(token.expose_secret()),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "Google TTS request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text, &request.input));
        }

        let result: GoogleResponse = response.json().await?;
        let audio = base64::engine::general_purpose::STANDARD.decode(result.audio_content)?;

        Ok(audio)
    }
}

/// Map a failed Google response to an error
///
/// `INVALID_ARGUMENT` on an SSML request whose message points at the
/// markup or the synthesis input is a markup rejection; everything else is
/// a plain TTS failure.
fn classify_failure(status: reqwest::StatusCode, body: &str, input: &SynthesisInput) -> Error {
    let detail = serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .map(|b| b.error);
    let message = detail
        .as_ref()
        .map_or_else(|| body.to_string(), |d| d.message.clone());

    let invalid_argument = status == reqwest::StatusCode::BAD_REQUEST
        && detail
            .as_ref()
            .is_none_or(|d| d.status == "INVALID_ARGUMENT");
    let lowered = message.to_lowercase();
    let mentions_markup = lowered.contains("ssml") || lowered.contains("synthesis input");

    if input.is_ssml() && invalid_argument && mentions_markup {
        tracing::warn!(status = %status, message = %message, "Google TTS rejected SSML");
        Error::MarkupRejected(message)
    } else {
        tracing::error!(status = %status, message = %message, "Google TTS error");
        Error::Tts(format!("Google TTS error {status}: {message}"))
    }
}

/// Text to speak, in a locale, as a persona
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    /// BCP 47 locale, e.g. `hi-IN`
    pub locale: String,
    /// Persona identifier; unknown ones fall back to the default persona
    pub persona: String,
}

impl Utterance {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        locale: impl Into<String>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            locale: locale.into(),
            persona: persona.into(),
        }
    }
}

/// Request shaping shared by every synthesis call
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub sample_rate: u32,
    pub encoding: AudioEncoding,
    pub effects_profile: Option<String>,
    /// Directory for temporary raw artifacts; system temp dir when `None`
    pub temp_dir: Option<PathBuf>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            sample_rate: crate::audio::SAMPLE_RATE,
            encoding: AudioEncoding::Mp3,
            effects_profile: Some(DEFAULT_EFFECTS_PROFILE.to_string()),
            temp_dir: None,
        }
    }
}

/// Raw synthesized audio held in a scoped temporary file
///
/// The file is deleted when this value drops.
#[derive(Debug)]
pub struct SynthesizedAudio {
    file: NamedTempFile,
    encoding: AudioEncoding,
    voice: VoiceProfile,
    ssml: bool,
    fallback: bool,
}

impl SynthesizedAudio {
    /// Location of the temporary artifact
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Voice the audio was synthesized with
    #[must_use]
    pub const fn voice(&self) -> &VoiceProfile {
        &self.voice
    }

    /// Whether the accepted request carried SSML
    #[must_use]
    pub const fn used_ssml(&self) -> bool {
        self.ssml
    }

    /// Whether the plain-text retry produced this audio
    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        self.fallback
    }

    /// Read the artifact back and decode it to PCM
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read or decoded
    pub async fn decode(&self, fallback_rate: u32) -> Result<AudioBuffer> {
        let bytes = tokio::fs::read(self.file.path()).await?;

        match self.encoding {
            AudioEncoding::Mp3 => AudioBuffer::decode_mp3(&bytes, fallback_rate),
            AudioEncoding::Linear16 => decode_wav(&bytes),
        }
    }
}

fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();

    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(|s| f32::from(s) / 32768.0))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Audio(e.to_string()))?;

    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
}

/// Synthesis invoker with the one-shot markup fallback
pub struct Synthesizer {
    service: Arc<dyn SpeechSynthesizer>,
    catalog: Arc<VoiceCatalog>,
    options: SynthesisOptions,
}

impl Synthesizer {
    #[must_use]
    pub fn new(
        service: Arc<dyn SpeechSynthesizer>,
        catalog: Arc<VoiceCatalog>,
        options: SynthesisOptions,
    ) -> Self {
        Self {
            service,
            catalog,
            options,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Synthesize an utterance into a temporary raw artifact
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] when the service fails for a non-markup
    /// reason, or when both the SSML attempt and the plain-text retry fail.
    /// Returns IO errors from writing the temporary artifact.
    pub async fn synthesize(&self, utterance: &Utterance) -> Result<SynthesizedAudio> {
        let voice = self.catalog.resolve(&utterance.persona, &utterance.locale);

        let input = if voice.ssml {
            SynthesisInput::Ssml(annotate(&utterance.text).into_string())
        } else {
            SynthesisInput::Text(strip_markup(&utterance.text))
        };
        let request = SynthesisRequest::new(input, &voice, &self.options);

        tracing::debug!(
            persona = %voice.persona,
            voice = %voice.voice_id,
            locale = %voice.locale,
            ssml = voice.ssml,
            "synthesizing utterance"
        );

        let (audio, fallback) = match self.service.synthesize(&request).await {
            Ok(audio) => (audio, false),
            Err(e) if voice.ssml && e.is_markup_rejection() => {
                tracing::warn!(
                    error = %e,
                    voice = %voice.voice_id,
                    "SSML rejected, retrying with plain text"
                );

                let retry = SynthesisRequest::minimal(
                    SynthesisInput::Text(strip_markup(&utterance.text)),
                    &voice,
                    self.options.encoding,
                );
                match self.service.synthesize(&retry).await {
                    Ok(audio) => (audio, true),
                    Err(retry_err) => {
                        tracing::error!(error = %retry_err, "plain-text retry failed");
                        return Err(Error::Synthesis {
                            locale: utterance.locale.clone(),
                            cause: format!("{e}; plain-text retry failed: {retry_err}"),
                        });
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, locale = %utterance.locale, "synthesis failed");
                return Err(Error::Synthesis {
                    locale: utterance.locale.clone(),
                    cause: e.to_string(),
                });
            }
        };

        let file = self.temp_file()?;
        tokio::fs::write(file.path(), &audio).await?;

        tracing::info!(
            persona = %voice.persona,
            voice = %voice.voice_id,
            bytes = audio.len(),
            fallback,
            "synthesis complete"
        );

        Ok(SynthesizedAudio {
            file,
            encoding: self.options.encoding,
            ssml: voice.ssml && !fallback,
            voice,
            fallback,
        })
    }

    fn temp_file(&self) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder
            .prefix("synth_")
            .suffix(self.options.encoding.extension());

        let file = match &self.options.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}
