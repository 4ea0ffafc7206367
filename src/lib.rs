//! Character Voice - Persona speech output for character chatbots
//!
//! This library turns a chatbot reply into finished persona audio:
//! - Prosody markup (pauses, emphasis, breaths, pacing)
//! - Persona voice lookup across locales
//! - Cloud speech synthesis with a plain-text fallback
//! - Persona audio effects and MP3/WAV encoding
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Reply text + locale + persona           │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Voice Pipeline                       │
//! │  Translate │ Prosody │ Voice Catalog │ Synthesizer  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Audio Effects                        │
//! │  EQ  │  Normalize  │  Ambience  │  Breaths  │ Encode │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod persona;
pub mod pipeline;
pub mod translate;
pub mod voice;

pub use audio::{AudioBuffer, AudioEffects, EffectProfile, OutputFormat, apply_effects};
pub use config::Config;
pub use error::{Error, Result};
pub use persona::{DEFAULT_PERSONA, Persona};
pub use pipeline::{SpeechReport, VoicePipeline};
pub use translate::{GoogleTranslator, Translator};
pub use voice::{
    GoogleTts, MarkupDocument, SpeechSynthesizer, SynthesizedAudio, Synthesizer, Utterance,
    VoiceCatalog, VoiceProfile, annotate,
};
