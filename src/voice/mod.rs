//! Voice output
//!
//! Prosody markup, persona voice lookup, and the synthesis invoker.
//! Audio post-processing lives in [`crate::audio`].

mod catalog;
pub mod prosody;
mod tts;

pub use catalog::{
    DEFAULT_LOCALE, SUPPORTED_LOCALES, VoiceCatalog, VoiceGender, VoiceProfile,
};
pub use prosody::{MarkupDocument, annotate, sentence_boundaries, strip_markup};
pub use tts::{
    AudioEncoding, DEFAULT_EFFECTS_PROFILE, GOOGLE_TTS_ENDPOINT, GoogleAuth, GoogleTts,
    SpeechSynthesizer, SynthesisInput, SynthesisOptions, SynthesisRequest, SynthesizedAudio,
    Synthesizer, Utterance,
};
