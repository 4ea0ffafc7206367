//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use character_voice::audio::AudioBuffer;
use character_voice::voice::{AudioEncoding, SpeechSynthesizer, SynthesisRequest};
use character_voice::{Config, Error, Result};

/// Synthesis backend that replays scripted results and records requests
#[derive(Default)]
pub struct ScriptedSynthesizer {
    responses: Mutex<VecDeque<Result<Vec<u8>>>>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl ScriptedSynthesizer {
    pub fn new(responses: impl IntoIterator<Item = Result<Vec<u8>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Tts("no scripted response left".to_string())))
    }
}

/// Half a second of a quiet 220 Hz tone as 16-bit WAV
pub fn tone_wav() -> Vec<u8> {
    let rate = 24000;
    #[allow(clippy::cast_precision_loss)]
    let step = 2.0 * std::f32::consts::PI * 220.0 / rate as f32;
    #[allow(clippy::cast_precision_loss)]
    let samples = (0..rate / 2)
        .map(|i| 0.2 * (step * i as f32).sin())
        .collect();

    AudioBuffer::new(samples, rate, 1)
        .to_wav()
        .expect("failed to encode test tone")
}

pub fn markup_rejected() -> Error {
    Error::MarkupRejected("Invalid SSML: unexpected tag".to_string())
}

/// Config that writes LINEAR16 temp files into `temp_dir`
pub fn test_config(temp_dir: &Path, ssml_voices: &[&str]) -> Config {
    let mut config = Config::default();
    config.synthesis.encoding = AudioEncoding::Linear16;
    config.synthesis.temp_dir = Some(temp_dir.to_path_buf());
    config.ssml_voices = ssml_voices.iter().map(ToString::to_string).collect();
    config
}

/// Number of entries in a directory
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(Iterator::count).unwrap_or(0)
}
