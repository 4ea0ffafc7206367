//! Speech pipeline integration tests
//!
//! Drives the full text-to-file path against a scripted synthesis backend.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use character_voice::voice::SynthesisInput;
use character_voice::{
    AudioBuffer, Error, OutputFormat, Persona, Result, Translator, Utterance, VoicePipeline,
};
use tempfile::TempDir;

mod common;
use common::{ScriptedSynthesizer, entries, markup_rejected, test_config, tone_wav};

const JAX_EN: &str = "en-US-Chirp3-HD-Fenrir";

fn pipeline(
    temp: &TempDir,
    ssml_voices: &[&str],
    responses: Vec<Result<Vec<u8>>>,
) -> (VoicePipeline, Arc<ScriptedSynthesizer>) {
    let service = Arc::new(ScriptedSynthesizer::new(responses));
    let config = test_config(temp.path(), ssml_voices);
    (VoicePipeline::with_service(&config, service.clone()), service)
}

#[tokio::test]
async fn test_ssml_voice_receives_markup() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(&temp, &[JAX_EN], vec![Ok(tone_wav())]);

    let utterance = Utterance::new("Hello, world. This is important!", "en-US", "jax");
    let report = pipeline
        .speak(&utterance, &out.path().join("reply.wav"))
        .await
        .unwrap();

    assert!(report.ssml);
    assert!(!report.fallback);
    assert_eq!(report.sentences, 2);
    assert_eq!(report.persona, Persona::Jax);
    assert_eq!(report.format, OutputFormat::Wav);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let SynthesisInput::Ssml(ssml) = &requests[0].input else {
        panic!("expected SSML input, got {:?}", requests[0].input);
    };
    assert!(ssml.starts_with("<speak>"));
    assert!(ssml.contains(r#"<emphasis level="moderate">important</emphasis>"#));
    assert_eq!(requests[0].sample_rate_hertz, Some(24000));
}

#[tokio::test]
async fn test_markup_rejection_retries_once_as_plain_text() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(
        &temp,
        &[JAX_EN],
        vec![Err(markup_rejected()), Ok(tone_wav())],
    );

    let utterance = Utterance::new("Wait, what? No way!", "en-US", "jax");
    let report = pipeline
        .speak(&utterance, &out.path().join("reply.wav"))
        .await
        .unwrap();

    assert!(report.fallback);
    assert!(!report.ssml);

    let requests = service.requests();
    assert_eq!(requests.len(), 2);

    let (first, retry) = (&requests[0], &requests[1]);
    assert!(first.input.is_ssml());
    assert_eq!(
        retry.input,
        SynthesisInput::Text("Wait, what? No way!".to_string())
    );
    assert_eq!(retry.voice_id, first.voice_id);
    assert!(
        (retry.speaking_rate - first.speaking_rate).abs() < f32::EPSILON
    );
    assert_eq!(retry.sample_rate_hertz, None);
    assert_eq!(retry.effects_profile, None);
}

#[tokio::test]
async fn test_failed_retry_is_synthesis_error() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let output = out.path().join("reply.wav");
    let (pipeline, service) = pipeline(
        &temp,
        &[JAX_EN],
        vec![Err(markup_rejected()), Err(markup_rejected())],
    );

    let err = pipeline
        .speak(&Utterance::new("Hello there.", "en-US", "jax"), &output)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Synthesis { ref locale, .. } if locale == "en-US"));
    assert_eq!(service.requests().len(), 2);
    assert!(!output.exists());
    assert_eq!(entries(temp.path()), 0);
}

#[tokio::test]
async fn test_non_markup_failure_is_not_retried() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(
        &temp,
        &[JAX_EN],
        vec![Err(Error::Tts("quota exceeded".to_string()))],
    );

    let err = pipeline
        .speak(
            &Utterance::new("Hello there.", "hi-IN", "jax"),
            &out.path().join("reply.wav"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Synthesis { ref locale, .. } if locale == "hi-IN"));
    assert!(err.to_string().contains("hi-IN"));
    assert_eq!(service.requests().len(), 1);
}

#[tokio::test]
async fn test_markup_rejection_on_plain_voice_is_not_retried() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(
        &temp,
        &[],
        vec![Err(markup_rejected()), Ok(tone_wav())],
    );

    let err = pipeline
        .speak(
            &Utterance::new("Hello there.", "en-US", "jax"),
            &out.path().join("reply.wav"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Synthesis { ref locale, .. } if locale == "en-US"));
    assert_eq!(service.requests().len(), 1);
    assert!(!service.requests()[0].input.is_ssml());
}

#[tokio::test]
async fn test_plain_voice_never_receives_markup() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);

    let report = pipeline
        .speak(
            &Utterance::new("<b>Really</b>, truly.", "fr-FR", "lila"),
            &out.path().join("reply.wav"),
        )
        .await
        .unwrap();

    assert!(!report.ssml);
    let requests = service.requests();
    assert_eq!(
        requests[0].input,
        SynthesisInput::Text("Really, truly.".to_string())
    );
    assert_eq!(requests[0].voice_id, "fr-FR-Chirp3-HD-Aoede");
}

#[tokio::test]
async fn test_unknown_persona_and_locale_use_defaults() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);

    let report = pipeline
        .speak(
            &Utterance::new("Hi.", "xx-XX", "zzz"),
            &out.path().join("reply.wav"),
        )
        .await
        .unwrap();

    assert_eq!(report.persona, Persona::Jax);
    assert_eq!(report.locale, "en-US");
    assert_eq!(service.requests()[0].voice_id, JAX_EN);
}

#[tokio::test]
async fn test_output_artifact_and_temp_cleanup() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let output = out.path().join("reply.wav");
    let (pipeline, _service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);

    let report = pipeline
        .speak(&Utterance::new("Hello.", "en-US", "elias"), &output)
        .await
        .unwrap();

    assert!(output.exists());
    assert_eq!(entries(temp.path()), 0);
    assert!(report.duration_ms >= 500);

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len(), report.bytes);

    let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.spec().sample_rate, 24000);
}

#[tokio::test]
async fn test_failed_write_leaves_no_staged_file() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let output = out.path().join("reply.wav");
    std::fs::create_dir(&output).unwrap();
    let (pipeline, _service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);

    let err = pipeline
        .speak(&Utterance::new("Hello.", "en-US", "elias"), &output)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(output.is_dir());
    assert_eq!(entries(out.path()), 1);
    assert_eq!(entries(temp.path()), 0);
}

#[tokio::test]
async fn test_mp3_output() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let output = out.path().join("reply.mp3");
    let (pipeline, _service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);

    let report = pipeline
        .speak(&Utterance::new("Hello.", "en-US", "viktor"), &output)
        .await
        .unwrap();

    assert_eq!(report.format, OutputFormat::Mp3);

    let bytes = std::fs::read(&output).unwrap();
    let decoded = AudioBuffer::decode_mp3(&bytes, 24000).unwrap();
    assert!(!decoded.is_empty());
}

#[tokio::test]
async fn test_synthesized_audio_removed_on_drop() {
    let temp = TempDir::new().unwrap();
    let (pipeline, _service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);

    let audio = pipeline
        .synthesizer()
        .synthesize(&Utterance::new("Hello.", "en-US", "jax"))
        .await
        .unwrap();

    let path = audio.path().to_path_buf();
    assert!(path.exists());
    let name = path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("synth_"));

    drop(audio);
    assert!(!path.exists());
}

struct FixedTranslator(Option<&'static str>);

#[async_trait]
impl Translator for FixedTranslator {
    async fn translate(&self, _text: &str, target_language: &str) -> Result<String> {
        assert_eq!(target_language, "hi");
        self.0
            .map(ToString::to_string)
            .ok_or_else(|| Error::Translation("service unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_translation_before_synthesis() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);
    let pipeline = pipeline.with_translator(Arc::new(FixedTranslator(Some("नमस्ते"))));

    let report = pipeline
        .speak(
            &Utterance::new("Hello.", "hi-IN", "lila"),
            &out.path().join("reply.wav"),
        )
        .await
        .unwrap();

    assert!(report.translated);
    assert_eq!(report.text, "नमस्ते");
    assert_eq!(
        service.requests()[0].input,
        SynthesisInput::Text("नमस्ते".to_string())
    );
}

#[tokio::test]
async fn test_translation_failure_speaks_original() {
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let (pipeline, service) = pipeline(&temp, &[], vec![Ok(tone_wav())]);
    let pipeline = pipeline.with_translator(Arc::new(FixedTranslator(None)));

    let report = pipeline
        .speak(
            &Utterance::new("Hello.", "hi-IN", "lila"),
            &out.path().join("reply.wav"),
        )
        .await
        .unwrap();

    assert!(!report.translated);
    assert_eq!(
        service.requests()[0].input,
        SynthesisInput::Text("Hello.".to_string())
    );
}
