//! Persona audio effects
//!
//! A fixed chain applied to every synthesized clip:
//! low-band reinforcement, high-band reinforcement, peak normalization,
//! ambience bed, then breath pauses between windows. Reordering the
//! stages changes the result, so [`AudioEffects::apply`] is the only entry.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::buffer::{AudioBuffer, db_to_gain, ms_to_frames};
use crate::persona::{DEFAULT_PERSONA, Persona};

const AMBIENCE_SEED: u64 = 0x5eed_a4b1;
const BREATH_SEED: u64 = 0x0b4e_a7e5;

/// Per-persona equalization and clarity settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectProfile {
    /// Low-band factor; above 1.0 adds `bass - 1.0` dB of low end
    pub bass: f32,
    /// High-band factor; above 1.0 adds `treble - 1.0` dB of high end
    pub treble: f32,
    /// Above 1.0 enables peak normalization
    pub clarity: f32,
}

impl EffectProfile {
    #[must_use]
    pub const fn for_persona(persona: Persona) -> Self {
        match persona {
            Persona::Jax => Self {
                bass: 2.0,
                treble: 1.0,
                clarity: 1.5,
            },
            Persona::Viktor => Self {
                bass: 3.0,
                treble: 0.8,
                clarity: 1.2,
            },
            Persona::Lila => Self {
                bass: 0.8,
                treble: 1.4,
                clarity: 1.8,
            },
            Persona::Elias => Self {
                bass: 1.5,
                treble: 1.2,
                clarity: 1.3,
            },
        }
    }

    /// Profile for a persona identifier, defaulting for unknown ones
    #[must_use]
    pub fn lookup(persona: &str) -> Self {
        Persona::lookup(persona)
            .map_or(Self::for_persona(DEFAULT_PERSONA), Self::for_persona)
    }

    #[must_use]
    pub fn normalizes(&self) -> bool {
        self.clarity > 1.0
    }
}

/// Tunable levels and timings for the effects chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Low-pass cutoff for bass reinforcement
    pub low_cutoff_hz: f32,

    /// High-pass cutoff for treble reinforcement
    pub high_cutoff_hz: f32,

    /// Peak normalization headroom in dB below full scale
    pub headroom_db: f32,

    /// Ambience bed level; `None` disables it
    pub ambience_db: Option<f32>,

    /// Breath segment level
    pub breath_db: f32,

    /// Window between breaths
    pub breath_interval_ms: u64,

    /// Length of each breath; zero disables breath insertion
    pub breath_duration_ms: u64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            low_cutoff_hz: 250.0,
            high_cutoff_hz: 2000.0,
            headroom_db: 0.1,
            ambience_db: Some(-45.0),
            breath_db: -25.0,
            breath_interval_ms: 5000,
            breath_duration_ms: 300,
        }
    }
}

/// Applies the persona effects chain
#[derive(Debug, Clone, Default)]
pub struct AudioEffects {
    config: EffectsConfig,
}

impl AudioEffects {
    #[must_use]
    pub const fn new(config: EffectsConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &EffectsConfig {
        &self.config
    }

    /// Run the full chain for a persona
    ///
    /// Never fails. Output duration is never shorter than the input.
    #[must_use]
    pub fn apply(&self, mut buffer: AudioBuffer, persona: Persona) -> AudioBuffer {
        let profile = EffectProfile::for_persona(persona);
        let input_ms = buffer.duration_ms();

        if profile.bass > 1.0 {
            let mut low = buffer.clone();
            low_pass(&mut low, self.config.low_cutoff_hz);
            overlay(&mut buffer, &low, db_to_gain(profile.bass - 1.0));
        }

        if profile.treble > 1.0 {
            let mut high = buffer.clone();
            high_pass(&mut high, self.config.high_cutoff_hz);
            overlay(&mut buffer, &high, db_to_gain(profile.treble - 1.0));
        }

        if profile.normalizes() {
            normalize(&mut buffer, self.config.headroom_db);
        }

        if let Some(db) = self.config.ambience_db {
            add_ambience(&mut buffer, db);
        }

        let buffer = insert_breaths(
            &buffer,
            self.config.breath_interval_ms,
            self.config.breath_duration_ms,
            self.config.breath_db,
        );

        tracing::debug!(
            persona = %persona,
            input_ms,
            output_ms = buffer.duration_ms(),
            "applied audio effects"
        );

        buffer
    }
}

/// Run the default effects chain for a persona identifier
#[must_use]
pub fn apply_effects(buffer: AudioBuffer, persona: &str) -> AudioBuffer {
    AudioEffects::default()
        .apply(buffer, Persona::lookup_or_default(persona))
}

/// Number of breaths inserted into `frames` frames with `window` frames per window
#[must_use]
pub const fn breath_count(frames: usize, window: usize) -> usize {
    if frames == 0 || window == 0 {
        return 0;
    }
    frames.div_ceil(window) - 1
}

/// Single-pole low-pass, applied per channel in place
pub fn low_pass(buffer: &mut AudioBuffer, cutoff_hz: f32) {
    let (dt, rc) = filter_constants(buffer.sample_rate(), cutoff_hz);
    let alpha = dt / (rc + dt);
    let channels = usize::from(buffer.channels());

    for ch in 0..channels {
        let mut prev: Option<f32> = None;
        for frame in buffer.samples_mut().chunks_exact_mut(channels) {
            let x = frame[ch];
            let y = prev.map_or(x, |p| alpha.mul_add(x - p, p));
            frame[ch] = y;
            prev = Some(y);
        }
    }
}

/// Single-pole high-pass, applied per channel in place
pub fn high_pass(buffer: &mut AudioBuffer, cutoff_hz: f32) {
    let (dt, rc) = filter_constants(buffer.sample_rate(), cutoff_hz);
    let alpha = rc / (rc + dt);
    let channels = usize::from(buffer.channels());

    for ch in 0..channels {
        let mut prev: Option<(f32, f32)> = None;
        for frame in buffer.samples_mut().chunks_exact_mut(channels) {
            let x = frame[ch];
            let y = prev.map_or(x, |(px, py)| alpha * (py + x - px));
            frame[ch] = y;
            prev = Some((x, y));
        }
    }
}

/// Mix `layer` scaled by `gain` over `base`, saturating at full scale
pub fn overlay(base: &mut AudioBuffer, layer: &AudioBuffer, gain: f32) {
    for (b, l) in base.samples_mut().iter_mut().zip(layer.samples()) {
        *b = l.mul_add(gain, *b).clamp(-1.0, 1.0);
    }
}

/// Scale so the loudest peak sits `headroom_db` below full scale
///
/// Silent buffers are left alone.
pub fn normalize(buffer: &mut AudioBuffer, headroom_db: f32) {
    let peak = buffer.peak();
    if peak <= f32::EPSILON {
        return;
    }

    let gain = db_to_gain(-headroom_db) / peak;
    for s in buffer.samples_mut() {
        *s *= gain;
    }
}

/// Mix a seeded low-level noise bed over the whole buffer
pub fn add_ambience(buffer: &mut AudioBuffer, level_db: f32) {
    let amplitude = db_to_gain(level_db);
    let mut rng = StdRng::seed_from_u64(AMBIENCE_SEED);

    for s in buffer.samples_mut() {
        let noise = rng.gen_range(-amplitude..=amplitude);
        *s = (*s + noise).clamp(-1.0, 1.0);
    }
}

/// Splice a breath after every full window except the last
///
/// Output length is the input plus `breath_count` breaths.
#[must_use]
pub fn insert_breaths(
    buffer: &AudioBuffer,
    interval_ms: u64,
    breath_ms: u64,
    breath_db: f32,
) -> AudioBuffer {
    let rate = buffer.sample_rate();
    let channels = usize::from(buffer.channels());
    let window = ms_to_frames(interval_ms, rate) * channels;
    let breath = breath_segment(ms_to_frames(breath_ms, rate), channels, breath_db);

    if window == 0 || breath.is_empty() || buffer.samples().len() <= window {
        return buffer.clone();
    }

    let breaths = breath_count(buffer.samples().len(), window);
    let mut out = Vec::with_capacity(buffer.samples().len() + breaths * breath.len());

    let mut chunks = buffer.samples().chunks(window).peekable();
    while let Some(chunk) = chunks.next() {
        out.extend_from_slice(chunk);
        if chunks.peek().is_some() {
            out.extend_from_slice(&breath);
        }
    }

    AudioBuffer::new(out, rate, buffer.channels())
}

/// Quiet, enveloped noise standing in for an inhale
fn breath_segment(frames: usize, channels: usize, level_db: f32) -> Vec<f32> {
    let amplitude = db_to_gain(level_db);
    let mut rng = StdRng::seed_from_u64(BREATH_SEED);
    let mut out = Vec::with_capacity(frames * channels);

    #[allow(clippy::cast_precision_loss)]
    for i in 0..frames {
        let envelope = (PI * i as f32 / frames as f32).sin();
        let sample = rng.gen_range(-amplitude..=amplitude) * envelope;
        out.extend(std::iter::repeat_n(sample, channels));
    }

    out
}

#[allow(clippy::cast_precision_loss)]
fn filter_constants(sample_rate: u32, cutoff_hz: f32) -> (f32, f32) {
    let rc = 1.0 / (cutoff_hz.max(1.0) * 2.0 * PI);
    let dt = 1.0 / sample_rate as f32;
    (dt, rc)
}
