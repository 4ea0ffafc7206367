//! Audio buffers, codecs and the persona effects chain

mod buffer;
mod effects;

pub use buffer::{
    AudioBuffer, DEFAULT_BITRATE_KBPS, OutputFormat, SAMPLE_RATE, db_to_gain, ms_to_frames,
};
pub use effects::{
    AudioEffects, EffectProfile, EffectsConfig, add_ambience, apply_effects, breath_count,
    high_pass, insert_breaths, low_pass, normalize, overlay,
};
