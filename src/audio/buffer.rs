//! PCM buffer plus MP3/WAV codecs

use std::io::Cursor;
use std::path::Path;

use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm, Quality};

use crate::{Error, Result};

/// Sample rate requested from the synthesis service
pub const SAMPLE_RATE: u32 = 24000;

/// Bitrate for exported MP3 artifacts
pub const DEFAULT_BITRATE_KBPS: u32 = 192;

/// Container for the finished artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
}

impl OutputFormat {
    /// Guess from a file extension, defaulting to MP3
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => Self::Wav,
            _ => Self::Mp3,
        }
    }
}

/// Interleaved `f32` PCM in `[-1.0, 1.0]`
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Wrap interleaved samples
    ///
    /// A zero channel count is treated as mono, and a trailing partial
    /// frame is dropped.
    #[must_use]
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % usize::from(channels);
        samples.truncate(whole);

        Self {
            samples,
            sample_rate: sample_rate.max(1),
            channels,
        }
    }

    /// Digital silence of the given length
    #[must_use]
    pub fn silent(duration_ms: u64, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let frames = ms_to_frames(duration_ms, sample_rate);
        Self::new(
            vec![0.0; frames * usize::from(channels)],
            sample_rate,
            channels,
        )
    }

    /// Interleaved samples
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutable interleaved samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Consume into interleaved samples
    #[must_use]
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel)
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in whole milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1000 / u64::from(self.sample_rate)
    }

    /// Loudest absolute sample
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }

    /// Decode MP3 bytes, keeping the stream's rate and channel layout
    ///
    /// `fallback_rate` is used when the stream carries no frames.
    ///
    /// # Errors
    ///
    /// Returns error if the stream is corrupt
    pub fn decode_mp3(mp3_data: &[u8], fallback_rate: u32) -> Result<Self> {
        let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
        let mut samples = Vec::new();
        let mut sample_rate = fallback_rate;
        let mut channels = 1;

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    sample_rate = u32::try_from(frame.sample_rate).unwrap_or(fallback_rate);
                    channels = u16::try_from(frame.channels).unwrap_or(1);
                    let pcm = frame.data.iter().map(|&s| f32::from(s) / 32768.0);
                    samples.extend(pcm);
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
            }
        }

        tracing::debug!(
            bytes = mp3_data.len(),
            samples = samples.len(),
            sample_rate,
            channels,
            "decoded MP3"
        );

        Ok(Self::new(samples, sample_rate, channels))
    }

    /// Encode as 16-bit PCM WAV
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding fails
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| Error::Audio(e.to_string()))?;

            for &sample in &self.samples {
                writer
                    .write_sample(to_i16(sample))
                    .map_err(|e| Error::Audio(e.to_string()))?;
            }

            writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }

    /// Encode as constant-bitrate MP3
    ///
    /// Bitrates between the encoder's steps round down; buffers with more
    /// than two channels keep only the first two.
    ///
    /// # Errors
    ///
    /// Returns error if the encoder rejects the configuration
    pub fn to_mp3(&self, bitrate_kbps: u32) -> Result<Vec<u8>> {
        let channels = self.channels.min(2);

        let mut builder = Builder::new()
            .ok_or_else(|| Error::Audio("failed to create LAME encoder".to_string()))?;
        builder
            .set_num_channels(u8::try_from(channels).unwrap_or(2))
            .map_err(|e| Error::Audio(format!("MP3 channels: {e:?}")))?;
        builder
            .set_sample_rate(self.sample_rate)
            .map_err(|e| Error::Audio(format!("MP3 sample rate: {e:?}")))?;
        builder
            .set_brate(bitrate(bitrate_kbps))
            .map_err(|e| Error::Audio(format!("MP3 bitrate: {e:?}")))?;
        builder
            .set_quality(Quality::Best)
            .map_err(|e| Error::Audio(format!("MP3 quality: {e:?}")))?;
        let mut encoder = builder
            .build()
            .map_err(|e| Error::Audio(format!("MP3 encoder init: {e:?}")))?;

        let frames = self.frames();
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(frames));

        if channels == 1 {
            let pcm: Vec<i16> = self.samples.iter().map(|&s| to_i16(s)).collect();
            encoder
                .encode_to_vec(MonoPcm(&pcm), &mut out)
                .map_err(|e| Error::Audio(format!("MP3 encode: {e:?}")))?;
        } else {
            let stride = usize::from(self.channels);
            let (left, right): (Vec<i16>, Vec<i16>) = self
                .samples
                .chunks_exact(stride)
                .map(|frame| (to_i16(frame[0]), to_i16(frame[1])))
                .unzip();
            let pcm = DualPcm {
                left: &left,
                right: &right,
            };
            encoder
                .encode_to_vec(pcm, &mut out)
                .map_err(|e| Error::Audio(format!("MP3 encode: {e:?}")))?;
        }

        out.reserve(7200);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| Error::Audio(format!("MP3 flush: {e:?}")))?;

        Ok(out)
    }

    /// Encode in the requested container
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub fn encode(&self, format: OutputFormat, bitrate_kbps: u32) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Mp3 => self.to_mp3(bitrate_kbps),
            OutputFormat::Wav => self.to_wav(),
        }
    }
}

/// Convert milliseconds to a frame count at `sample_rate`
#[must_use]
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    let frames = ms * u64::from(sample_rate) / 1000;
    usize::try_from(frames).unwrap_or(usize::MAX)
}

/// Convert decibels to a linear amplitude factor
#[must_use]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[allow(clippy::cast_possible_truncation)]
fn to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

const fn bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=15 => Bitrate::Kbps8,
        16..=23 => Bitrate::Kbps16,
        24..=31 => Bitrate::Kbps24,
        32..=39 => Bitrate::Kbps32,
        40..=47 => Bitrate::Kbps40,
        48..=63 => Bitrate::Kbps48,
        64..=79 => Bitrate::Kbps64,
        80..=95 => Bitrate::Kbps80,
        96..=111 => Bitrate::Kbps96,
        112..=127 => Bitrate::Kbps112,
        128..=159 => Bitrate::Kbps128,
        160..=191 => Bitrate::Kbps160,
        192..=223 => Bitrate::Kbps192,
        224..=255 => Bitrate::Kbps224,
        256..=319 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}
