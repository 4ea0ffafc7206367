//! Persona voice catalog
//!
//! Maps a persona and a BCP 47 locale to a concrete Google Cloud voice.
//! The table is two-level data (persona → locale → voice) built once at
//! startup and never mutated.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::persona::{DEFAULT_PERSONA, Persona};

/// Locale used when a persona has no voice for the requested one
pub const DEFAULT_LOCALE: &str = "en-US";

/// Locales every persona has a voice for
pub const SUPPORTED_LOCALES: [&str; 14] = [
    "en-US", "hi-IN", "ta-IN", "kn-IN", "te-IN", "ml-IN", "bn-IN", "mr-IN", "gu-IN", "pa-IN",
    "ja-JP", "fr-FR", "de-DE", "es-US",
];

/// Grammatical gender requested from the synthesis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    Male,
    Female,
    Neutral,
}

/// A resolved synthesis voice
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    /// Persona this voice belongs to (after default fallback)
    pub persona: Persona,

    /// Locale the voice speaks (after default fallback)
    pub locale: String,

    /// Service voice name, e.g. `en-US-Chirp3-HD-Fenrir`
    pub voice_id: String,

    /// Requested gender
    pub gender: VoiceGender,

    /// Base speaking rate (1.0 is normal)
    pub speaking_rate: f32,

    /// Voice honors inline SSML directives
    pub ssml: bool,
}

struct PersonaVoices {
    gender: VoiceGender,
    speaking_rate: f32,
    default_locale: &'static str,
    voices: BTreeMap<&'static str, &'static str>,
}

/// Static persona × locale voice table plus the SSML allow-list
pub struct VoiceCatalog {
    personas: BTreeMap<Persona, PersonaVoices>,
    ssml_voices: HashSet<String>,
}

impl VoiceCatalog {
    /// Build the built-in table with an empty SSML allow-list
    #[must_use]
    pub fn new() -> Self {
        let personas = Persona::ALL
            .into_iter()
            .map(|persona| (persona, builtin_voices(persona)))
            .collect();

        Self {
            personas,
            ssml_voices: HashSet::new(),
        }
    }

    /// Mark voices as SSML-capable
    #[must_use]
    pub fn with_ssml_voices<I, S>(mut self, voices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ssml_voices.extend(voices.into_iter().map(Into::into));
        self
    }

    /// Whether a voice is on the SSML allow-list
    #[must_use]
    pub fn supports_ssml(&self, voice_id: &str) -> bool {
        self.ssml_voices.contains(voice_id)
    }

    /// Resolve a persona identifier and locale to a voice
    ///
    /// Never fails: unknown personas resolve as the default persona and
    /// unknown locales as the persona's default locale.
    #[must_use]
    pub fn resolve(&self, persona: &str, locale: &str) -> VoiceProfile {
        self.resolve_persona(Persona::lookup_or_default(persona), locale)
    }

    /// Resolve a known persona and a locale to a voice
    #[must_use]
    pub fn resolve_persona(&self, persona: Persona, locale: &str) -> VoiceProfile {
        let (persona, entry) = self.personas.get_key_value(&persona).map_or_else(
            || {
                let entry = &self.personas[&DEFAULT_PERSONA];
                (DEFAULT_PERSONA, entry)
            },
            |(p, e)| (*p, e),
        );

        let (locale, voice_id) = entry
            .voices
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(locale.trim()))
            .map_or_else(
                || {
                    tracing::debug!(
                        persona = %persona,
                        locale,
                        fallback = entry.default_locale,
                        "no voice for locale, using persona default"
                    );
                    (entry.default_locale, entry.voices[entry.default_locale])
                },
                |(l, v)| (*l, *v),
            );

        VoiceProfile {
            persona,
            locale: locale.to_string(),
            voice_id: voice_id.to_string(),
            gender: entry.gender,
            speaking_rate: entry.speaking_rate,
            ssml: self.supports_ssml(voice_id),
        }
    }

    /// Every (persona, voice) pair in table order
    pub fn voices(&self) -> impl Iterator<Item = VoiceProfile> + '_ {
        self.personas.iter().flat_map(move |(persona, entry)| {
            entry.voices.iter().map(move |(locale, voice_id)| VoiceProfile {
                persona: *persona,
                locale: (*locale).to_string(),
                voice_id: (*voice_id).to_string(),
                gender: entry.gender,
                speaking_rate: entry.speaking_rate,
                ssml: self.supports_ssml(voice_id),
            })
        })
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_voices(persona: Persona) -> PersonaVoices {
    let (gender, speaking_rate, names): (VoiceGender, f32, [&'static str; 14]) = match persona {
        Persona::Jax => (
            VoiceGender::Male,
            0.95,
            [
                "en-US-Chirp3-HD-Fenrir",
                "hi-IN-Chirp3-HD-Fenrir",
                "ta-IN-Chirp3-HD-Fenrir",
                "kn-IN-Chirp3-HD-Fenrir",
                "te-IN-Chirp3-HD-Fenrir",
                "ml-IN-Chirp3-HD-Fenrir",
                "bn-IN-Chirp3-HD-Fenrir",
                "mr-IN-Chirp3-HD-Fenrir",
                "gu-IN-Chirp3-HD-Fenrir",
                "pa-IN-Wavenet-B",
                "ja-JP-Chirp3-HD-Fenrir",
                "fr-FR-Chirp3-HD-Fenrir",
                "de-DE-Chirp3-HD-Fenrir",
                "es-US-Chirp3-HD-Fenrir",
            ],
        ),
        Persona::Viktor => (
            VoiceGender::Male,
            0.9,
            [
                "en-US-Chirp3-HD-Puck",
                "hi-IN-Chirp3-HD-Puck",
                "ta-IN-Chirp3-HD-Orus",
                "kn-IN-Chirp3-HD-Orus",
                "te-IN-Chirp3-HD-Puck",
                "ml-IN-Chirp3-HD-Puck",
                "bn-IN-Chirp3-HD-Puck",
                "mr-IN-Chirp3-HD-Puck",
                "gu-IN-Chirp3-HD-Puck",
                "pa-IN-Wavenet-D",
                "ja-JP-Chirp3-HD-Charon",
                "fr-FR-Chirp3-HD-Puck",
                "de-DE-Chirp3-HD-Puck",
                "es-US-Chirp-HD-D",
            ],
        ),
        Persona::Lila => (
            VoiceGender::Female,
            1.0,
            [
                "en-US-Chirp3-HD-Aoede",
                "hi-IN-Chirp3-HD-Aoede",
                "ta-IN-Chirp3-HD-Leda",
                "kn-IN-Chirp3-HD-Leda",
                "te-IN-Chirp3-HD-Aoede",
                "ml-IN-Chirp3-HD-Aoede",
                "bn-IN-Chirp3-HD-Aoede",
                "mr-IN-Chirp3-HD-Aoede",
                "gu-IN-Chirp3-HD-Aoede",
                "pa-IN-Wavenet-A",
                "ja-JP-Chirp3-HD-Aoede",
                "fr-FR-Chirp3-HD-Aoede",
                "de-DE-Chirp3-HD-Aoede",
                "es-US-Chirp-HD-F",
            ],
        ),
        Persona::Elias => (
            VoiceGender::Male,
            0.92,
            [
                "en-US-Chirp3-HD-Charon",
                "hi-IN-Chirp3-HD-Charon",
                "ta-IN-Chirp3-HD-Charon",
                "kn-IN-Chirp3-HD-Charon",
                "te-IN-Chirp3-HD-Charon",
                "ml-IN-Chirp3-HD-Charon",
                "bn-IN-Chirp3-HD-Charon",
                "mr-IN-Chirp3-HD-Charon",
                "gu-IN-Chirp3-HD-Charon",
                "pa-IN-Wavenet-D",
                "ja-JP-Chirp3-HD-Charon",
                "fr-FR-Chirp3-HD-Charon",
                "de-DE-Chirp3-HD-Charon",
                "es-US-Chirp3-HD-Charon",
            ],
        ),
    };

    PersonaVoices {
        gender,
        speaking_rate,
        default_locale: DEFAULT_LOCALE,
        voices: SUPPORTED_LOCALES.into_iter().zip(names).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pair() {
        let catalog = VoiceCatalog::new();
        let voice = catalog.resolve("viktor", "ta-IN");

        assert_eq!(voice.persona, Persona::Viktor);
        assert_eq!(voice.voice_id, "ta-IN-Chirp3-HD-Orus");
        assert_eq!(voice.gender, VoiceGender::Male);
        assert!((voice.speaking_rate - 0.9).abs() < f32::EPSILON);
        assert!(!voice.ssml);
    }

    #[test]
    fn test_unknown_locale_uses_persona_default() {
        let catalog = VoiceCatalog::new();
        let voice = catalog.resolve("lila", "sw-KE");

        assert_eq!(voice.locale, "en-US");
        assert_eq!(voice.voice_id, "en-US-Chirp3-HD-Aoede");
        assert_eq!(voice.gender, VoiceGender::Female);
    }

    #[test]
    fn test_unknown_persona_matches_default_persona() {
        let catalog = VoiceCatalog::new();
        let default = catalog.resolve("jax", "en-US");

        assert_eq!(catalog.resolve("zzz", "en-US"), default);
        assert_eq!(catalog.resolve("zzz", "xx-XX"), default);
    }

    #[test]
    fn test_locale_match_ignores_case() {
        let catalog = VoiceCatalog::new();
        assert_eq!(
            catalog.resolve("elias", "DE-de").voice_id,
            "de-DE-Chirp3-HD-Charon"
        );
    }

    #[test]
    fn test_ssml_allow_list() {
        let catalog = VoiceCatalog::new()
            .with_ssml_voices(["en-US-Chirp3-HD-Puck"]);

        assert!(catalog.resolve("viktor", "en-US").ssml);
        assert!(!catalog.resolve("jax", "en-US").ssml);
    }

    #[test]
    fn test_every_persona_covers_every_locale() {
        let catalog = VoiceCatalog::new();
        assert_eq!(
            catalog.voices().count(),
            Persona::ALL.len() * SUPPORTED_LOCALES.len()
        );

        for persona in Persona::ALL {
            for locale in SUPPORTED_LOCALES {
                let voice = catalog.resolve_persona(persona, locale);
                assert_eq!(voice.locale, locale);
                assert!(voice.voice_id.starts_with(locale));
            }
        }
    }
}
