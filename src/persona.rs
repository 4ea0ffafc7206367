//! Persona identities
//!
//! The chatbot ships a fixed cast of four characters. Each one owns a voice
//! (see [`crate::voice::VoiceCatalog`]) and an audio effect profile (see
//! [`crate::audio::EffectProfile`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Persona used whenever a caller names one we don't know
pub const DEFAULT_PERSONA: Persona = Persona::Jax;

/// One of the fixed chatbot characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Jax,
    #[serde(alias = "victor")]
    Viktor,
    Lila,
    Elias,
}

impl Persona {
    /// Every persona, in display order
    pub const ALL: [Self; 4] = [Self::Jax, Self::Viktor, Self::Lila, Self::Elias];

    /// Stable lowercase identifier
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Jax => "jax",
            Self::Viktor => "viktor",
            Self::Lila => "lila",
            Self::Elias => "elias",
        }
    }

    /// Full character name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jax => "Jax Carter",
            Self::Viktor => "Victor Graves",
            Self::Lila => "Lila Moreau",
            Self::Elias => "Elias Sterling",
        }
    }

    /// Short title shown next to the character
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Jax => "Jax \"Wildcard\" Carter - The Funny One",
            Self::Viktor => "Victor Graves - The Rude One",
            Self::Lila => "Lila Moreau - The Flirt",
            Self::Elias => "Elias Sterling - The Helpful Mentor",
        }
    }

    /// Look up a persona by identifier, case-insensitively
    ///
    /// Accepts the `victor` spelling as an alias for [`Persona::Viktor`].
    #[must_use]
    pub fn lookup(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "jax" => Some(Self::Jax),
            "viktor" | "victor" => Some(Self::Viktor),
            "lila" => Some(Self::Lila),
            "elias" => Some(Self::Elias),
            _ => None,
        }
    }

    /// Look up a persona, falling back to [`DEFAULT_PERSONA`]
    #[must_use]
    pub fn lookup_or_default(id: &str) -> Self {
        Self::lookup(id).unwrap_or_else(|| {
            tracing::debug!(
                persona = id,
                default = DEFAULT_PERSONA.id(),
                "unknown persona, using default"
            );
            DEFAULT_PERSONA
        })
    }
}

impl Default for Persona {
    fn default() -> Self {
        DEFAULT_PERSONA
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Persona {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
            .ok_or_else(|| Error::Config(format!("unknown persona: {s}")))
    }
}
