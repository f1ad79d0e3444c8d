//! Closed archetype and mood sets.
//!
//! Unknown tags from input must be defaulted at the boundary (Gentle /
//! Calm) — they are never stored raw.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Personality preset. Each archetype owns a fixed trait table
/// (see `PersonaEngine::trait_table`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Gentle,
    Rational,
    Humorous,
    Outgoing,
    Caring,
    Creative,
    Analytical,
    Empathetic,
    Tsundere,
}

impl Archetype {
    pub const ALL: [Archetype; 9] = [
        Archetype::Gentle,
        Archetype::Rational,
        Archetype::Humorous,
        Archetype::Outgoing,
        Archetype::Caring,
        Archetype::Creative,
        Archetype::Analytical,
        Archetype::Empathetic,
        Archetype::Tsundere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Gentle => "gentle",
            Archetype::Rational => "rational",
            Archetype::Humorous => "humorous",
            Archetype::Outgoing => "outgoing",
            Archetype::Caring => "caring",
            Archetype::Creative => "creative",
            Archetype::Analytical => "analytical",
            Archetype::Empathetic => "empathetic",
            Archetype::Tsundere => "tsundere",
        }
    }

    /// One-line character description used in prompt assembly.
    pub fn description(&self) -> &'static str {
        match self {
            Archetype::Gentle => "你性格温柔、耐心、富有同理心",
            Archetype::Rational => "你性格理性、逻辑性强",
            Archetype::Humorous => "你性格幽默、风趣",
            Archetype::Outgoing => "你性格外向、热情",
            Archetype::Caring => "你性格关怀、支持性强",
            Archetype::Creative => "你性格富有创造力、想象力",
            Archetype::Analytical => "你性格分析性强、注重细节",
            Archetype::Empathetic => "你性格高度共情、情感智能",
            Archetype::Tsundere => "你性格傲娇，嘴上不饶人但内心关怀",
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Archetype {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gentle" => Ok(Archetype::Gentle),
            "rational" => Ok(Archetype::Rational),
            "humorous" => Ok(Archetype::Humorous),
            "outgoing" => Ok(Archetype::Outgoing),
            "caring" => Ok(Archetype::Caring),
            "creative" => Ok(Archetype::Creative),
            "analytical" => Ok(Archetype::Analytical),
            "empathetic" => Ok(Archetype::Empathetic),
            "tsundere" => Ok(Archetype::Tsundere),
            _ => Err(()),
        }
    }
}

impl Default for Archetype {
    fn default() -> Self {
        Archetype::Gentle
    }
}

/// Short-lived emotional tone, distinct from the longer-lived archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Calm,
    Excited,
    Thoughtful,
    Concerned,
    Playful,
    Serious,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Excited => "excited",
            Mood::Thoughtful => "thoughtful",
            Mood::Concerned => "concerned",
            Mood::Playful => "playful",
            Mood::Serious => "serious",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mood::Happy => "你现在心情很好，充满正能量",
            Mood::Calm => "你现在很平静，思维清晰",
            Mood::Excited => "你现在很兴奋，充满热情",
            Mood::Thoughtful => "你现在很深思，善于思考",
            Mood::Concerned => "你现在有些担心，更加关注用户的状态",
            Mood::Playful => "你现在很活泼，喜欢轻松的互动",
            Mood::Serious => "你现在很严肃，专注于解决问题",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "calm" => Ok(Mood::Calm),
            "excited" => Ok(Mood::Excited),
            "thoughtful" => Ok(Mood::Thoughtful),
            "concerned" => Ok(Mood::Concerned),
            "playful" => Ok(Mood::Playful),
            "serious" => Ok(Mood::Serious),
            _ => Err(()),
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Calm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archetype_round_trips_through_str() {
        for archetype in Archetype::ALL {
            assert_eq!(archetype.as_str().parse::<Archetype>(), Ok(archetype));
        }
    }

    #[test]
    fn unknown_archetype_is_an_error() {
        assert!("heroic".parse::<Archetype>().is_err());
    }

    #[test]
    fn default_mood_is_calm() {
        assert_eq!(Mood::default(), Mood::Calm);
    }
}
