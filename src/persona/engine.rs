//! Continuous persona-state adjustment.
//!
//! Not a discrete state machine: every user emotion pulls the current
//! trait vector a small step toward the trait tables of the archetypes
//! that emotion implies — exponential drift toward emotion-implied
//! targets. The session's own archetype never changes here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::emotion::EmotionKind;
use crate::persona::{Archetype, Mood};

/// Snapshot of a session's personality. Replaced wholesale on every
/// adjustment; all trait values stay clamped to [0, 1] and energy to
/// [0.1, 1.0].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaState {
    pub archetype: Archetype,
    pub traits: BTreeMap<String, f64>,
    pub mood: Mood,
    pub energy: f64,
    pub updated_at: DateTime<Utc>,
}

impl PersonaState {
    /// Traits above the "main trait" threshold, used for prompt context
    /// and response payloads.
    pub fn main_traits(&self) -> BTreeMap<String, f64> {
        self.traits
            .iter()
            .filter(|(_, v)| **v > 0.6)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

/// Per-archetype adjustment strength for each user emotion. Only the
/// four strongly-directional emotions steer traits; the rest leave the
/// trait vector untouched.
const EMOTION_INFLUENCE: &[(EmotionKind, &[(Archetype, f64)])] = &[
    (
        EmotionKind::Joy,
        &[
            (Archetype::Humorous, 0.3),
            (Archetype::Outgoing, 0.2),
            (Archetype::Creative, 0.4),
        ],
    ),
    (
        EmotionKind::Sadness,
        &[
            (Archetype::Empathetic, 0.4),
            (Archetype::Caring, 0.3),
            (Archetype::Gentle, 0.2),
        ],
    ),
    (
        EmotionKind::Anger,
        &[(Archetype::Rational, 0.3), (Archetype::Analytical, 0.2)],
    ),
    (
        EmotionKind::Fear,
        &[(Archetype::Caring, 0.3), (Archetype::Gentle, 0.4)],
    ),
];

/// Energy delta per emotion, scaled by confidence.
const ENERGY_DELTAS: &[(EmotionKind, f64)] = &[
    (EmotionKind::Joy, 0.1),
    (EmotionKind::Surprise, 0.2),
    (EmotionKind::Sadness, -0.1),
    (EmotionKind::Anger, 0.05),
    (EmotionKind::Fear, -0.05),
];

fn mood_for_emotion(emotion: EmotionKind) -> Mood {
    match emotion {
        EmotionKind::Joy => Mood::Happy,
        EmotionKind::Sadness => Mood::Concerned,
        EmotionKind::Anger => Mood::Serious,
        EmotionKind::Fear => Mood::Concerned,
        EmotionKind::Surprise => Mood::Excited,
        EmotionKind::Love => Mood::Playful,
        EmotionKind::Positive => Mood::Happy,
        EmotionKind::Negative => Mood::Thoughtful,
        EmotionKind::Neutral => Mood::Calm,
    }
}

/// Stateless engine over the static archetype tables.
#[derive(Debug, Clone, Default)]
pub struct PersonaEngine;

impl PersonaEngine {
    pub fn new() -> Self {
        Self
    }

    /// Baseline trait table for an archetype. Trait name sets differ
    /// per archetype on purpose: drift only moves traits both sides share.
    pub fn trait_table(archetype: Archetype) -> BTreeMap<String, f64> {
        let pairs: &[(&str, f64)] = match archetype {
            Archetype::Gentle => &[
                ("warmth", 0.9),
                ("patience", 0.8),
                ("empathy", 0.9),
                ("assertiveness", 0.3),
                ("playfulness", 0.4),
            ],
            Archetype::Rational => &[
                ("logic", 0.9),
                ("objectivity", 0.8),
                ("analytical", 0.9),
                ("emotional", 0.2),
                ("systematic", 0.8),
            ],
            Archetype::Humorous => &[
                ("playfulness", 0.9),
                ("wit", 0.8),
                ("lightness", 0.9),
                ("seriousness", 0.2),
                ("creativity", 0.7),
            ],
            Archetype::Outgoing => &[
                ("sociability", 0.9),
                ("enthusiasm", 0.8),
                ("expressiveness", 0.9),
                ("reserved", 0.1),
                ("energy", 0.8),
            ],
            Archetype::Caring => &[
                ("empathy", 0.9),
                ("supportiveness", 0.9),
                ("nurturing", 0.8),
                ("selfishness", 0.1),
                ("compassion", 0.9),
            ],
            Archetype::Creative => &[
                ("imagination", 0.9),
                ("originality", 0.8),
                ("flexibility", 0.8),
                ("conventional", 0.2),
                ("innovation", 0.9),
            ],
            Archetype::Analytical => &[
                ("logic", 0.9),
                ("detail_oriented", 0.8),
                ("systematic", 0.9),
                ("intuitive", 0.3),
                ("precision", 0.8),
            ],
            Archetype::Empathetic => &[
                ("empathy", 0.9),
                ("emotional_intelligence", 0.9),
                ("understanding", 0.8),
                ("detachment", 0.1),
                ("sensitivity", 0.9),
            ],
            Archetype::Tsundere => &[
                ("pride", 0.9),
                ("shyness", 0.8),
                ("caring", 0.8),
                ("denial", 0.9),
                ("vulnerability", 0.7),
                ("loyalty", 0.9),
                ("stubbornness", 0.8),
            ],
        };
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    /// Fresh state for an archetype: its baseline traits, calm mood,
    /// full energy. Pure and idempotent.
    pub fn default_state(&self, archetype: Archetype) -> PersonaState {
        PersonaState {
            archetype,
            traits: Self::trait_table(archetype),
            mood: Mood::Calm,
            energy: 1.0,
            updated_at: Utc::now(),
        }
    }

    /// Drift the persona toward the archetypes implied by the user's
    /// emotion. Returns a new state; the input is never mutated.
    pub fn adjust(
        &self,
        current: &PersonaState,
        emotion: EmotionKind,
        confidence: f64,
    ) -> PersonaState {
        let mut traits = current.traits.clone();
        let mut mood = current.mood;
        let mut energy = current.energy;

        // Cumulative drift across every archetype the emotion implies.
        if let Some((_, influences)) = EMOTION_INFLUENCE.iter().find(|(e, _)| *e == emotion) {
            for (target_archetype, strength) in *influences {
                let factor = confidence * strength * 0.1;
                let targets = Self::trait_table(*target_archetype);
                for (name, target_value) in targets {
                    if let Some(value) = traits.get_mut(&name) {
                        *value += (target_value - *value) * factor;
                        *value = value.clamp(0.0, 1.0);
                    }
                }
            }
        }

        // Mood only flips on a confident read.
        if confidence > 0.5 {
            mood = mood_for_emotion(emotion);
        }

        if let Some((_, delta)) = ENERGY_DELTAS.iter().find(|(e, _)| *e == emotion) {
            energy = (energy + delta * confidence).clamp(0.1, 1.0);
        }

        debug!(
            from_mood = %current.mood,
            to_mood = %mood,
            energy,
            "persona adjusted"
        );

        PersonaState {
            archetype: current.archetype,
            traits,
            mood,
            energy,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PersonaEngine {
        PersonaEngine::new()
    }

    #[test]
    fn default_state_is_idempotent() {
        let a = engine().default_state(Archetype::Gentle);
        let b = engine().default_state(Archetype::Gentle);
        assert_eq!(a.traits, b.traits);
        assert_eq!(a.mood, Mood::Calm);
        assert!((a.energy - 1.0).abs() < f64::EPSILON);
        assert_eq!(b.mood, Mood::Calm);
    }

    #[test]
    fn adjust_keeps_values_in_range() {
        let mut state = engine().default_state(Archetype::Gentle);
        for _ in 0..200 {
            state = engine().adjust(&state, EmotionKind::Sadness, 0.9);
            for value in state.traits.values() {
                assert!((0.0..=1.0).contains(value));
            }
            assert!((0.1..=1.0).contains(&state.energy));
        }
    }

    #[test]
    fn repeated_adjust_drifts_monotonically_toward_target() {
        // Gentle shares "empathy" (0.9) with Empathetic (0.9) and Caring (0.9);
        // sadness pulls empathy upward and it must never overshoot.
        let mut state = engine().default_state(Archetype::Gentle);
        state.traits.insert("empathy".into(), 0.2);

        let mut previous = 0.2;
        for _ in 0..50 {
            state = engine().adjust(&state, EmotionKind::Sadness, 0.8);
            let empathy = state.traits["empathy"];
            assert!(empathy >= previous);
            assert!(empathy <= 0.9 + 1e-9);
            previous = empathy;
        }
    }

    #[test]
    fn archetype_never_changes_in_adjust() {
        let state = engine().default_state(Archetype::Tsundere);
        let adjusted = engine().adjust(&state, EmotionKind::Joy, 0.9);
        assert_eq!(adjusted.archetype, Archetype::Tsundere);
    }

    #[test]
    fn mood_only_changes_above_half_confidence() {
        let state = engine().default_state(Archetype::Gentle);

        let low = engine().adjust(&state, EmotionKind::Joy, 0.5);
        assert_eq!(low.mood, Mood::Calm);

        let high = engine().adjust(&state, EmotionKind::Joy, 0.6);
        assert_eq!(high.mood, Mood::Happy);
    }

    #[test]
    fn energy_clamps_at_floor() {
        let mut state = engine().default_state(Archetype::Gentle);
        for _ in 0..100 {
            state = engine().adjust(&state, EmotionKind::Sadness, 0.9);
        }
        assert!((state.energy - 0.1).abs() < 1e-9);
    }

    #[test]
    fn neutral_emotion_leaves_traits_untouched() {
        let state = engine().default_state(Archetype::Rational);
        let adjusted = engine().adjust(&state, EmotionKind::Neutral, 0.5);
        assert_eq!(adjusted.traits, state.traits);
        assert!((adjusted.energy - state.energy).abs() < f64::EPSILON);
    }

    #[test]
    fn main_traits_filters_above_threshold() {
        let state = engine().default_state(Archetype::Gentle);
        let main = state.main_traits();
        assert!(main.contains_key("warmth"));
        assert!(!main.contains_key("assertiveness"));
    }
}
