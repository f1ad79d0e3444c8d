//! Lexical emotion classifier.
//!
//! Deliberately simple keyword scoring — no model, no I/O, fully
//! deterministic. The six specific emotions are scored first; when none
//! of their keywords appear, a generic positive/negative indicator pass
//! decides between the three coarse categories.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Fixed emotion set. Declaration order matters: it is the tie-break
/// order for the lexicon pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionKind {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Love,
    Positive,
    Negative,
    Neutral,
}

impl EmotionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionKind::Joy => "joy",
            EmotionKind::Sadness => "sadness",
            EmotionKind::Anger => "anger",
            EmotionKind::Fear => "fear",
            EmotionKind::Surprise => "surprise",
            EmotionKind::Love => "love",
            EmotionKind::Positive => "positive",
            EmotionKind::Negative => "negative",
            EmotionKind::Neutral => "neutral",
        }
    }

    /// Expressive marker appended to outgoing replies.
    pub fn marker(&self) -> &'static str {
        match self {
            EmotionKind::Joy => "😊",
            EmotionKind::Sadness => "😢",
            EmotionKind::Anger => "😠",
            EmotionKind::Fear => "😰",
            EmotionKind::Surprise => "😲",
            EmotionKind::Love => "❤️",
            EmotionKind::Positive => "😊",
            EmotionKind::Negative => "😔",
            EmotionKind::Neutral => "😐",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EmotionKind::Joy => "检测到积极愉快的情绪",
            EmotionKind::Sadness => "检测到悲伤难过的情绪",
            EmotionKind::Anger => "检测到愤怒不满的情绪",
            EmotionKind::Fear => "检测到恐惧担忧的情绪",
            EmotionKind::Surprise => "检测到惊讶意外的情绪",
            EmotionKind::Love => "检测到爱意喜爱的情绪",
            EmotionKind::Positive => "检测到正面积极的情绪",
            EmotionKind::Negative => "检测到负面消极的情绪",
            EmotionKind::Neutral => "检测到中性平和的情绪",
        }
    }
}

impl std::fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Parse defensively for DB/text interop; unknown tags become Neutral.
impl FromStr for EmotionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "joy" => EmotionKind::Joy,
            "sadness" => EmotionKind::Sadness,
            "anger" => EmotionKind::Anger,
            "fear" => EmotionKind::Fear,
            "surprise" => EmotionKind::Surprise,
            "love" => EmotionKind::Love,
            "positive" => EmotionKind::Positive,
            "negative" => EmotionKind::Negative,
            _ => EmotionKind::Neutral,
        })
    }
}

/// Classification output: the winning category plus its static marker
/// and description, so callers never re-derive them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionResult {
    pub emotion: EmotionKind,
    pub confidence: f64,
    pub marker: String,
    pub description: String,
}

/// Keyword lexicon, in tie-break order.
const EMOTION_KEYWORDS: &[(EmotionKind, &[&str])] = &[
    (
        EmotionKind::Joy,
        &["开心", "高兴", "快乐", "兴奋", "愉快", "欢乐", "喜悦", "满意", "棒", "好", "赞"],
    ),
    (
        EmotionKind::Sadness,
        &["难过", "伤心", "悲伤", "沮丧", "失望", "痛苦", "忧郁", "哭", "泪"],
    ),
    (
        EmotionKind::Anger,
        &["生气", "愤怒", "恼火", "烦躁", "气愤", "讨厌", "恨", "怒"],
    ),
    (
        EmotionKind::Fear,
        &["害怕", "恐惧", "担心", "焦虑", "紧张", "不安", "惊慌"],
    ),
    (
        EmotionKind::Surprise,
        &["惊讶", "震惊", "意外", "吃惊", "惊奇", "不敢相信"],
    ),
    (
        EmotionKind::Love,
        &["爱", "喜欢", "爱心", "心动", "迷恋", "喜爱", "钟爱"],
    ),
];

const POSITIVE_INDICATORS: &[&str] =
    &["好", "棒", "赞", "不错", "可以", "行", "对", "是的", "谢谢"];
const NEGATIVE_INDICATORS: &[&str] = &["不", "没", "别", "不要", "不行", "不好", "错", "坏"];

/// Pure lexical classifier. Stateless; one instance can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct EmotionAnalyzer;

impl EmotionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> EmotionResult {
        let text = text.to_lowercase();

        // Lexicon pass: occurrence counts per category, first-declared wins ties.
        let mut best: Option<(EmotionKind, usize)> = None;
        for (kind, keywords) in EMOTION_KEYWORDS {
            let score: usize = keywords.iter().map(|kw| text.matches(kw).count()).sum();
            if score > 0 && best.is_none_or(|(_, s)| score > s) {
                best = Some((*kind, score));
            }
        }

        let (emotion, confidence) = match best {
            Some((kind, score)) => (kind, (0.2 * score as f64 + 0.3).min(0.9)),
            None => {
                // Fallback: generic positive vs. negative indicator presence.
                let positive = POSITIVE_INDICATORS
                    .iter()
                    .filter(|ind| text.contains(*ind))
                    .count();
                let negative = NEGATIVE_INDICATORS
                    .iter()
                    .filter(|ind| text.contains(*ind))
                    .count();

                if positive > negative {
                    (EmotionKind::Positive, (0.3 * positive as f64).min(0.8))
                } else if negative > positive {
                    (EmotionKind::Negative, (0.3 * negative as f64).min(0.8))
                } else {
                    (EmotionKind::Neutral, 0.5)
                }
            }
        };

        debug!(emotion = %emotion, confidence, "emotion classified");

        EmotionResult {
            emotion,
            confidence,
            marker: emotion.marker().to_string(),
            description: emotion.description().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joy_keywords_win_with_formula_confidence() {
        let result = EmotionAnalyzer::new().analyze("今天真开心，太开心了");
        assert_eq!(result.emotion, EmotionKind::Joy);
        // two occurrences of 开心: 0.2*2 + 0.3
        assert!((result.confidence - 0.7).abs() < 1e-9);
        assert_eq!(result.marker, "😊");
    }

    #[test]
    fn confidence_caps_at_point_nine() {
        let result = EmotionAnalyzer::new().analyze("开心开心开心开心开心开心");
        assert_eq!(result.emotion, EmotionKind::Joy);
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn tie_breaks_by_declaration_order() {
        // One joy keyword, one sadness keyword: joy is declared first.
        let result = EmotionAnalyzer::new().analyze("又棒又哭");
        assert_eq!(result.emotion, EmotionKind::Joy);
    }

    #[test]
    fn fallback_positive_indicators() {
        let result = EmotionAnalyzer::new().analyze("是的，谢谢");
        assert_eq!(result.emotion, EmotionKind::Positive);
        assert!((result.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn fallback_tie_is_neutral() {
        let result = EmotionAnalyzer::new().analyze("今天天气如何");
        assert_eq!(result.emotion, EmotionKind::Neutral);
        assert!((result.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn greeting_scores_neutral_or_positive() {
        let result = EmotionAnalyzer::new().analyze("你好");
        assert!(matches!(
            result.emotion,
            EmotionKind::Neutral | EmotionKind::Positive | EmotionKind::Joy
        ));
        assert!(result.confidence >= 0.0 && result.confidence <= 0.9);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let analyzer = EmotionAnalyzer::new();
        let a = analyzer.analyze("有点难过，想哭");
        let b = analyzer.analyze("有点难过，想哭");
        assert_eq!(a.emotion, b.emotion);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn unknown_tag_parses_to_neutral() {
        assert_eq!("whatever".parse::<EmotionKind>(), Ok(EmotionKind::Neutral));
    }
}
