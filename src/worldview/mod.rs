//! Worldview keyword records and the influence scorer.
//!
//! A worldview is a set of per-user keyword records over seven fixed
//! thematic categories. Scoring is plain case-insensitive substring
//! matching with per-record weights; the normalized score divides by the
//! total weight available so a fully-triggered worldview scores 1.0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::config::AmagiConfig;

/// The seven fixed worldview buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldviewCategory {
    Background,
    Values,
    SocialRules,
    Culture,
    LanguageStyle,
    BehaviorGuidelines,
    Taboos,
}

impl WorldviewCategory {
    pub const ALL: [WorldviewCategory; 7] = [
        WorldviewCategory::Background,
        WorldviewCategory::Values,
        WorldviewCategory::SocialRules,
        WorldviewCategory::Culture,
        WorldviewCategory::LanguageStyle,
        WorldviewCategory::BehaviorGuidelines,
        WorldviewCategory::Taboos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorldviewCategory::Background => "background",
            WorldviewCategory::Values => "values",
            WorldviewCategory::SocialRules => "social_rules",
            WorldviewCategory::Culture => "culture",
            WorldviewCategory::LanguageStyle => "language_style",
            WorldviewCategory::BehaviorGuidelines => "behavior_guidelines",
            WorldviewCategory::Taboos => "taboos",
        }
    }

    /// Human-readable label used in descriptions and suggestions.
    pub fn label(&self) -> &'static str {
        match self {
            WorldviewCategory::Background => "世界观背景",
            WorldviewCategory::Values => "价值观念",
            WorldviewCategory::SocialRules => "社会规则",
            WorldviewCategory::Culture => "文化特色",
            WorldviewCategory::LanguageStyle => "语言风格",
            WorldviewCategory::BehaviorGuidelines => "行为准则",
            WorldviewCategory::Taboos => "禁忌事项",
        }
    }

    /// Default per-category weight; taboos and values weigh heaviest.
    pub fn default_weight(&self) -> f64 {
        match self {
            WorldviewCategory::Background => 0.8,
            WorldviewCategory::Values => 1.0,
            WorldviewCategory::SocialRules => 0.9,
            WorldviewCategory::Culture => 0.7,
            WorldviewCategory::LanguageStyle => 0.8,
            WorldviewCategory::BehaviorGuidelines => 0.9,
            WorldviewCategory::Taboos => 1.0,
        }
    }
}

impl std::fmt::Display for WorldviewCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorldviewCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "background" => Ok(WorldviewCategory::Background),
            "values" => Ok(WorldviewCategory::Values),
            "social_rules" => Ok(WorldviewCategory::SocialRules),
            "culture" => Ok(WorldviewCategory::Culture),
            "language_style" => Ok(WorldviewCategory::LanguageStyle),
            "behavior_guidelines" => Ok(WorldviewCategory::BehaviorGuidelines),
            "taboos" => Ok(WorldviewCategory::Taboos),
            _ => Err(()),
        }
    }
}

/// One per-user keyword record. Weight stays clamped to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldviewRecord {
    pub user_id: String,
    pub category: WorldviewCategory,
    pub keywords: Vec<String>,
    pub weight: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorldviewRecord {
    pub fn new(
        user_id: &str,
        category: WorldviewCategory,
        keywords: Vec<String>,
        weight: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            category,
            keywords,
            weight: weight.clamp(0.0, 1.0),
            description: category.label().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A category that matched at least one keyword in the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub category: WorldviewCategory,
    pub description: String,
    pub matched_keywords: Vec<String>,
    pub influence: f64,
}

/// Scorer output: normalized score in [0, 1] plus per-category detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldviewInfluence {
    pub score: f64,
    pub matched_categories: Vec<CategoryMatch>,
    pub suggestions: Vec<String>,
}

/// Summary block for the administrative worldview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldviewSummary {
    pub total_categories: usize,
    pub total_keywords: usize,
    pub categories: Vec<WorldviewCategorySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldviewCategorySummary {
    pub category: WorldviewCategory,
    pub description: String,
    pub keyword_count: usize,
    pub weight: f64,
    /// At most the first five keywords.
    pub keywords: Vec<String>,
}

/// Stateless keyword/weight scorer over a user's worldview records.
#[derive(Debug, Clone, Default)]
pub struct WorldviewScorer;

impl WorldviewScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a message against the user's records. Each keyword match
    /// accumulates the record's weight into its category; the total is
    /// normalized by the sum of all record weights.
    pub fn analyze(&self, message: &str, records: &[WorldviewRecord]) -> WorldviewInfluence {
        if records.is_empty() {
            return WorldviewInfluence::default();
        }

        let message_lower = message.to_lowercase();
        let mut matched_categories = Vec::new();
        let mut suggestions = Vec::new();
        let mut total_influence = 0.0;

        for record in records {
            let mut influence = 0.0;
            let mut matched = Vec::new();

            for keyword in &record.keywords {
                if message_lower.contains(&keyword.to_lowercase()) {
                    matched.push(keyword.clone());
                    influence += record.weight;
                }
            }

            if matched.is_empty() {
                continue;
            }

            match record.category {
                WorldviewCategory::Values => suggestions.push(format!(
                    "体现{}：{}",
                    record.description,
                    matched.join(", ")
                )),
                WorldviewCategory::Taboos => {
                    suggestions.push(format!("注意避免{}相关内容", record.description))
                }
                WorldviewCategory::LanguageStyle => {
                    suggestions.push(format!("采用{}的表达方式", record.description))
                }
                _ => {}
            }

            total_influence += influence;
            matched_categories.push(CategoryMatch {
                category: record.category,
                description: record.description.clone(),
                matched_keywords: matched,
                influence,
            });
        }

        let max_influence: f64 = records.iter().map(|r| r.weight).sum();
        let score = if max_influence > 0.0 {
            (total_influence / max_influence).min(1.0)
        } else {
            0.0
        };

        WorldviewInfluence {
            score,
            matched_categories,
            suggestions,
        }
    }

    /// Bootstrap a user's records from the configured keyword lists.
    /// Categories with empty keyword lists create no record.
    pub fn default_records(&self, user_id: &str, config: &AmagiConfig) -> Vec<WorldviewRecord> {
        let sources = [
            (WorldviewCategory::Background, &config.worldview_background),
            (WorldviewCategory::Values, &config.worldview_values),
            (WorldviewCategory::SocialRules, &config.worldview_social_rules),
            (WorldviewCategory::Culture, &config.worldview_culture),
            (
                WorldviewCategory::LanguageStyle,
                &config.worldview_language_style,
            ),
            (
                WorldviewCategory::BehaviorGuidelines,
                &config.worldview_behavior_guidelines,
            ),
            (WorldviewCategory::Taboos, &config.worldview_taboos),
        ];

        let records: Vec<WorldviewRecord> = sources
            .into_iter()
            .filter_map(|(category, raw)| {
                let keywords = AmagiConfig::split_list(raw);
                if keywords.is_empty() {
                    None
                } else {
                    Some(WorldviewRecord::new(
                        user_id,
                        category,
                        keywords,
                        category.default_weight(),
                    ))
                }
            })
            .collect();

        info!(
            user_id,
            count = records.len(),
            "bootstrapped worldview records from config defaults"
        );
        records
    }

    pub fn summarize(&self, records: &[WorldviewRecord]) -> WorldviewSummary {
        WorldviewSummary {
            total_categories: records.len(),
            total_keywords: records.iter().map(|r| r.keywords.len()).sum(),
            categories: records
                .iter()
                .map(|r| WorldviewCategorySummary {
                    category: r.category,
                    description: r.description.clone(),
                    keyword_count: r.keywords.len(),
                    weight: r.weight,
                    keywords: r.keywords.iter().take(5).cloned().collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taboo_record(keyword: &str, weight: f64) -> WorldviewRecord {
        WorldviewRecord::new(
            "user-1",
            WorldviewCategory::Taboos,
            vec![keyword.to_string()],
            weight,
        )
    }

    #[test]
    fn no_records_scores_zero() {
        let result = WorldviewScorer::new().analyze("任何消息", &[]);
        assert_eq!(result.score, 0.0);
        assert!(result.matched_categories.is_empty());
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn taboo_keyword_triggers_avoidance_suggestion() {
        let records = vec![taboo_record("背叛", 1.0)];
        let result = WorldviewScorer::new().analyze("他居然背叛了我们", &records);

        assert!(result.score > 0.0);
        assert_eq!(result.matched_categories.len(), 1);
        assert_eq!(
            result.matched_categories[0].category,
            WorldviewCategory::Taboos
        );
        assert!(result.suggestions[0].contains("避免"));
        assert!(result.suggestions[0].contains("禁忌事项"));
    }

    #[test]
    fn score_normalizes_by_total_weight() {
        let records = vec![
            taboo_record("背叛", 1.0),
            WorldviewRecord::new(
                "user-1",
                WorldviewCategory::Values,
                vec!["友善".to_string()],
                0.5,
            ),
        ];
        // Only the taboo matches: 1.0 influence over 1.5 total weight.
        let result = WorldviewScorer::new().analyze("说到背叛这件事", &records);
        assert!((result.score - 1.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn score_caps_at_one() {
        // Two keyword hits on a single weight-1.0 record exceed the
        // record's own weight; the normalized score still caps at 1.0.
        let record = WorldviewRecord::new(
            "user-1",
            WorldviewCategory::Taboos,
            vec!["背叛".to_string(), "欺骗".to_string()],
            1.0,
        );
        let result = WorldviewScorer::new().analyze("背叛和欺骗", &[record]);
        assert!((result.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let record = WorldviewRecord::new(
            "user-1",
            WorldviewCategory::Culture,
            vec!["Magic".to_string()],
            0.7,
        );
        let result = WorldviewScorer::new().analyze("tell me about MAGIC", &[record]);
        assert_eq!(result.matched_categories.len(), 1);
    }

    #[test]
    fn weight_clamps_into_unit_interval() {
        let record = taboo_record("背叛", 3.0);
        assert!((record.weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_records_skip_empty_categories() {
        let mut config = crate::config::AmagiConfig::from_env();
        config.worldview_culture = String::new();
        let records = WorldviewScorer::new().default_records("user-1", &config);
        assert!(records
            .iter()
            .all(|r| r.category != WorldviewCategory::Culture));
        assert!(records
            .iter()
            .any(|r| r.category == WorldviewCategory::Taboos));
    }

    #[test]
    fn summary_truncates_keyword_preview() {
        let record = WorldviewRecord::new(
            "user-1",
            WorldviewCategory::Values,
            (0..8).map(|i| format!("kw{i}")).collect(),
            1.0,
        );
        let summary = WorldviewScorer::new().summarize(&[record]);
        assert_eq!(summary.total_keywords, 8);
        assert_eq!(summary.categories[0].keywords.len(), 5);
    }
}
