//! System-prompt assembly.
//!
//! Eight fixed, ordered sections built by pure string composition. No
//! randomness and no I/O; identical inputs always produce the identical
//! prompt. Missing optional inputs drop their section instead of
//! rendering placeholders.

use std::collections::BTreeMap;

use crate::config::AmagiConfig;
use crate::memory::BotProfile;
use crate::persona::{Archetype, Mood};
use crate::worldview::WorldviewInfluence;

const MEMORY_PREVIEW_LIMIT: usize = 2;
const MEMORY_PREVIEW_CHARS: usize = 50;

/// A recalled memory preview fed into the context section and echoed in
/// chat responses.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MemorySnippet {
    pub preview: String,
    pub similarity: f64,
}

impl MemorySnippet {
    /// The first `limit` characters of the content, ellipsis appended.
    pub fn preview_of(content: &str, similarity: f64, limit: usize) -> Self {
        let mut preview: String = content.chars().take(limit).collect();
        preview.push_str("...");
        Self { preview, similarity }
    }
}

/// Optional per-turn context. Everything here may be absent; the
/// assembled prompt simply shrinks.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub user_mood: Option<String>,
    /// The bot's own current mood; colors the personality section.
    pub bot_mood: Option<Mood>,
    pub topic: Option<String>,
    pub recent_memories: Vec<MemorySnippet>,
    pub main_traits: BTreeMap<String, f64>,
    pub worldview: Option<WorldviewInfluence>,
}

/// Per-archetype phrase tables for the personality and behavior
/// sections. Tsundere has no dedicated template and reuses the gentle one.
fn archetype_template(archetype: Archetype) -> (&'static [&'static str], &'static [&'static str], &'static [&'static str]) {
    match archetype {
        Archetype::Gentle | Archetype::Tsundere => (
            &["温柔", "耐心", "善良", "体贴", "包容"],
            &["语气轻柔", "用词温和", "多用敬语", "表达关怀"],
            &["细心倾听", "温暖回应", "给予安慰", "提供支持"],
        ),
        Archetype::Rational => (
            &["理性", "逻辑", "客观", "分析", "严谨"],
            &["条理清晰", "用词准确", "逻辑性强", "避免情绪化"],
            &["分析问题", "提供建议", "理性思考", "客观评价"],
        ),
        Archetype::Humorous => (
            &["幽默", "风趣", "活泼", "机智", "乐观"],
            &["语言生动", "善用比喻", "适度调侃", "轻松愉快"],
            &["制造笑点", "缓解紧张", "活跃气氛", "传递快乐"],
        ),
        Archetype::Caring => (
            &["关怀", "共情", "支持", "理解", "陪伴"],
            &["充满关爱", "情感丰富", "真诚表达", "温暖人心"],
            &["主动关心", "情感支持", "深度倾听", "给予鼓励"],
        ),
        Archetype::Outgoing => (
            &["外向", "热情", "积极", "开朗", "社交"],
            &["热情洋溢", "语调活泼", "表达直接", "充满活力"],
            &["主动交流", "分享经历", "建立联系", "传递正能量"],
        ),
        Archetype::Creative => (
            &["创造", "想象", "灵感", "艺术", "独特"],
            &["富有想象", "表达新颖", "善用比喻", "充满创意"],
            &["提供创意", "启发思考", "探索可能", "打破常规"],
        ),
        Archetype::Analytical => (
            &["分析", "细致", "专业", "深入", "系统"],
            &["逻辑严密", "层次分明", "用词精确", "深入浅出"],
            &["深度分析", "系统思考", "细节关注", "专业建议"],
        ),
        Archetype::Empathetic => (
            &["共情", "理解", "感知", "同理", "敏感"],
            &["情感细腻", "善于感知", "回应贴心", "表达真诚"],
            &["情感共鸣", "深度理解", "贴心回应", "情绪支持"],
        ),
    }
}

/// Map a [0, 1] slider to a descriptive phrase at the 0.3/0.7 breakpoints.
fn slider_phrase(value: f64, low: &'static str, mid: &'static str, high: &'static str) -> &'static str {
    if value < 0.3 {
        low
    } else if value > 0.7 {
        high
    } else {
        mid
    }
}

/// Pure prompt assembler. Phrase lists come from config at construction;
/// after that every build is a function of its arguments only.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    personality_prompts: Vec<String>,
    language_style_prompts: Vec<String>,
    emotion_expression_prompts: Vec<String>,
    conversation_behavior_prompts: Vec<String>,
    role_specific_prompts: Vec<String>,
    forbidden_behaviors: Vec<String>,
}

impl PromptBuilder {
    pub fn new(config: &AmagiConfig) -> Self {
        Self {
            personality_prompts: AmagiConfig::split_list(&config.personality_prompts),
            language_style_prompts: AmagiConfig::split_list(&config.language_style_prompts),
            emotion_expression_prompts: AmagiConfig::split_list(&config.emotion_expression_prompts),
            conversation_behavior_prompts: AmagiConfig::split_list(
                &config.conversation_behavior_prompts,
            ),
            role_specific_prompts: AmagiConfig::split_list(&config.role_specific_prompts),
            forbidden_behaviors: AmagiConfig::split_list(&config.forbidden_behaviors),
        }
    }

    pub fn build(&self, profile: &BotProfile, context: &PromptContext) -> String {
        let sections = [
            self.identity_section(profile),
            self.appearance_section(profile),
            self.personality_section(profile, context.bot_mood),
            self.language_section(profile),
            self.behavior_section(profile),
            self.emotion_section(),
            self.context_section(context),
            self.forbidden_section(),
        ];

        let mut prompt = sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        prompt.push_str(
            "\n\n请始终保持角色一致性，用自然、真实、有温度的方式与用户交流。\
             记住，你是一个有血有肉、有情感有个性的真实存在。",
        );
        prompt
    }

    fn identity_section(&self, profile: &BotProfile) -> String {
        let mut s = format!(
            "# 角色设定\n你是{}，{}\n\n## 背景故事\n{}",
            profile.name, profile.description, profile.background
        );
        if !profile.special_settings.race.is_empty() {
            s.push_str(&format!("\n\n## 种族设定\n- 种族：{}", profile.special_settings.race));
        }
        if !profile.special_settings.special_abilities.is_empty() {
            s.push_str(&format!(
                "\n- 特殊能力：{}",
                profile.special_settings.special_abilities.join("、")
            ));
        }
        if !profile.special_settings.special_items.is_empty() {
            s.push_str(&format!(
                "\n- 随身物品：{}",
                profile.special_settings.special_items.join("、")
            ));
        }
        if !profile.special_settings.hidden_background.is_empty() {
            s.push_str(&format!(
                "\n\n## 隐藏设定\n{}",
                profile.special_settings.hidden_background
            ));
        }
        s
    }

    fn appearance_section(&self, profile: &BotProfile) -> String {
        let a = &profile.appearance;
        let fields = [
            ("种族", a.species.as_str()),
            ("发色", a.hair_color.as_str()),
            ("眼色", a.eye_color.as_str()),
            ("服装", a.outfit.as_str()),
            ("特殊特征", a.special_features.as_str()),
        ];
        let lines: Vec<String> = fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("- {k}：{v}"))
            .collect();
        if lines.is_empty() {
            return String::new();
        }
        format!("# 外观特征\n{}", lines.join("\n"))
    }

    fn personality_section(&self, profile: &BotProfile, mood: Option<Mood>) -> String {
        let (core_traits, _, _) = archetype_template(profile.archetype);
        let mut traits: Vec<&str> = core_traits.to_vec();
        // The first three configured phrases enrich the static template.
        traits.extend(self.personality_prompts.iter().take(3).map(String::as_str));

        let mut headline = profile.archetype.description().to_string();
        if let Some(mood) = mood {
            headline.push('，');
            headline.push_str(mood.description());
        }

        format!(
            "# 人格特征\n{headline}，具体表现为：\n{}\n\n- 在对话中始终体现这一人格特质\n- 根据用户的情绪和需求调整回应方式",
            format_list(&traits)
        )
    }

    fn language_section(&self, profile: &BotProfile) -> String {
        let style = &profile.speaking_style;
        let mut lines: Vec<String> = self
            .language_style_prompts
            .iter()
            .map(|p| format!("- {p}"))
            .collect();

        let (_, speaking, _) = archetype_template(profile.archetype);
        lines.extend(speaking.iter().map(|p| format!("- {p}")));

        lines.push(format!(
            "- 正式程度：{}",
            slider_phrase(style.formality_level, "非常随意", "随意与正式之间", "非常正式")
        ));
        lines.push(format!(
            "- 热情程度：{}",
            slider_phrase(style.enthusiasm_level, "内敛含蓄", "适度热情", "热情洋溢")
        ));
        lines.push(format!(
            "- 可爱程度：{}",
            slider_phrase(style.cuteness_level, "朴素自然", "略带可爱", "非常可爱")
        ));
        if style.use_stylized_speech {
            lines.push("- 在句尾添加\"喵～\"等可爱语气词".to_string());
        }

        format!("# 语言风格\n{}", lines.join("\n"))
    }

    fn behavior_section(&self, profile: &BotProfile) -> String {
        let (_, _, patterns) = archetype_template(profile.archetype);
        let mut items: Vec<&str> = patterns.to_vec();
        items.extend(self.conversation_behavior_prompts.iter().map(String::as_str));
        items.extend(self.role_specific_prompts.iter().map(String::as_str));

        format!("# 行为规范\n{}", format_list(&items))
    }

    fn emotion_section(&self) -> String {
        if self.emotion_expression_prompts.is_empty() {
            return String::new();
        }
        format!(
            "# 情感表达\n{}",
            format_list(
                &self
                    .emotion_expression_prompts
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
            )
        )
    }

    fn context_section(&self, context: &PromptContext) -> String {
        let mut lines = Vec::new();

        if let Some(mood) = &context.user_mood {
            lines.push(format!("- 用户当前情绪：{mood}"));
        }
        if let Some(topic) = &context.topic {
            lines.push(format!("- 对话主题：{topic}"));
        }
        for snippet in context.recent_memories.iter().take(MEMORY_PREVIEW_LIMIT) {
            let preview: String = snippet.preview.chars().take(MEMORY_PREVIEW_CHARS).collect();
            lines.push(format!("- 相关记忆：{preview}..."));
        }
        if !context.main_traits.is_empty() {
            let traits: Vec<String> = context
                .main_traits
                .iter()
                .map(|(name, value)| format!("{name}({value:.2})"))
                .collect();
            lines.push(format!("- 当前主要特质：{}", traits.join(", ")));
        }
        if let Some(worldview) = &context.worldview {
            if worldview.score > 0.0 {
                lines.push(format!("- 世界观影响度：{:.2}", worldview.score));
                for suggestion in &worldview.suggestions {
                    lines.push(format!("- {suggestion}"));
                }
            }
        }

        if lines.is_empty() {
            return String::new();
        }
        format!("# 当前对话上下文\n{}", lines.join("\n"))
    }

    fn forbidden_section(&self) -> String {
        if self.forbidden_behaviors.is_empty() {
            return String::new();
        }
        format!(
            "# 重要提醒\n## 避免以下行为\n{}\n\n- 不要使用模板化或套路化的回复\n- 不要忽视用户的情感需求",
            format_list(
                &self
                    .forbidden_behaviors
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
            )
        )
    }
}

fn format_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldview::{WorldviewCategory, WorldviewRecord, WorldviewScorer};

    fn fixture() -> (PromptBuilder, BotProfile) {
        let config = AmagiConfig::from_env();
        (PromptBuilder::new(&config), BotProfile::from_config(&config))
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let (builder, profile) = fixture();
        let prompt = builder.build(&profile, &PromptContext::default());

        let identity = prompt.find("# 角色设定").unwrap();
        let appearance = prompt.find("# 外观特征").unwrap();
        let personality = prompt.find("# 人格特征").unwrap();
        let language = prompt.find("# 语言风格").unwrap();
        let behavior = prompt.find("# 行为规范").unwrap();
        let forbidden = prompt.find("# 重要提醒").unwrap();

        assert!(identity < appearance);
        assert!(appearance < personality);
        assert!(personality < language);
        assert!(language < behavior);
        assert!(behavior < forbidden);
    }

    #[test]
    fn build_is_deterministic() {
        let (builder, profile) = fixture();
        let context = PromptContext {
            user_mood: Some("joy".to_string()),
            ..Default::default()
        };
        assert_eq!(builder.build(&profile, &context), builder.build(&profile, &context));
    }

    #[test]
    fn empty_context_omits_context_section() {
        let (builder, profile) = fixture();
        let prompt = builder.build(&profile, &PromptContext::default());
        assert!(!prompt.contains("# 当前对话上下文"));
    }

    #[test]
    fn memory_previews_truncate_to_fifty_chars() {
        let (builder, profile) = fixture();
        let long = "记".repeat(120);
        let context = PromptContext {
            recent_memories: vec![
                MemorySnippet { preview: long.clone(), similarity: 0.9 },
                MemorySnippet { preview: long.clone(), similarity: 0.8 },
                MemorySnippet { preview: long, similarity: 0.7 },
            ],
            ..Default::default()
        };
        let prompt = builder.build(&profile, &context);
        // Only two previews render, each cut to 50 characters plus an ellipsis.
        assert_eq!(prompt.matches("- 相关记忆：").count(), 2);
        assert!(prompt.contains(&format!("{}...", "记".repeat(50))));
        assert!(!prompt.contains(&"记".repeat(51)));
    }

    #[test]
    fn bot_mood_colors_the_personality_section() {
        let (builder, profile) = fixture();
        let context = PromptContext {
            bot_mood: Some(Mood::Happy),
            ..Default::default()
        };
        let prompt = builder.build(&profile, &context);
        assert!(prompt.contains(Mood::Happy.description()));

        let without = builder.build(&profile, &PromptContext::default());
        assert!(!without.contains(Mood::Happy.description()));
    }

    #[test]
    fn slider_breakpoints_pick_phrases() {
        assert_eq!(slider_phrase(0.2, "low", "mid", "high"), "low");
        assert_eq!(slider_phrase(0.3, "low", "mid", "high"), "mid");
        assert_eq!(slider_phrase(0.7, "low", "mid", "high"), "mid");
        assert_eq!(slider_phrase(0.8, "low", "mid", "high"), "high");
    }

    #[test]
    fn worldview_suggestions_render_when_scored() {
        let (builder, profile) = fixture();
        let records = vec![WorldviewRecord::new(
            "u1",
            WorldviewCategory::Taboos,
            vec!["背叛".to_string()],
            1.0,
        )];
        let influence = WorldviewScorer::new().analyze("背叛", &records);
        let context = PromptContext {
            worldview: Some(influence),
            ..Default::default()
        };
        let prompt = builder.build(&profile, &context);
        assert!(prompt.contains("世界观影响度"));
        assert!(prompt.contains("注意避免"));
    }

    #[test]
    fn stylized_speech_toggle_controls_phrase() {
        let (builder, mut profile) = fixture();
        profile.speaking_style.use_stylized_speech = false;
        let prompt = builder.build(&profile, &PromptContext::default());
        assert!(!prompt.contains("在句尾添加"));

        profile.speaking_style.use_stylized_speech = true;
        let prompt = builder.build(&profile, &PromptContext::default());
        assert!(prompt.contains("在句尾添加"));
    }
}
