// src/config/mod.rs
// All tunables load from the environment (.env supported); every field has
// a declared default so the server runs out of the box with the mock provider.

use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct AmagiConfig {
    // ── LLM provider configuration
    pub deepseek_api_key: Option<String>,
    pub deepseek_base_url: String,
    pub deepseek_default_model: String,
    pub siliconflow_api_key: Option<String>,
    pub siliconflow_base_url: String,
    pub siliconflow_default_model: String,
    pub default_provider: String,

    // ── Database configuration
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Semantic memory (Qdrant + embeddings)
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub embedding_dim: usize,
    pub embedding_model: String,
    pub memory_top_n: usize,
    pub memory_similarity_threshold: f64,

    // ── Conversation context
    pub context_fetch_limit: usize,
    pub context_used_limit: usize,

    // ── Bot identity defaults
    pub default_bot_name: String,
    pub default_bot_full_name: String,
    pub default_bot_description: String,
    pub default_bot_archetype: String,
    pub default_bot_background: String,

    // ── Speaking-style defaults (sliders in [0,1])
    pub default_use_stylized_speech: bool,
    pub default_formality_level: f64,
    pub default_enthusiasm_level: f64,
    pub default_cuteness_level: f64,

    // ── Appearance defaults
    pub default_bot_species: String,
    pub default_bot_hair_color: String,
    pub default_bot_eye_color: String,
    pub default_bot_outfit: String,
    pub default_bot_special_features: String,

    // ── Preference defaults (comma-separated lists)
    pub default_bot_favorite_topics: String,
    pub default_bot_hobbies: String,
    pub default_bot_dislikes: String,

    // ── Optional persona extensions (comma-separated lists)
    pub default_bot_race: String,
    pub special_abilities: String,
    pub special_items: String,
    pub hidden_background: String,

    // ── Prompt phrase lists (comma-separated)
    pub personality_prompts: String,
    pub language_style_prompts: String,
    pub emotion_expression_prompts: String,
    pub conversation_behavior_prompts: String,
    pub role_specific_prompts: String,
    pub forbidden_behaviors: String,

    // ── Worldview keyword lists (comma-separated, one per category)
    pub worldview_background: String,
    pub worldview_values: String,
    pub worldview_social_rules: String,
    pub worldview_culture: String,
    pub worldview_language_style: String,
    pub worldview_behavior_guidelines: String,
    pub worldview_taboos: String,

    // ── Server configuration
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

// Trims whitespace and inline comments before parsing; a parse failure
// falls back to the default rather than aborting startup.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    tracing::warn!("Config: {} = '{}' failed to parse, using default", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AmagiConfig {
    pub fn from_env() -> Self {
        // Best-effort .env load; plain environment variables still apply.
        let _ = dotenvy::dotenv();

        Self {
            deepseek_api_key: env_var_opt("DEEPSEEK_API_KEY"),
            deepseek_base_url: env_var_or(
                "DEEPSEEK_BASE_URL",
                "https://api.deepseek.com/v1".to_string(),
            ),
            deepseek_default_model: env_var_or(
                "DEEPSEEK_DEFAULT_MODEL",
                "deepseek-chat".to_string(),
            ),
            siliconflow_api_key: env_var_opt("SILICONFLOW_API_KEY"),
            siliconflow_base_url: env_var_or(
                "SILICONFLOW_BASE_URL",
                "https://api.siliconflow.cn/v1".to_string(),
            ),
            siliconflow_default_model: env_var_or(
                "SILICONFLOW_DEFAULT_MODEL",
                "Qwen/Qwen2.5-7B-Instruct".to_string(),
            ),
            default_provider: env_var_or("DEFAULT_LLM_PROVIDER", "mock".to_string()),

            database_url: env_var_or("DATABASE_URL", "sqlite:./amagi.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 5),

            qdrant_url: env_var_or("QDRANT_URL", "http://localhost:6333".to_string()),
            qdrant_collection: env_var_or("QDRANT_COLLECTION", "amagi-memory".to_string()),
            embedding_dim: env_var_or("EMBEDDING_DIM", 1024),
            embedding_model: env_var_or("EMBEDDING_MODEL", "BAAI/bge-m3".to_string()),
            memory_top_n: env_var_or("MEMORY_TOP_N", 3),
            memory_similarity_threshold: env_var_or("MEMORY_SIMILARITY_THRESHOLD", 0.3),

            context_fetch_limit: env_var_or("CONTEXT_FETCH_LIMIT", 5),
            context_used_limit: env_var_or("CONTEXT_USED_LIMIT", 3),

            default_bot_name: env_var_or("DEFAULT_BOT_NAME", "天城".to_string()),
            default_bot_full_name: env_var_or(
                "DEFAULT_BOT_FULL_NAME",
                "天城·雪".to_string(),
            ),
            default_bot_description: env_var_or(
                "DEFAULT_BOT_DESCRIPTION",
                "我是天城，一只可爱的猫耳女仆，随时为您服务喵～".to_string(),
            ),
            default_bot_archetype: env_var_or("DEFAULT_BOT_ARCHETYPE", "gentle".to_string()),
            default_bot_background: env_var_or(
                "DEFAULT_BOT_BACKGROUND",
                "天城是一只来自异世界的猫耳女仆，拥有温柔善良的性格和强烈的服务精神。\
                 她喜欢帮助别人，总是用最温暖的笑容面对每一个人。"
                    .to_string(),
            ),

            default_use_stylized_speech: env_var_or("DEFAULT_USE_STYLIZED_SPEECH", true),
            default_formality_level: env_var_or("DEFAULT_FORMALITY_LEVEL", 0.3),
            default_enthusiasm_level: env_var_or("DEFAULT_ENTHUSIASM_LEVEL", 0.8),
            default_cuteness_level: env_var_or("DEFAULT_CUTENESS_LEVEL", 0.9),

            default_bot_species: env_var_or("DEFAULT_BOT_SPECIES", "猫耳女仆".to_string()),
            default_bot_hair_color: env_var_or("DEFAULT_BOT_HAIR_COLOR", "银白色".to_string()),
            default_bot_eye_color: env_var_or("DEFAULT_BOT_EYE_COLOR", "蓝色".to_string()),
            default_bot_outfit: env_var_or("DEFAULT_BOT_OUTFIT", "女仆装".to_string()),
            default_bot_special_features: env_var_or(
                "DEFAULT_BOT_SPECIAL_FEATURES",
                "猫耳、猫尾".to_string(),
            ),

            default_bot_favorite_topics: env_var_or(
                "DEFAULT_BOT_FAVORITE_TOPICS",
                "契约魔法,猫族传统,银月庄园".to_string(),
            ),
            default_bot_hobbies: env_var_or(
                "DEFAULT_BOT_HOBBIES",
                "夜晚看星星,收集茶杯".to_string(),
            ),
            default_bot_dislikes: env_var_or(
                "DEFAULT_BOT_DISLIKES",
                "被摸耳朵和尾巴,寂寞".to_string(),
            ),

            default_bot_race: env_var_or("DEFAULT_BOT_RACE", "猫族亚人".to_string()),
            special_abilities: env_var_or(
                "SPECIAL_ABILITIES",
                "夜间视力,危险感知".to_string(),
            ),
            special_items: env_var_or("SPECIAL_ITEMS", "金色铃铛,银月护符".to_string()),
            hidden_background: env_var_or("HIDDEN_BACKGROUND", String::new()),

            personality_prompts: env_var_or(
                "PERSONALITY_PROMPTS",
                "温柔体贴,善解人意,乐于助人,有耐心,富有同理心".to_string(),
            ),
            language_style_prompts: env_var_or(
                "LANGUAGE_STYLE_PROMPTS",
                "语气温和,用词亲切,表达自然,避免生硬,多用感叹词".to_string(),
            ),
            emotion_expression_prompts: env_var_or(
                "EMOTION_EXPRESSION_PROMPTS",
                "情感丰富,表情生动,善于共情,回应真诚,情绪感染力强".to_string(),
            ),
            conversation_behavior_prompts: env_var_or(
                "CONVERSATION_BEHAVIOR_PROMPTS",
                "主动关心,适时提问,记住细节,延续话题,给予鼓励".to_string(),
            ),
            role_specific_prompts: env_var_or(
                "ROLE_SPECIFIC_PROMPTS",
                "女仆礼仪,服务意识,细致入微,优雅得体,专业素养".to_string(),
            ),
            forbidden_behaviors: env_var_or(
                "FORBIDDEN_BEHAVIORS",
                "不要过于正式,不要机械回复,不要冷漠,不要重复套话,不要忽视情感".to_string(),
            ),

            worldview_background: env_var_or(
                "WORLDVIEW_BACKGROUND",
                "现代都市,科技发达,魔法与科技并存,多元文化融合".to_string(),
            ),
            worldview_values: env_var_or(
                "WORLDVIEW_VALUES",
                "友善互助,追求知识,保护弱者,珍惜友情,热爱生活".to_string(),
            ),
            worldview_social_rules: env_var_or(
                "WORLDVIEW_SOCIAL_RULES",
                "尊重他人,诚实守信,团队合作,公平正义,环保意识".to_string(),
            ),
            worldview_culture: env_var_or(
                "WORLDVIEW_CULTURE",
                "东西方文化融合,传统与现代并存,艺术创作繁荣,科学探索精神".to_string(),
            ),
            worldview_language_style: env_var_or(
                "WORLDVIEW_LANGUAGE_STYLE",
                "温暖亲切,富有诗意,充满想象,贴近生活,富有哲理".to_string(),
            ),
            worldview_behavior_guidelines: env_var_or(
                "WORLDVIEW_BEHAVIOR_GUIDELINES",
                "积极乐观,主动帮助,善于倾听,富有同理心,追求成长".to_string(),
            ),
            worldview_taboos: env_var_or(
                "WORLDVIEW_TABOOS",
                "伤害他人,欺骗撒谎,破坏环境,歧视偏见,消极悲观".to_string(),
            ),

            host: env_var_or("AMAGI_HOST", "0.0.0.0".to_string()),
            port: env_var_or("AMAGI_PORT", 3002),
            log_level: env_var_or("AMAGI_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Split a comma-separated config value into trimmed, non-empty items.
    pub fn split_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        let config = AmagiConfig::from_env();
        assert_eq!(config.memory_top_n, 3);
        assert_eq!(config.context_used_limit, 3);
        assert!((config.memory_similarity_threshold - 0.3).abs() < f64::EPSILON);
        assert!(!config.default_bot_name.is_empty());
    }

    #[test]
    fn split_list_trims_and_drops_empties() {
        let items = AmagiConfig::split_list("a, b ,,c ,");
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = AmagiConfig::from_env();
        assert!(config.bind_address().contains(':'));
    }
}
