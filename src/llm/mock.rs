//! Offline provider with canned persona-aware replies. Needs no key and
//! no network; response selection is a pure function of the input so
//! tests stay deterministic.

use async_trait::async_trait;

use crate::llm::{CompletionOutcome, CompletionProvider, CompletionRequest, ProviderError};

const PROVIDER: &str = "mock";
const DEFAULT_MODEL: &str = "mock-chat-model";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockTone {
    Gentle,
    Rational,
    Humorous,
    Caring,
}

#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    /// Read the bot name and tone back out of the assembled system prompt.
    fn read_system_prompt(messages: &[crate::llm::ChatMessage]) -> (String, MockTone, bool) {
        let mut name = "天城".to_string();
        let mut tone = MockTone::Gentle;
        let mut stylized = false;

        if let Some(system) = messages.iter().find(|m| m.role == "system") {
            if let Some(rest) = system.content.split("你是").nth(1) {
                let candidate: String = rest
                    .chars()
                    .take_while(|c| *c != '，' && *c != ',' && *c != '\n')
                    .collect();
                if !candidate.is_empty() && candidate.chars().count() <= 12 {
                    name = candidate;
                }
            }
            let content = &system.content;
            if content.contains("理性") {
                tone = MockTone::Rational;
            } else if content.contains("幽默") {
                tone = MockTone::Humorous;
            } else if content.contains("关怀") {
                tone = MockTone::Caring;
            }
            stylized = content.contains("在句尾添加");
        }

        (name, tone, stylized)
    }

    fn reply_pool(user_message: &str, name: &str, tone: MockTone, suffix: &str) -> Vec<String> {
        let lower = user_message.to_lowercase();

        if ["你好", "hello", "hi", "您好"].iter().any(|w| lower.contains(w)) {
            return match tone {
                MockTone::Rational => vec![
                    format!("您好，我是{name}。很高兴为您提供服务，有什么我可以帮助您的吗？"),
                    format!("你好，我是{name}。请问有什么问题需要我协助解决？"),
                ],
                MockTone::Humorous => vec![
                    format!("哈喽！我是{name}，今天的心情特别好呢！有什么有趣的事情想聊聊吗？"),
                    format!("嗨！{name}在此为您服务～准备好迎接一些有趣的对话了吗？"),
                ],
                MockTone::Caring => vec![
                    format!("你好呀！我是{name}，很开心见到你{suffix} 今天过得怎么样？"),
                    format!("您好！我是{name}，随时准备倾听和帮助您{suffix}"),
                ],
                MockTone::Gentle => vec![
                    format!("你好{suffix} 我是{name}，很高兴认识你！有什么我可以帮助你的吗{suffix}"),
                    format!("您好！我是{name}{suffix} 今天想聊些什么呢？"),
                ],
            };
        }

        if ["介绍", "自己", "你是谁", "who are you"].iter().any(|w| lower.contains(w)) {
            return vec![
                format!("我是{name}{suffix} 我喜欢和大家聊天，分享有趣的话题，也很乐意帮助解决各种问题{suffix}"),
                format!("我是{name}，很高兴向你介绍自己{suffix} 希望我们能成为好朋友！"),
            ];
        }

        if ["帮助", "help", "怎么", "如何"].iter().any(|w| lower.contains(w)) {
            return vec![
                format!("我很乐意帮助你{suffix} 无论是聊天、解答问题还是其他需要，都可以告诉我{suffix}"),
                format!("当然可以帮助你{suffix} 我是{name}，有什么具体需要帮助的吗{suffix}"),
            ];
        }

        match tone {
            MockTone::Rational => vec![
                "我理解您的问题。让我分析一下这个情况，为您提供一个合理的回应。".to_string(),
                "这是一个有趣的话题。从逻辑角度来看，我们可以这样分析。".to_string(),
            ],
            MockTone::Humorous => vec![
                "哈哈，这个问题很有意思！让我想想怎么用最有趣的方式来回答你～".to_string(),
                format!("嗯嗯，{name}的幽默雷达已经启动！准备接收一个有趣的回答吧～"),
            ],
            MockTone::Caring => vec![
                format!("我能感受到你的想法{suffix} 让我好好想想怎么回应你比较好{suffix}"),
                format!("谢谢你和我分享这个{suffix} 我很关心你的感受{suffix}"),
            ],
            MockTone::Gentle => vec![
                format!("这是个很好的话题呢{suffix} 让我温柔地回应你{suffix}"),
                format!("我很认真地在思考你说的话{suffix} 希望我的回答能让你满意{suffix}"),
            ],
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn available_models(&self) -> Vec<String> {
        vec![
            "mock-chat-model".to_string(),
            "mock-creative-model".to_string(),
            "mock-analytical-model".to_string(),
        ]
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, ProviderError> {
        let user_message = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let (name, tone, stylized) = Self::read_system_prompt(&request.messages);
        let suffix = if stylized { "喵～" } else { "" };

        let pool = Self::reply_pool(&user_message, &name, tone, suffix);
        // Stable selection keyed on the message, not a RNG.
        let index = user_message.chars().count() % pool.len();
        let text = pool[index].clone();

        let thinking_steps = request.enable_thinking.then(|| {
            let preview: String = user_message.chars().take(30).collect();
            vec![
                format!("1. 分析用户消息：'{preview}'"),
                "2. 识别用户意图和情感状态".to_string(),
                "3. 根据当前人格特征选择合适的回应风格".to_string(),
                "4. 生成符合角色设定的回复内容".to_string(),
            ]
        });

        let prompt_chars: usize = request.messages.iter().map(|m| m.content.chars().count()).sum();
        let usage = serde_json::json!({
            "prompt_tokens": prompt_chars / 4,
            "completion_tokens": text.chars().count() / 4,
            "total_tokens": (prompt_chars + text.chars().count()) / 4,
        });

        Ok(CompletionOutcome {
            text,
            thinking_steps,
            usage: Some(usage),
            model_used: request.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn request(messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest::new(messages)
    }

    #[tokio::test]
    async fn greeting_reply_mentions_bot_name() {
        let messages = vec![
            ChatMessage::system("# 角色设定\n你是小雪，一个助手"),
            ChatMessage::user("你好"),
        ];
        let outcome = MockProvider::new().complete(request(messages)).await.unwrap();
        assert!(outcome.text.contains("小雪"));
    }

    #[tokio::test]
    async fn identical_input_gives_identical_output() {
        let messages = vec![ChatMessage::user("随便聊聊")];
        let a = MockProvider::new().complete(request(messages.clone())).await.unwrap();
        let b = MockProvider::new().complete(request(messages)).await.unwrap();
        assert_eq!(a.text, b.text);
    }

    #[tokio::test]
    async fn thinking_flag_produces_steps() {
        let mut req = request(vec![ChatMessage::user("你好")]);
        req.enable_thinking = true;
        let outcome = MockProvider::new().complete(req).await.unwrap();
        let steps = outcome.thinking_steps.unwrap();
        assert!(steps.len() >= 4);
        assert!(steps[0].contains("你好"));
    }

    #[tokio::test]
    async fn stylized_speech_suffix_follows_prompt() {
        let messages = vec![
            ChatMessage::system("你是天城，温柔的女仆\n- 在句尾添加\"喵～\"等可爱语气词"),
            ChatMessage::user("你好"),
        ];
        let outcome = MockProvider::new().complete(request(messages)).await.unwrap();
        assert!(outcome.text.contains("喵～"));
    }
}
