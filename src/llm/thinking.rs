//! Thinking-trace protocol shared by the HTTP providers.
//!
//! When a caller asks for a trace, a system preamble instructs the model
//! to wrap its reasoning in `<thinking>` tags; the tags are stripped from
//! the reply and the inner lines become discrete steps.

use crate::llm::ChatMessage;

pub const THINKING_PROMPT: &str = "\
请在回答问题时，先展示你的思考过程。格式如下：
<thinking>
1. 分析问题...
2. 考虑可能的解决方案...
3. 选择最佳方案...
</thinking>

然后给出你的最终回答。";

const OPEN_TAG: &str = "<thinking>";
const CLOSE_TAG: &str = "</thinking>";

/// Prepend the thinking preamble as an extra system message.
pub fn inject_thinking_prompt(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut enhanced = Vec::with_capacity(messages.len() + 1);
    enhanced.push(ChatMessage::system(THINKING_PROMPT));
    enhanced.extend(messages);
    enhanced
}

/// Split a reply into (final answer, thinking steps). Replies without a
/// well-formed block come back untouched.
pub fn split_thinking(content: &str) -> (String, Option<Vec<String>>) {
    let Some(open) = content.find(OPEN_TAG) else {
        return (content.to_string(), None);
    };
    let start = open + OPEN_TAG.len();
    let Some(close_rel) = content[start..].find(CLOSE_TAG) else {
        return (content.to_string(), None);
    };
    let close = start + close_rel;

    let steps: Vec<String> = content[start..close]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let mut answer = String::new();
    answer.push_str(content[..open].trim_end());
    let tail = content[close + CLOSE_TAG.len()..].trim_start();
    if !answer.is_empty() && !tail.is_empty() {
        answer.push('\n');
    }
    answer.push_str(tail);

    (answer.trim().to_string(), Some(steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_well_formed_block() {
        let raw = "<thinking>\n1. step one\n2. step two\n</thinking>\n最终回答";
        let (answer, steps) = split_thinking(raw);
        assert_eq!(answer, "最终回答");
        assert_eq!(steps.unwrap(), vec!["1. step one", "2. step two"]);
    }

    #[test]
    fn missing_close_tag_passes_through() {
        let raw = "<thinking>half a block and then text";
        let (answer, steps) = split_thinking(raw);
        assert_eq!(answer, raw);
        assert!(steps.is_none());
    }

    #[test]
    fn plain_reply_passes_through() {
        let (answer, steps) = split_thinking("你好呀");
        assert_eq!(answer, "你好呀");
        assert!(steps.is_none());
    }

    #[test]
    fn inject_puts_preamble_first() {
        let messages = vec![ChatMessage::user("hi")];
        let enhanced = inject_thinking_prompt(messages);
        assert_eq!(enhanced.len(), 2);
        assert_eq!(enhanced[0].role, "system");
        assert!(enhanced[0].content.contains("<thinking>"));
    }
}
