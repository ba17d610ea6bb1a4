use crate::api_types::ChatMessage;
use maeum_core::{ConversationHistory, Mode};

const PERSONA_BASE: &str = "당신은 감정 상담을 해주는 따뜻한 챗봇입니다. \
사용자의 감정을 이해하고 요청한 스타일에 따라 답변해야 합니다. ";

const PERSONA_T: &str = "지금은 이성적 조언(T)을 원합니다. \
상황을 차분히 정리하고 현실적으로 해볼 수 있는 방향을 짧게 제시하세요. \
무조건 부드러운 어조를 유지하세요.";

const PERSONA_F: &str = "지금은 감성적 공감(F)을 원합니다. \
먼저 사용자의 감정을 알아주고 따뜻하게 위로하는 짧은 답변을 하세요. \
무조건 부드러운 어조를 유지하세요.";

/// System instruction for the forced-choice mode classifier.
pub const MODE_CLASSIFIER_PROMPT: &str = "사용자의 문장이 이성적인 조언(T)을 원하는지, \
감성적인 공감(F)을 원하는지 판단하세요. 다른 말 없이 T 또는 F 한 글자만 답하세요.";

pub fn persona(mode: Mode) -> String {
    let style = match mode {
        Mode::T => PERSONA_T,
        Mode::F => PERSONA_F,
    };
    format!("{}{}", PERSONA_BASE, style)
}

/// `[요청 스타일: T]` marker prepended to the current utterance.
pub fn style_marker(mode: Mode, input: &str) -> String {
    format!("[요청 스타일: {}]\n{}", mode, input)
}

/// Builds the role-tagged message list for one completion.
#[derive(Debug, Clone, Copy)]
pub struct PromptAssembler {
    /// Prior turns replayed, most recent kept.
    pub window: usize,
    pub tag_style: bool,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self {
            window: 10,
            tag_style: true,
        }
    }
}

impl PromptAssembler {
    pub fn new(window: usize, tag_style: bool) -> Self {
        Self { window, tag_style }
    }

    /// One system persona, a user/assistant pair per kept prior turn, then
    /// the current input. Turns with a blank side are skipped.
    pub fn build_messages(
        &self,
        history: &ConversationHistory,
        input: &str,
        mode: Mode,
    ) -> Vec<ChatMessage> {
        let turns = history.recent(self.window);
        let mut messages = Vec::with_capacity(turns.len() * 2 + 2);
        messages.push(ChatMessage::system(persona(mode)));

        for turn in turns {
            if turn.user_input.trim().is_empty() || turn.response.trim().is_empty() {
                continue;
            }
            messages.push(ChatMessage::user(&turn.user_input));
            messages.push(ChatMessage::assistant(&turn.response));
        }

        let current = if self.tag_style {
            style_marker(mode, input)
        } else {
            input.to_string()
        };
        messages.push(ChatMessage::user(current));
        messages
    }
}
