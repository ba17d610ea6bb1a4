use maeum_core::{ClassificationResult, ConversationHistory};
use serde::{Deserialize, Serialize};

/// Body of `/analyze/emotion` and `/diary/text`.
#[derive(Debug, Clone, Deserialize)]
pub struct TextInput {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub text: String,
    pub emotions: ClassificationResult,
}

/// `?emotion=&limit=` on the recommendation routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendQuery {
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatTextRequest {
    pub text: String,
    #[serde(default)]
    pub diary_id: Option<i64>,
    /// Inline history for diary-less conversations; malformed turns are dropped.
    #[serde(default)]
    pub history: ConversationHistory,
    #[serde(default)]
    pub speak: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub id: i64,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use maeum_core::Mode;

    #[test]
    fn test_chat_request_minimal() {
        let req: ChatTextRequest = serde_json::from_str(r#"{"text": "안녕"}"#).unwrap();
        assert_eq!(req.text, "안녕");
        assert!(req.diary_id.is_none());
        assert!(req.history.is_empty());
        assert!(!req.speak);
    }

    #[test]
    fn test_chat_request_lenient_history() {
        let json = r#"{
            "text": "이성적으로 조언해줘",
            "history": [
                {"user_input": "오늘 속상했어", "response": "괜찮아요", "mode": "F"},
                {"user_input": "no response"}
            ]
        }"#;
        let req: ChatTextRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.history.len(), 1);
        assert_eq!(req.history.prior_mode(), Mode::F);
    }
}
