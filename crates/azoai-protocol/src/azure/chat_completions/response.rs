use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::azure::content_filter::{ContentFilterResults, PromptContentFilterResults};
use crate::azure::types::FinishReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatCompletionObjectType {
    #[serde(rename = "chat.completion")]
    ChatCompletion,
}

/// The buffered chat-completion envelope the proxy emits.
///
/// `logprobs`, `refusal` and `annotations` are serialized even when empty;
/// Azure clients expect the keys to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatCompletion {
    pub id: String,
    pub object: ChatCompletionObjectType,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
    pub system_fingerprint: String,
    pub prompt_filter_results: Vec<PromptFilterResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptFilterResult {
    pub prompt_index: i64,
    pub content_filter_results: PromptContentFilterResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatChoice {
    pub index: i64,
    pub message: AssistantMessage,
    pub finish_reason: Option<FinishReason>,
    pub logprobs: Option<JsonValue>,
    pub content_filter_results: ContentFilterResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AssistantMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<JsonValue>,
    pub refusal: Option<JsonValue>,
    pub annotations: Vec<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Usage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub completion_tokens_details: CompletionTokensDetails,
    pub prompt_tokens_details: PromptTokensDetails,
}

/// Azure emits the detail objects unconditionally, zero-filled when the
/// upstream had nothing to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompletionTokensDetails {
    #[serde(default)]
    pub accepted_prediction_tokens: i64,
    #[serde(default)]
    pub audio_tokens: i64,
    #[serde(default)]
    pub reasoning_tokens: i64,
    #[serde(default)]
    pub rejected_prediction_tokens: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptTokensDetails {
    #[serde(default)]
    pub audio_tokens: i64,
    #[serde(default)]
    pub cached_tokens: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_keys_are_emitted() {
        let choice = ChatChoice {
            index: 0,
            message: AssistantMessage {
                role: "assistant".to_string(),
                content: Some("Hello".to_string()),
                tool_calls: None,
                refusal: None,
                annotations: Vec::new(),
            },
            finish_reason: Some(FinishReason::Stop),
            logprobs: None,
            content_filter_results: ContentFilterResults::safe(),
        };
        let json = serde_json::to_value(&choice).unwrap();
        assert!(json["logprobs"].is_null());
        assert!(json["message"]["refusal"].is_null());
        assert_eq!(json["message"]["annotations"], serde_json::json!([]));
        assert!(json["message"].get("tool_calls").is_none());
        assert_eq!(json["finish_reason"], "stop");
    }
}
