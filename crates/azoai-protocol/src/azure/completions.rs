use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::azure::chat_completions::response::{PromptFilterResult, Usage};
use crate::azure::content_filter::ContentFilterResults;
use crate::azure::types::FinishReason;

/// The legacy completions body. Internally rewritten into a chat request;
/// generation params ride through the flatten map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompletionsRequestBody {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextCompletionObjectType {
    #[serde(rename = "text_completion")]
    TextCompletion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TextCompletion {
    pub id: String,
    pub object: TextCompletionObjectType,
    pub created: i64,
    pub model: String,
    pub choices: Vec<TextChoice>,
    pub usage: Usage,
    pub system_fingerprint: String,
    pub prompt_filter_results: Vec<PromptFilterResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TextChoice {
    pub text: String,
    pub index: i64,
    pub finish_reason: Option<FinishReason>,
    pub logprobs: Option<JsonValue>,
    pub content_filter_results: ContentFilterResults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_and_extras_parse() {
        let body: CompletionsRequestBody =
            serde_json::from_str(r#"{"prompt":"Once upon a time","max_tokens":5}"#).unwrap();
        assert_eq!(body.prompt, "Once upon a time");
        assert_eq!(body.extra["max_tokens"], 5);
        assert_eq!(body.stream, None);
    }
}
