use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::azure::chat_completions::response::PromptFilterResult;
use crate::azure::types::FinishReason;

/// One decoded upstream SSE event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    #[serde(default)]
    pub choices: Vec<CustomChunkChoice>,
    /// Leading filter-check event: prompt results and no choices.
    #[serde(default)]
    pub prompt_filter_results: Option<Vec<PromptFilterResult>>,
    /// In-stream upstream failure.
    #[serde(default)]
    pub error: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomChunkChoice {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub delta: CustomDelta,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_and_content_chunks_parse() {
        let role: CustomChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"role":"assistant"},"finish_reason":null,"index":0}]}"#,
        )
        .unwrap();
        assert_eq!(role.choices[0].delta.role.as_deref(), Some("assistant"));
        assert!(role.error.is_none());

        let content: CustomChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null,"index":0}]}"#,
        )
        .unwrap();
        assert_eq!(content.choices[0].delta.content.as_deref(), Some("Hel"));
    }

    #[test]
    fn error_only_event_parses() {
        let chunk: CustomChunk =
            serde_json::from_str(r#"{"error":{"message":"overloaded","code":429}}"#).unwrap();
        assert!(chunk.choices.is_empty());
        assert_eq!(chunk.error.unwrap()["message"], "overloaded");
    }

    #[test]
    fn prompt_filter_event_parses() {
        let chunk: CustomChunk = serde_json::from_str(
            r#"{"prompt_filter_results":[{"prompt_index":0,"content_filter_results":{}}],"choices":[]}"#,
        )
        .unwrap();
        assert!(chunk.prompt_filter_results.is_some());
        assert!(chunk.choices.is_empty());
    }
}
