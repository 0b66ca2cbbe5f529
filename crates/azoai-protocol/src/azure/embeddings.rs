use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingsRequestBody {
    pub input: EmbeddingsInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingsInput {
    Single(String),
    Many(Vec<String>),
}

impl EmbeddingsInput {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => text.is_empty(),
            Self::Many(items) => items.is_empty() || items.iter().any(|item| item.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_input_shapes_parse() {
        let single: EmbeddingsRequestBody = serde_json::from_str(r#"{"input":"hello"}"#).unwrap();
        assert!(!single.input.is_empty());

        let many: EmbeddingsRequestBody =
            serde_json::from_str(r#"{"input":["a","b"],"model":"text-embedding-3-small"}"#).unwrap();
        assert!(!many.input.is_empty());
        assert_eq!(many.model.as_deref(), Some("text-embedding-3-small"));
    }

    #[test]
    fn empty_inputs_are_detected() {
        assert!(EmbeddingsInput::Single(String::new()).is_empty());
        assert!(EmbeddingsInput::Many(Vec::new()).is_empty());
        assert!(EmbeddingsInput::Many(vec!["ok".to_string(), String::new()]).is_empty());
    }
}
