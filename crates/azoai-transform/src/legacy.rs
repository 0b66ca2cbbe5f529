use serde_json::Map;

use azoai_protocol::azure::chat_completions::request::{ChatMessage, MessageContent};
use azoai_protocol::azure::completions::{
    CompletionsRequestBody, TextChoice, TextCompletion, TextCompletionObjectType,
};
use azoai_protocol::{ChatCompletion, ChatCompletionsRequestBody};

use crate::helpers::is_azure_prefixed;

/// Rewrite a legacy completions body as a chat request: the prompt becomes
/// a single user message and the remaining generation params ride along.
pub fn completion_to_chat_body(
    body: CompletionsRequestBody,
    deployment: &str,
) -> ChatCompletionsRequestBody {
    let mut extra = body.extra;
    extra.retain(|key, _| !is_azure_prefixed(key));

    ChatCompletionsRequestBody {
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: Some(MessageContent::Text(body.prompt)),
            extra: Map::new(),
        }],
        model: Some(deployment.to_string()),
        stream: body.stream,
        temperature: None,
        top_p: None,
        frequency_penalty: None,
        presence_penalty: None,
        max_tokens: None,
        n: None,
        stop: None,
        tools: None,
        tool_choice: None,
        user: None,
        extra,
    }
}

/// Fold the chat-shaped result back into the `text_completion` envelope the
/// legacy surface promises.
pub fn chat_to_text_completion(chat: ChatCompletion) -> TextCompletion {
    let choices = chat
        .choices
        .into_iter()
        .map(|choice| TextChoice {
            text: choice.message.content.unwrap_or_default(),
            index: choice.index,
            finish_reason: choice.finish_reason,
            logprobs: None,
            content_filter_results: choice.content_filter_results,
        })
        .collect();

    TextCompletion {
        id: chat.id,
        object: TextCompletionObjectType::TextCompletion,
        created: chat.created,
        model: chat.model,
        choices,
        usage: chat.usage,
        system_fingerprint: chat.system_fingerprint,
        prompt_filter_results: chat.prompt_filter_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::response::to_azure_chat_completion;
    use azoai_protocol::{CustomChatResponse, FinishReason};

    #[test]
    fn prompt_becomes_a_single_user_message() {
        let body: CompletionsRequestBody =
            serde_json::from_str(r#"{"prompt":"Once upon a time","max_tokens":5}"#).unwrap();
        let chat = completion_to_chat_body(body, "gpt-35-turbo");
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Once upon a time");
        assert_eq!(json["model"], "gpt-35-turbo");
        assert_eq!(json["max_tokens"], 5);
    }

    #[test]
    fn stream_flag_is_preserved() {
        let body: CompletionsRequestBody =
            serde_json::from_str(r#"{"prompt":"go","stream":true}"#).unwrap();
        assert_eq!(completion_to_chat_body(body, "dep").stream, Some(true));
    }

    #[test]
    fn chat_result_is_rewritten_to_text_completion() {
        let upstream: CustomChatResponse = serde_json::from_str(
            r#"{"id":"c","choices":[{"message":{"role":"assistant","content":" there lived"},"finish_reason":"stop"}],
                "usage":{"prompt_tokens":4,"completion_tokens":3,"total_tokens":7}}"#,
        )
        .unwrap();
        let chat = to_azure_chat_completion(upstream, "gpt-35-turbo", "fp");
        let text = chat_to_text_completion(chat);
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["object"], "text_completion");
        assert_eq!(json["choices"][0]["text"], " there lived");
        assert_eq!(json["choices"][0]["index"], 0);
        assert!(json["choices"][0]["logprobs"].is_null());
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
        assert_eq!(text.choices[0].finish_reason, Some(FinishReason::Stop));
    }
}
