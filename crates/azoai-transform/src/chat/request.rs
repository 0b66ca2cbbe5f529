use azoai_protocol::ChatCompletionsRequestBody;

use crate::helpers::is_azure_prefixed;

/// Shape an Azure chat body for the upstream: the deployment from the URL
/// becomes the upstream `model`, Azure-only extension keys are dropped, and
/// everything else (messages included) is preserved verbatim.
pub fn to_upstream_chat_body(
    mut body: ChatCompletionsRequestBody,
    deployment: &str,
) -> ChatCompletionsRequestBody {
    body.model = Some(deployment.to_string());
    body.extra.retain(|key, _| !is_azure_prefixed(key));
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_replaces_the_client_model() {
        let body: ChatCompletionsRequestBody = serde_json::from_str(
            r#"{"model":"whatever","messages":[{"role":"user","content":"Hi"}],"stream":true,"temperature":0.2}"#,
        )
        .unwrap();
        let out = to_upstream_chat_body(body, "gpt-4o-mini");
        assert_eq!(out.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(out.stream, Some(true));
        assert_eq!(out.temperature, Some(0.2));
    }

    #[test]
    fn azure_extension_keys_are_stripped_but_others_pass() {
        let body: ChatCompletionsRequestBody = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"Hi"}],
                "azure_search_endpoint":"https://x","seed":11}"#,
        )
        .unwrap();
        let out = to_upstream_chat_body(body, "dep");
        assert!(!out.extra.contains_key("azure_search_endpoint"));
        assert_eq!(out.extra["seed"], 11);
    }

    #[test]
    fn vision_content_arrays_survive_untouched() {
        let input = r#"{"messages":[{"role":"user","content":[
            {"type":"text","text":"describe"},
            {"type":"image_url","image_url":{"url":"data:image/png;base64,AAA","detail":"auto"}}
        ]}]}"#;
        let body: ChatCompletionsRequestBody = serde_json::from_str(input).unwrap();
        let out = to_upstream_chat_body(body, "gpt-4o");
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAA"
        );
    }
}
