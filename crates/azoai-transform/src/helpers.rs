use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or_default()
}

/// Fresh `chatcmpl-` id for responses whose upstream did not report one.
pub fn new_completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4().simple())
}

/// Generation parameters the original Azure surface prefixes with `azure`
/// are meaningless to the upstream and are dropped; everything else passes
/// through.
pub fn is_azure_prefixed(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    lowered.starts_with("azure_") || lowered.starts_with("azureml_") || key == "data_sources"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_ids_carry_the_chatcmpl_prefix() {
        let id = new_completion_id();
        assert!(id.starts_with("chatcmpl-"));
        assert!(id.len() > "chatcmpl-".len());
    }

    #[test]
    fn azure_prefix_detection() {
        assert!(is_azure_prefixed("azure_search_endpoint"));
        assert!(is_azure_prefixed("azureml_workspace"));
        assert!(is_azure_prefixed("data_sources"));
        assert!(!is_azure_prefixed("seed"));
        assert!(!is_azure_prefixed("stream_options"));
    }
}
