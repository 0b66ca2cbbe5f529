use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:7000";
pub const DEFAULT_REGION_TAG: &str = "East US";
pub const DEFAULT_SYSTEM_FINGERPRINT: &str = "fp_custom_proxy";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProxyConfigError {
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
    #[error("invalid config value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Final, merged proxy configuration used by the running process.
///
/// Merge order: CLI > ENV > built-in defaults. Immutable after startup;
/// request handlers hold it behind an `Arc` and only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Base URL of the custom upstream API (no trailing slash).
    pub upstream_base_url: String,
    /// Credential the proxy presents to the upstream on its own account.
    pub upstream_api_key: String,
    pub listen_addr: String,
    /// Region tag echoed in the `x-ms-region` response header.
    pub region_tag: String,
    /// Total deadline for buffered upstream calls.
    pub buffered_timeout: Duration,
    /// Total deadline for streaming upstream calls.
    pub stream_timeout: Duration,
    /// Maximum gap between any two received upstream bytes (streaming only).
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_body_bytes: usize,
    /// Fallback `system_fingerprint` when the upstream does not report one.
    pub system_fingerprint: String,
}

/// Optional layer used for merging proxy config from CLI/ENV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfigPatch {
    pub upstream_base_url: Option<String>,
    pub upstream_api_key: Option<String>,
    pub listen_addr: Option<String>,
    pub region_tag: Option<String>,
    pub buffered_timeout_ms: Option<u64>,
    pub stream_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub max_body_bytes: Option<usize>,
    pub system_fingerprint: Option<String>,
}

impl ProxyConfigPatch {
    pub fn overlay(&mut self, other: ProxyConfigPatch) {
        if other.upstream_base_url.is_some() {
            self.upstream_base_url = other.upstream_base_url;
        }
        if other.upstream_api_key.is_some() {
            self.upstream_api_key = other.upstream_api_key;
        }
        if other.listen_addr.is_some() {
            self.listen_addr = other.listen_addr;
        }
        if other.region_tag.is_some() {
            self.region_tag = other.region_tag;
        }
        if other.buffered_timeout_ms.is_some() {
            self.buffered_timeout_ms = other.buffered_timeout_ms;
        }
        if other.stream_timeout_ms.is_some() {
            self.stream_timeout_ms = other.stream_timeout_ms;
        }
        if other.idle_timeout_ms.is_some() {
            self.idle_timeout_ms = other.idle_timeout_ms;
        }
        if other.connect_timeout_ms.is_some() {
            self.connect_timeout_ms = other.connect_timeout_ms;
        }
        if other.max_body_bytes.is_some() {
            self.max_body_bytes = other.max_body_bytes;
        }
        if other.system_fingerprint.is_some() {
            self.system_fingerprint = other.system_fingerprint;
        }
    }

    pub fn into_config(self) -> Result<ProxyConfig, ProxyConfigError> {
        let upstream_base_url = self
            .upstream_base_url
            .ok_or(ProxyConfigError::MissingField("upstream_base_url"))?;
        let upstream_api_key = self
            .upstream_api_key
            .ok_or(ProxyConfigError::MissingField("upstream_api_key"))?;

        Ok(ProxyConfig {
            upstream_base_url: normalize_base_url(&upstream_base_url)?,
            upstream_api_key,
            listen_addr: normalize_listen_addr(
                self.listen_addr
                    .as_deref()
                    .unwrap_or(DEFAULT_LISTEN_ADDR),
            ),
            region_tag: self
                .region_tag
                .unwrap_or_else(|| DEFAULT_REGION_TAG.to_string()),
            buffered_timeout: Duration::from_millis(self.buffered_timeout_ms.unwrap_or(30_000)),
            stream_timeout: Duration::from_millis(self.stream_timeout_ms.unwrap_or(600_000)),
            idle_timeout: Duration::from_millis(self.idle_timeout_ms.unwrap_or(60_000)),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms.unwrap_or(5_000)),
            max_body_bytes: self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
            system_fingerprint: self
                .system_fingerprint
                .unwrap_or_else(|| DEFAULT_SYSTEM_FINGERPRINT.to_string()),
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ProxyConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ProxyConfigError::MissingField("upstream_base_url"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ProxyConfigError::InvalidValue {
            field: "upstream_base_url",
            value: raw.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Accepts both `host:port` and the bare `:port` shorthand.
fn normalize_listen_addr(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(port) = trimmed.strip_prefix(':') {
        return format!("0.0.0.0:{port}");
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> ProxyConfigPatch {
        ProxyConfigPatch {
            upstream_base_url: Some("https://upstream.example.com/".to_string()),
            upstream_api_key: Some("sk-upstream".to_string()),
            ..ProxyConfigPatch::default()
        }
    }

    #[test]
    fn defaults_fill_in() {
        let config = required().into_config().unwrap();
        assert_eq!(config.upstream_base_url, "https://upstream.example.com");
        assert_eq!(config.listen_addr, "0.0.0.0:7000");
        assert_eq!(config.region_tag, "East US");
        assert_eq!(config.buffered_timeout, Duration::from_secs(30));
        assert_eq!(config.stream_timeout, Duration::from_secs(600));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.system_fingerprint, "fp_custom_proxy");
    }

    #[test]
    fn missing_upstream_key_is_an_error() {
        let mut patch = required();
        patch.upstream_api_key = None;
        assert!(matches!(
            patch.into_config(),
            Err(ProxyConfigError::MissingField("upstream_api_key"))
        ));
    }

    #[test]
    fn bare_port_listen_addr_is_expanded() {
        let mut patch = required();
        patch.listen_addr = Some(":9100".to_string());
        let config = patch.into_config().unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9100");
    }

    #[test]
    fn overlay_prefers_the_newer_layer() {
        let mut base = required();
        base.region_tag = Some("West Europe".to_string());
        base.overlay(ProxyConfigPatch {
            region_tag: Some("East US 2".to_string()),
            ..ProxyConfigPatch::default()
        });
        assert_eq!(base.region_tag.as_deref(), Some("East US 2"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let mut patch = required();
        patch.upstream_base_url = Some("ftp://upstream".to_string());
        assert!(matches!(
            patch.into_config(),
            Err(ProxyConfigError::InvalidValue { field: "upstream_base_url", .. })
        ));
    }
}
