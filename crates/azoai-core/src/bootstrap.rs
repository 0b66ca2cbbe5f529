use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use azoai_common::{ProxyConfig, ProxyConfigPatch};

use crate::engine::ProxyEngine;
use crate::upstream_client::{HttpUpstreamClient, UpstreamClient};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "azoai",
    version,
    about = "Azure OpenAI compatibility proxy for a custom chat API"
)]
pub struct CliArgs {
    /// Base URL of the custom upstream API.
    #[arg(long, env = "UPSTREAM_BASE_URL")]
    pub upstream_base_url: Option<String>,

    /// Credential the proxy uses against the upstream.
    #[arg(long, env = "UPSTREAM_API_KEY")]
    pub upstream_api_key: Option<String>,

    /// Bind address, `host:port` or `:port`.
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Region tag echoed in x-ms-region.
    #[arg(long, env = "REGION_TAG")]
    pub region_tag: Option<String>,

    #[arg(long, env = "TOTAL_TIMEOUT_BUFFERED_MS")]
    pub total_timeout_buffered_ms: Option<u64>,

    #[arg(long, env = "TOTAL_TIMEOUT_STREAM_MS")]
    pub total_timeout_stream_ms: Option<u64>,

    #[arg(long, env = "IDLE_TIMEOUT_MS")]
    pub idle_timeout_ms: Option<u64>,

    #[arg(long, env = "CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: Option<u64>,

    #[arg(long, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    /// Fallback system_fingerprint for generated responses.
    #[arg(long, env = "SYSTEM_FINGERPRINT")]
    pub system_fingerprint: Option<String>,
}

pub struct Bootstrap {
    pub config: Arc<ProxyConfig>,
    pub engine: Arc<ProxyEngine>,
}

pub fn bootstrap_from_env() -> anyhow::Result<Bootstrap> {
    bootstrap(CliArgs::parse())
}

pub fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let patch = ProxyConfigPatch {
        upstream_base_url: sanitize(args.upstream_base_url),
        upstream_api_key: sanitize(args.upstream_api_key),
        listen_addr: sanitize(args.listen_addr),
        region_tag: sanitize(args.region_tag),
        buffered_timeout_ms: args.total_timeout_buffered_ms,
        stream_timeout_ms: args.total_timeout_stream_ms,
        idle_timeout_ms: args.idle_timeout_ms,
        connect_timeout_ms: args.connect_timeout_ms,
        max_body_bytes: args.max_body_bytes,
        system_fingerprint: sanitize(args.system_fingerprint),
    };

    let config = Arc::new(patch.into_config().context("finalize proxy config")?);
    let client: Arc<dyn UpstreamClient> = Arc::new(
        HttpUpstreamClient::new(&config).context("build upstream http client")?,
    );
    let engine = Arc::new(ProxyEngine::new(config.clone(), client));

    Ok(Bootstrap { config, engine })
}

fn sanitize(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // Some PaaS systems inject unresolved placeholders like `${VAR}`;
    // treat them as "not set" so startup fails with a clear message.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}
