use std::sync::Arc;

use reqwest::Client;
use rustls::{ClientConfig, crypto::aws_lc_rs};
use rustls_platform_verifier::BuilderVerifierExt;

pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

pub const BASE_URL: &str = "https://www.bilibili.com";

pub(crate) const NAV_URL: &str = "https://api.bilibili.com/x/web-interface/nav";
pub(crate) const VIEW_URL: &str = "https://api.bilibili.com/x/web-interface/view";
pub(crate) const PLAYURL_URL: &str = "https://api.bilibili.com/x/player/wbi/playurl";

/// Client for API calls. Short requests only, so a bounded timeout applies;
/// bulk media transfers use their own client.
pub fn default_client() -> Client {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("Failed to configure default TLS protocol versions")
        .with_platform_verifier()
        .expect("Failed to initialize platform certificate verifier")
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
}

/// Referer value the CDN and the playurl endpoint expect for a given video.
pub fn video_referer(bvid: &str) -> String {
    format!("{BASE_URL}/video/{bvid}")
}
