use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{
    Client,
    header::{REFERER, USER_AGENT},
};
use rustls::{ClientConfig, crypto::aws_lc_rs};
use rustls_platform_verifier::BuilderVerifierExt;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::debug;

use crate::error::TransferError;
use crate::progress::{ProgressEvent, ProgressReporter, Stage};

/// Client for bulk media transfers.
///
/// Connect timeout only: a large transfer legitimately runs for as long as
/// the CDN keeps feeding bytes, so no overall deadline is imposed.
pub fn download_client() -> Client {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("Failed to configure default TLS protocol versions")
        .with_platform_verifier()
        .expect("Failed to initialize platform certificate verifier")
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
}

/// Stream `url` into `dest`, reporting cumulative progress.
///
/// The destination file is created before the first chunk and closed on
/// every exit path. A partially written file is left in place on failure;
/// sweeping it is the caller's job. Returns the number of bytes written.
pub async fn fetch_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    user_agent: &str,
    referer: &str,
    reporter: &ProgressReporter,
) -> Result<u64, TransferError> {
    let response = client
        .get(url)
        .header(USER_AGENT, user_agent)
        .header(REFERER, referer)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::http_status(status, url));
    }

    let total = response.content_length().filter(|len| *len > 0);
    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        let percent =
            total.map(|len| ((written as f64 / len as f64) * 100.0).min(100.0) as f32);
        reporter.report(ProgressEvent {
            stage: Stage::Download,
            percent,
            bytes_done: Some(written),
            bytes_total: total,
        });
    }
    file.flush().await?;

    debug!(bytes = written, path = %dest.display(), "download finished");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn test_fetch_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("body");
        let written = fetch_to_file(
            &download_client(),
            "https://www.example.com/",
            &dest,
            "Mozilla/5.0",
            "https://www.example.com/",
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();
        assert!(written > 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), written);
    }
}
