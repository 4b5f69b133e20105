use std::sync::LazyLock;

use regex::Regex;
use reqwest::{
    Client,
    header::{REFERER, USER_AGENT},
};
use tracing::debug;

use crate::client::{BASE_URL, DEFAULT_UA, VIEW_URL};
use crate::error::BiliError;
use crate::models::{ApiEnvelope, VideoData};

pub static BV_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(BV[a-zA-Z0-9]{10})").unwrap());

/// Everything later stages need to know about a video.
///
/// `bvid` is the public share identifier; `cid` is the secondary id the
/// playurl endpoint wants alongside it. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct VideoIdentity {
    pub bvid: String,
    pub cid: u64,
    pub title: String,
    /// Publish time, seconds since epoch, as reported by the platform.
    pub pubdate: i64,
}

/// Pull the BV id out of any share URL shape (web, short link, extra params).
pub fn extract_bvid(url: &str) -> Option<&str> {
    BV_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolve a share URL to a [`VideoIdentity`] via the view endpoint.
pub async fn resolve_video(client: &Client, url: &str) -> Result<VideoIdentity, BiliError> {
    let bvid = extract_bvid(url).ok_or_else(|| BiliError::IdentifierNotFound(url.to_string()))?;

    let envelope = client
        .get(VIEW_URL)
        .query(&[("bvid", bvid)])
        .header(USER_AGENT, DEFAULT_UA)
        .header(REFERER, BASE_URL)
        .send()
        .await?
        .json::<ApiEnvelope<VideoData>>()
        .await?;

    if envelope.code != 0 {
        return Err(BiliError::UpstreamRejected {
            code: envelope.code,
            message: envelope.message,
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| BiliError::Other("view response missing data".to_string()))?;

    debug!(bvid, title = %data.title, cid = data.cid, "resolved video");

    Ok(VideoIdentity {
        bvid: bvid.to_owned(),
        cid: data.cid,
        title: data.title,
        pubdate: data.pubdate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bvid() {
        assert_eq!(
            extract_bvid("https://www.bilibili.com/video/BV1GJ411x7h7/?spm_id_from=333.999"),
            Some("BV1GJ411x7h7")
        );
        // the id can sit anywhere in the string
        assert_eq!(
            extract_bvid("watch this BV1GJ411x7h7 later"),
            Some("BV1GJ411x7h7")
        );
        assert_eq!(extract_bvid("https://www.bilibili.com/"), None);
        // too short
        assert_eq!(extract_bvid("BV1GJ411x7"), None);
    }

    #[tokio::test]
    #[ignore]
    async fn test_resolve_video() {
        let client = crate::client::default_client();
        let identity = resolve_video(&client, "https://www.bilibili.com/video/BV1GJ411x7h7")
            .await
            .unwrap();
        println!("{identity:?}");
        assert_eq!(identity.bvid, "BV1GJ411x7h7");
    }
}
