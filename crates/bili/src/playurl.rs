use std::fmt::Display;

use reqwest::{
    Client,
    header::{REFERER, USER_AGENT},
};
use tracing::debug;

use crate::client::{DEFAULT_UA, PLAYURL_URL, video_referer};
use crate::error::BiliError;
use crate::models::{ApiEnvelope, Dash, DashStream, PlayData};
use crate::video::VideoIdentity;
use crate::wbi::{WbiKeys, signed_query};

// Request every available DASH representation.
const FNVAL_DASH_ALL: &str = "4048";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// One elementary stream representation offered by the catalog.
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    pub kind: MediaKind,
    /// Platform quality id; higher means better.
    pub quality_id: u32,
    pub url: String,
}

/// The audio and video representations available for one video.
#[derive(Debug, Default)]
pub struct Catalog {
    audio: Vec<StreamDescriptor>,
    video: Vec<StreamDescriptor>,
}

impl Catalog {
    pub(crate) fn from_dash(dash: Dash) -> Self {
        fn collect(streams: Option<Vec<DashStream>>, kind: MediaKind) -> Vec<StreamDescriptor> {
            streams
                .unwrap_or_default()
                .into_iter()
                .map(|s| StreamDescriptor {
                    kind,
                    quality_id: s.id,
                    url: s.base_url,
                })
                .collect()
        }
        Self {
            audio: collect(dash.audio, MediaKind::Audio),
            video: collect(dash.video, MediaKind::Video),
        }
    }

    pub fn streams(&self, kind: MediaKind) -> &[StreamDescriptor] {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }

    /// Highest-quality representation of the given kind.
    ///
    /// Stable descending sort on the quality id; on equal ids the one the
    /// catalog listed first wins.
    pub fn select_best(&self, kind: MediaKind) -> Result<&StreamDescriptor, BiliError> {
        let mut ranked: Vec<&StreamDescriptor> = self.streams(kind).iter().collect();
        ranked.sort_by(|a, b| b.quality_id.cmp(&a.quality_id));
        ranked
            .first()
            .copied()
            .ok_or(BiliError::NoStreamAvailable(kind))
    }
}

/// Fetch the DASH catalog for a video through the signed playurl endpoint.
pub async fn fetch_catalog(
    client: &Client,
    identity: &VideoIdentity,
    keys: &WbiKeys,
) -> Result<Catalog, BiliError> {
    let params = vec![
        ("bvid", identity.bvid.clone()),
        ("cid", identity.cid.to_string()),
        ("fnval", FNVAL_DASH_ALL.to_string()),
        ("fourk", "1".to_string()),
    ];
    let query = signed_query(params, keys)?;
    let api_url = format!("{PLAYURL_URL}?{query}");

    let envelope = client
        .get(&api_url)
        .header(USER_AGENT, DEFAULT_UA)
        .header(REFERER, video_referer(&identity.bvid))
        .send()
        .await?
        .json::<ApiEnvelope<PlayData>>()
        .await?;

    if envelope.code != 0 {
        return Err(BiliError::UpstreamRejected {
            code: envelope.code,
            message: envelope.message,
        });
    }

    let dash = envelope
        .data
        .and_then(|data| data.dash)
        .unwrap_or_default();
    let catalog = Catalog::from_dash(dash);
    debug!(
        bvid = %identity.bvid,
        audio = catalog.audio.len(),
        video = catalog.video.len(),
        "fetched stream catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(kind: MediaKind, quality_id: u32, url: &str) -> StreamDescriptor {
        StreamDescriptor {
            kind,
            quality_id,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_select_best_picks_highest_quality() {
        let catalog = Catalog {
            audio: vec![
                descriptor(MediaKind::Audio, 30280, "a"),
                descriptor(MediaKind::Audio, 30216, "b"),
                descriptor(MediaKind::Audio, 30232, "c"),
            ],
            video: vec![],
        };
        let best = catalog.select_best(MediaKind::Audio).unwrap();
        assert_eq!(best.quality_id, 30280);
    }

    #[test]
    fn test_select_best_empty_catalog() {
        let catalog = Catalog::default();
        assert!(matches!(
            catalog.select_best(MediaKind::Audio),
            Err(BiliError::NoStreamAvailable(MediaKind::Audio))
        ));
        assert!(matches!(
            catalog.select_best(MediaKind::Video),
            Err(BiliError::NoStreamAvailable(MediaKind::Video))
        ));
    }

    #[test]
    fn test_select_best_equal_ids_keep_catalog_order() {
        let catalog = Catalog {
            audio: vec![
                descriptor(MediaKind::Audio, 30232, "first"),
                descriptor(MediaKind::Audio, 30232, "second"),
            ],
            video: vec![],
        };
        assert_eq!(catalog.select_best(MediaKind::Audio).unwrap().url, "first");
    }

    #[test]
    fn test_catalog_from_dash_missing_lists() {
        let catalog = Catalog::from_dash(Dash::default());
        assert!(catalog.streams(MediaKind::Audio).is_empty());
        assert!(catalog.streams(MediaKind::Video).is_empty());
    }
}
