use md5::Digest;
use reqwest::{
    Client,
    header::{REFERER, USER_AGENT},
};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::client::{BASE_URL, DEFAULT_UA, NAV_URL};
use crate::error::BiliError;

// Protocol constant. The table is imposed by the platform; any deviation
// invalidates every signature derived from it.
const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

/// The two rotating key fragments the nav endpoint hands out.
///
/// Fetched once per run and passed around by value; the server rotates the
/// fragments periodically, which a single batch run does not need to track.
#[derive(Clone, Debug)]
pub struct WbiKeys {
    img_key: String,
    sub_key: String,
}

#[derive(Deserialize)]
struct WbiImg {
    img_url: String,
    sub_url: String,
}

#[derive(Deserialize)]
struct NavData {
    wbi_img: WbiImg,
}

#[derive(Deserialize)]
struct ResWbi {
    data: NavData,
}

impl WbiKeys {
    pub fn new(img_key: impl Into<String>, sub_key: impl Into<String>) -> Self {
        Self {
            img_key: img_key.into(),
            sub_key: sub_key.into(),
        }
    }

    /// Fetch the current key fragments from the nav endpoint.
    pub async fn fetch(client: &Client) -> Result<Self, BiliError> {
        let ResWbi {
            data: NavData { wbi_img },
        } = client
            .get(NAV_URL)
            .header(USER_AGENT, DEFAULT_UA)
            .header(REFERER, BASE_URL)
            .send()
            .await?
            .json::<ResWbi>()
            .await?;

        let img_key = take_filename(&wbi_img.img_url)
            .ok_or_else(|| BiliError::Other(format!("malformed wbi img_url: {}", wbi_img.img_url)))?;
        let sub_key = take_filename(&wbi_img.sub_url)
            .ok_or_else(|| BiliError::Other(format!("malformed wbi sub_url: {}", wbi_img.sub_url)))?;

        Ok(Self::new(img_key, sub_key))
    }

    // 32-character mixin key derived from the concatenated fragments.
    fn mixin_key(&self) -> String {
        let orig = format!("{}{}", self.img_key, self.sub_key);
        get_mixin_key(orig.as_bytes())
    }
}

fn get_mixin_key(orig: &[u8]) -> String {
    MIXIN_KEY_ENC_TAB
        .iter()
        .take(32)
        .map(|&i| orig[i] as char)
        .collect::<String>()
}

fn get_url_encoded(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            // Unreserved characters that do not need to be encoded.
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => {
                encoded.push(c);
            }
            // Characters the platform filters out entirely.
            '!' | '\'' | '(' | ')' | '*' => {}
            // All other characters are percent-encoded.
            _ => {
                let mut buf = [0; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("%{b:02X}"));
                }
            }
        }
    }
    encoded
}

/// Sign `params` with the current Unix timestamp, returning the final query
/// string including `wts` and `w_rid`.
pub fn signed_query(params: Vec<(&str, String)>, keys: &WbiKeys) -> Result<String, BiliError> {
    let wts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| BiliError::Other("SystemTime before UNIX EPOCH!".to_string()))?
        .as_secs();
    Ok(signed_query_at(params, keys, wts))
}

fn signed_query_at(mut params: Vec<(&str, String)>, keys: &WbiKeys, timestamp: u64) -> String {
    let mixin_key = keys.mixin_key();
    params.push(("wts", timestamp.to_string()));
    params.sort_by(|a, b| a.0.cmp(b.0));
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", get_url_encoded(k), get_url_encoded(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = md5::Md5::new();
    hasher.update(query.clone() + &mixin_key);
    let digest = hasher.finalize();
    format!("{query}&w_rid={digest:x}")
}

fn take_filename(url: &str) -> Option<String> {
    url.rsplit_once('/')
        .and_then(|(_, s)| s.rsplit_once('.'))
        .map(|(s, _)| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> WbiKeys {
        WbiKeys::new(
            "7cd084941338484aae1ad9425b84077c",
            "4932caff0ff746eab6f01bf08b70ac45",
        )
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_wbi_keys() {
        let keys = WbiKeys::fetch(&crate::client::default_client()).await;
        assert!(keys.is_ok());
        println!("{keys:?}");
    }

    #[test]
    fn test_take_filename() {
        assert_eq!(
            take_filename("https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png"),
            Some("7cd084941338484aae1ad9425b84077c".to_string())
        );
        assert_eq!(take_filename("no-separators"), None);
    }

    #[test]
    fn test_mixin_key() {
        assert_eq!(
            test_keys().mixin_key(),
            "ea1db124af3c7062474693fa704f4ff8"
        );
    }

    #[test]
    fn test_signed_query_golden() {
        let params = vec![
            ("foo", String::from("114")),
            ("bar", String::from("514")),
            ("zab", String::from("1919810")),
        ];
        assert_eq!(
            signed_query_at(params, &test_keys(), 1702204169),
            "bar=514&foo=114&wts=1702204169&zab=1919810&w_rid=8f6f2b5b3d485fe1886cec6a0be8c5d4"
                .to_string()
        )
    }

    #[test]
    fn test_signed_query_order_independent() {
        let keys = test_keys();
        let a = vec![
            ("foo", String::from("114")),
            ("bar", String::from("514")),
            ("zab", String::from("1919810")),
        ];
        let b = vec![
            ("zab", String::from("1919810")),
            ("foo", String::from("114")),
            ("bar", String::from("514")),
        ];
        assert_eq!(
            signed_query_at(a, &keys, 1702204169),
            signed_query_at(b, &keys, 1702204169)
        );
    }

    #[test]
    fn test_signed_query_value_sensitivity() {
        let keys = test_keys();
        let digest_of = |v: &str| {
            let signed = signed_query_at(vec![("foo", v.to_string())], &keys, 1702204169);
            signed.rsplit_once("w_rid=").map(|(_, d)| d.to_string())
        };
        assert_ne!(digest_of("114"), digest_of("115"));
    }
}
