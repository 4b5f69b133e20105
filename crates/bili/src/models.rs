#![allow(dead_code)]

use serde::Deserialize;

/// Envelope every web API endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct VideoData {
    pub title: String,
    pub cid: u64,
    pub pubdate: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlayData {
    pub dash: Option<Dash>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Dash {
    #[serde(default)]
    pub audio: Option<Vec<DashStream>>,
    #[serde(default)]
    pub video: Option<Vec<DashStream>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashStream {
    pub id: u32,
    // The endpoint emits camelCase; the snake_case spelling shows up in
    // some mirrored responses.
    #[serde(rename = "baseUrl", alias = "base_url")]
    pub base_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_field_spellings() {
        let json = r#"{
            "dash": {
                "audio": [
                    {"id": 30280, "baseUrl": "https://cdn.example/a.m4s"},
                    {"id": 30216, "base_url": "https://cdn.example/b.m4s"}
                ]
            }
        }"#;
        let play: PlayData = serde_json::from_str(json).unwrap();
        let audio = play.dash.unwrap().audio.unwrap();
        assert_eq!(audio.len(), 2);
        assert_eq!(audio[0].base_url, "https://cdn.example/a.m4s");
        assert_eq!(audio[1].base_url, "https://cdn.example/b.m4s");
    }

    #[test]
    fn test_missing_dash_lists() {
        let play: PlayData = serde_json::from_str(r#"{"dash": {}}"#).unwrap();
        let dash = play.dash.unwrap();
        assert!(dash.audio.is_none());
        assert!(dash.video.is_none());
    }

    #[test]
    fn test_envelope_without_data() {
        let json = r#"{"code": -404, "message": "啥都木有"}"#;
        let envelope: ApiEnvelope<VideoData> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, -404);
        assert!(envelope.data.is_none());
    }
}
