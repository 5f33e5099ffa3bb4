use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

mod http;
pub use http::HttpFeedSource;

pub const SYNOPSIS_PLACEHOLDER: &str = "无摘要";

/// One fetch of the feed. Fields other than `datalist` are kept as-is so the
/// stored snapshot mirrors the document the source returned.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub datalist: Vec<FeedEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedSnapshot {
    #[cfg(test)]
    pub fn new(datalist: Vec<FeedEntry>) -> Self {
        Self {
            datalist,
            extra: Map::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeedEntry {
    #[serde(rename = "nnid", deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(rename = "publishTime", default)]
    pub publish_time: String,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedEntry {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, title: impl Into<String>, publish_time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            publish_time: publish_time.into(),
            synopsis: None,
            extra: Map::new(),
        }
    }

    #[cfg(test)]
    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    /// "2024-03-01T10:00:00" -> "2024-03-01"
    pub fn publish_date(&self) -> &str {
        self.publish_time
            .split('T')
            .next()
            .unwrap_or(&self.publish_time)
    }

    pub fn synopsis_or_placeholder(&self) -> &str {
        self.synopsis.as_deref().unwrap_or(SYNOPSIS_PLACEHOLDER)
    }

    pub fn detail_url(&self, notice_base_url: &str) -> String {
        format!("{}/{}/", notice_base_url.trim_end_matches('/'), self.id)
    }
}

// The API has served `nnid` both as a number and as a string.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "nnid must be a string or a number, got {}",
            other
        ))),
    }
}

#[async_trait]
pub trait FeedSource {
    async fn fetch(&self) -> Result<FeedSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_document() {
        let body = r#"{
            "code": 200,
            "datalist": [
                {"nnid": 101, "title": "报名通知", "publishTime": "2024-11-05T09:30:00", "synopsis": "开始报名", "hits": 12},
                {"nnid": "102", "title": "赛程安排", "publishTime": "2024-11-06T10:00:00", "synopsis": null}
            ]
        }"#;
        let snapshot: FeedSnapshot = serde_json::from_str(body).unwrap();

        assert_eq!(snapshot.datalist.len(), 2);
        assert_eq!(snapshot.extra.get("code"), Some(&Value::from(200)));

        let first = &snapshot.datalist[0];
        assert_eq!(first.id, "101");
        assert_eq!(first.publish_date(), "2024-11-05");
        assert_eq!(first.synopsis_or_placeholder(), "开始报名");
        assert_eq!(first.extra.get("hits"), Some(&Value::from(12)));

        let second = &snapshot.datalist[1];
        assert_eq!(second.id, "102");
        assert_eq!(second.synopsis_or_placeholder(), SYNOPSIS_PLACEHOLDER);
    }

    #[test]
    fn missing_datalist_is_empty() {
        let snapshot: FeedSnapshot = serde_json::from_str(r#"{"msg":"ok"}"#).unwrap();
        assert!(snapshot.datalist.is_empty());
    }

    #[test]
    fn rejects_entry_without_id() {
        let body = r#"{"datalist": [{"nnid": null, "title": "x"}]}"#;
        assert!(serde_json::from_str::<FeedSnapshot>(body).is_err());
    }

    #[test]
    fn publish_date_without_time_part() {
        let entry = FeedEntry::new("1", "A", "2024-11-05");
        assert_eq!(entry.publish_date(), "2024-11-05");
    }

    #[test]
    fn detail_url_has_trailing_slash() {
        let entry = FeedEntry::new("42", "A", "");
        assert_eq!(
            entry.detail_url("https://dasai.lanqiao.cn/notices/"),
            "https://dasai.lanqiao.cn/notices/42/"
        );
    }
}
