use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{required, sign, Notice};
use crate::config::FeishuConfig;
use crate::error::{Error, Result};

pub const NAME: &str = "feishu";

pub struct Feishu {
    client: Client,
    webhook_url: String,
    secret: String,
}

#[derive(Deserialize, Debug)]
struct SendResponse {
    error: Option<Value>,
    code: Option<i64>,
    #[serde(default)]
    msg: String,
}

impl Feishu {
    pub fn from_config(client: Client, config: &FeishuConfig) -> Result<Self> {
        let webhook_url = required(NAME, config.webhook_url.as_deref(), "webhook_url")?;
        let secret = required(NAME, config.secret.as_deref(), "secret")?;
        Ok(Feishu {
            client,
            webhook_url,
            secret,
        })
    }

    pub async fn send(&self, notice: &Notice) -> Result<()> {
        let body = render(notice, &self.secret, Utc::now().timestamp());
        let res = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(failure)?;

        let status = res.status();
        let body: SendResponse = res
            .json()
            .await
            .map_err(|err| failure(format!("status {}: {}", status, err)))?;
        if let Some(error) = body.error {
            return Err(failure(error));
        }
        match body.code {
            None | Some(0) => Ok(()),
            Some(code) => Err(failure(format!("code {}: {}", code, body.msg))),
        }
    }
}

/// Signed "post" (rich text) message. Each inner array of `content` is one
/// line.
fn render(notice: &Notice, secret: &str, timestamp_s: i64) -> Value {
    let mut lines = Vec::new();
    if notice.subject.is_some() {
        lines.push(json!([{"tag": "text", "text": notice.heading}]));
    }
    for (label, value) in &notice.fields {
        lines.push(json!([{"tag": "text", "text": format!("{}: {}", label, value)}]));
    }
    lines.push(json!([{"tag": "a", "text": notice.link_text, "href": notice.link_url}]));

    json!({
        "timestamp": timestamp_s.to_string(),
        "sign": sign::feishu(secret, timestamp_s),
        "msg_type": "post",
        "content": {
            "post": {
                "zh_cn": {
                    "title": notice.subject.as_deref().unwrap_or(&notice.heading),
                    "content": lines,
                },
            },
        },
    })
}

fn failure(err: impl ToString) -> Error {
    Error::Delivery {
        channel: NAME,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedEntry;
    use crate::testing::{closed_url, reply, MockServer};

    fn config(webhook_url: String) -> FeishuConfig {
        FeishuConfig {
            enabled: true,
            webhook_url: Some(webhook_url),
            secret: Some("SECtestsecret".to_string()),
        }
    }

    fn notice() -> Notice {
        Notice::for_entry(
            &FeedEntry::new("2", "B", "2024-11-06T10:00:00").with_synopsis("赛程调整"),
            "https://dasai.lanqiao.cn/notices",
        )
    }

    #[test]
    fn renders_signed_post() {
        let body = render(&notice(), "SECtestsecret", 1_700_000_000);
        assert_eq!(
            body,
            json!({
                "timestamp": "1700000000",
                "sign": "qctwDqaazOo8xxU2d5mAVhFAk6TEeaDHQUh0YMWFIL8=",
                "msg_type": "post",
                "content": {"post": {"zh_cn": {
                    "title": "B",
                    "content": [
                        [{"tag": "text", "text": "蓝桥杯大赛通知更新"}],
                        [{"tag": "text", "text": "发布时间: 2024-11-06"}],
                        [{"tag": "text", "text": "内容摘要: 赛程调整"}],
                        [{"tag": "a", "text": "查看详情", "href": "https://dasai.lanqiao.cn/notices/2/"}],
                    ],
                }}},
            })
        );
    }

    #[test]
    fn missing_webhook_url() {
        let mut cfg = config(String::new());
        cfg.webhook_url = None;
        assert!(matches!(
            Feishu::from_config(Client::new(), &cfg),
            Err(Error::ChannelConfig { missing: "webhook_url", .. })
        ));
    }

    #[tokio::test]
    async fn posts_to_webhook() {
        let server = MockServer::start(vec![("/hook", reply(json!({"code": 0, "msg": "success"})))]).await;
        let feishu = Feishu::from_config(Client::new(), &config(server.url("/hook"))).unwrap();

        feishu.send(&notice()).await.unwrap();

        let requests = server.requests("/hook");
        assert_eq!(requests.len(), 1);
        let body = &requests[0].body;
        let timestamp: i64 = body["timestamp"].as_str().unwrap().parse().unwrap();
        assert_eq!(body["sign"], sign::feishu("SECtestsecret", timestamp));
        assert_eq!(body["content"]["post"]["zh_cn"]["title"], "B");
    }

    #[tokio::test]
    async fn error_field_is_failure() {
        let server = MockServer::start(vec![("/hook", reply(json!({"error": "invalid sign"})))]).await;
        let feishu = Feishu::from_config(Client::new(), &config(server.url("/hook"))).unwrap();

        let err = feishu.send(&notice()).await.unwrap_err();
        assert!(err.to_string().contains("invalid sign"));
    }

    #[tokio::test]
    async fn non_zero_code_is_failure() {
        let server = MockServer::start(vec![("/hook", reply(json!({"code": 19021, "msg": "sign match fail"})))]).await;
        let feishu = Feishu::from_config(Client::new(), &config(server.url("/hook"))).unwrap();

        assert!(matches!(feishu.send(&notice()).await, Err(Error::Delivery { .. })));
    }

    #[tokio::test]
    async fn transport_error_is_failure() {
        let feishu = Feishu::from_config(Client::new(), &config(closed_url().await)).unwrap();
        assert!(matches!(
            feishu.send(&notice()).await,
            Err(Error::Delivery { channel: NAME, .. })
        ));
    }
}
