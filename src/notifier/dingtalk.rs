use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{required, sign, Notice};
use crate::config::DingTalkConfig;
use crate::error::{Error, Result};

pub const NAME: &str = "dingtalk";

pub struct DingTalk {
    client: Client,
    endpoint: String,
    access_token: String,
    secret: String,
}

#[derive(Deserialize, Debug)]
struct SendResponse {
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: String,
}

impl DingTalk {
    pub fn from_config(client: Client, config: &DingTalkConfig) -> Result<Self> {
        let access_token = required(NAME, config.token.as_deref(), "token")?;
        let secret = required(NAME, config.secret.as_deref(), "secret")?;
        Ok(DingTalk {
            client,
            endpoint: config.endpoint.clone(),
            access_token,
            secret,
        })
    }

    /// Robot URL with token, timestamp and the encoded signature attached.
    fn signed_url(&self, timestamp_ms: i64) -> Result<String> {
        let timestamp = timestamp_ms.to_string();
        let sign = sign::dingtalk(&self.secret, timestamp_ms);
        let params = [
            ("access_token", self.access_token.as_str()),
            ("timestamp", timestamp.as_str()),
            ("sign", sign.as_str()),
        ];
        let query = serde_urlencoded::to_string(params).map_err(failure)?;
        Ok(format!("{}?{}", self.endpoint, query))
    }

    pub async fn send(&self, notice: &Notice) -> Result<()> {
        let url = self.signed_url(Utc::now().timestamp_millis())?;
        let res = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&render(notice))
            .send()
            .await
            .map_err(failure)?;

        let status = res.status();
        let body: SendResponse = res
            .json()
            .await
            .map_err(|err| failure(format!("status {}: {}", status, err)))?;
        match body.errcode {
            Some(0) => Ok(()),
            Some(code) => Err(failure(format!("errcode {}: {}", code, body.errmsg))),
            None => Err(failure(format!("status {}: no errcode in response", status))),
        }
    }
}

fn render(notice: &Notice) -> Value {
    let mut text = format!("## {}\n\n", notice.heading);
    if let Some(subject) = &notice.subject {
        text.push_str(&format!("### {}\n\n", subject));
    }
    for (label, value) in &notice.fields {
        text.push_str(&format!("**{}**: {}\n\n", label, value));
    }
    text.push_str(&format!("[{}]({})", notice.link_text, notice.link_url));

    json!({
        "msgtype": "markdown",
        "markdown": {
            "title": notice.title,
            "text": text,
        },
    })
}

fn failure(err: impl ToString) -> Error {
    Error::Delivery {
        channel: NAME,
        reason: err.to_string(),
    }
}
