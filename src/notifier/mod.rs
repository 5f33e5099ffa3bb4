use chrono::Local;
use log::{info, warn};
use reqwest::Client;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::FeedEntry;

pub mod dingtalk;
pub mod feishu;
pub mod sign;

pub use dingtalk::DingTalk;
pub use feishu::Feishu;

/// Provider-neutral content of one message. Each channel renders it into
/// its own payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Short title shown in the chat list.
    pub title: String,
    pub heading: String,
    pub subject: Option<String>,
    pub fields: Vec<(&'static str, String)>,
    pub link_text: &'static str,
    pub link_url: String,
}

impl Notice {
    pub fn for_entry(entry: &FeedEntry, notice_base_url: &str) -> Self {
        Self {
            title: "蓝桥杯通知更新".to_string(),
            heading: "蓝桥杯大赛通知更新".to_string(),
            subject: Some(entry.title.clone()),
            fields: vec![
                ("发布时间", entry.publish_date().to_string()),
                ("内容摘要", entry.synopsis_or_placeholder().to_string()),
            ],
            link_text: "查看详情",
            link_url: entry.detail_url(notice_base_url),
        }
    }

    pub fn for_test(feed_url: &str) -> Self {
        Self {
            title: "蓝桥杯监控测试".to_string(),
            heading: "蓝桥杯监控系统测试".to_string(),
            subject: None,
            fields: vec![
                ("测试时间", Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                (
                    "测试内容",
                    "这是一条测试消息，用于验证通知渠道是否正常工作。".to_string(),
                ),
            ],
            link_text: "查看监控页面",
            link_url: feed_url.to_string(),
        }
    }
}

pub enum Channel {
    DingTalk(DingTalk),
    Feishu(Feishu),
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::DingTalk(_) => dingtalk::NAME,
            Channel::Feishu(_) => feishu::NAME,
        }
    }

    pub async fn send(&self, notice: &Notice) -> Result<()> {
        match self {
            Channel::DingTalk(c) => c.send(notice).await,
            Channel::Feishu(c) => c.send(notice).await,
        }
    }
}

/// Trimmed credential, or a config error naming what is missing.
fn required(channel: &'static str, value: Option<&str>, field: &'static str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Error::ChannelConfig {
            channel,
            missing: field,
        }),
    }
}

enum Slot {
    Disabled(&'static str),
    Misconfigured(&'static str, Error),
    Ready(Channel),
}

impl Slot {
    fn new(name: &'static str, enabled: bool, build: impl FnOnce() -> Result<Channel>) -> Self {
        if !enabled {
            return Slot::Disabled(name);
        }
        match build() {
            Ok(channel) => Slot::Ready(channel),
            Err(err) => Slot::Misconfigured(name, err),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Slot::Disabled(name) | Slot::Misconfigured(name, _) => *name,
            Slot::Ready(channel) => channel.name(),
        }
    }
}

#[derive(Debug)]
pub struct Delivery {
    pub entry_id: String,
    pub result: Result<()>,
}

/// What one channel did with a batch.
#[derive(Debug)]
pub enum Report {
    /// The channel is switched off.
    Skipped,
    /// Switched on but lacking credentials; nothing was sent.
    ConfigError(String),
    Delivered(Vec<Delivery>),
}

impl Report {
    pub fn sent(&self) -> usize {
        match self {
            Report::Delivered(deliveries) => deliveries.iter().filter(|d| d.result.is_ok()).count(),
            _ => 0,
        }
    }

    pub fn failed(&self) -> usize {
        match self {
            Report::Delivered(deliveries) => deliveries.iter().filter(|d| d.result.is_err()).count(),
            _ => 0,
        }
    }
}

/// Fans every batch out to all configured channels, one request at a time.
pub struct Dispatcher {
    slots: Vec<Slot>,
    notice_base_url: String,
}

impl Dispatcher {
    pub fn from_config(client: &Client, config: &Config) -> Self {
        let slots = vec![
            Slot::new(dingtalk::NAME, config.dingtalk.enabled, || {
                DingTalk::from_config(client.clone(), &config.dingtalk).map(Channel::DingTalk)
            }),
            Slot::new(feishu::NAME, config.feishu.enabled, || {
                Feishu::from_config(client.clone(), &config.feishu).map(Channel::Feishu)
            }),
        ];

        Self {
            slots,
            notice_base_url: config.feed.notice_base_url.clone(),
        }
    }

    /// Sends each entry to each channel. A failed delivery is recorded and
    /// the loop moves on.
    pub async fn notify(&self, entries: &[FeedEntry]) -> Vec<(&'static str, Report)> {
        let notices: Vec<(&str, Notice)> = entries
            .iter()
            .map(|e| (e.id.as_str(), Notice::for_entry(e, &self.notice_base_url)))
            .collect();
        self.dispatch(&notices).await
    }

    pub async fn send_test(&self, feed_url: &str) -> Vec<(&'static str, Report)> {
        self.dispatch(&[("test", Notice::for_test(feed_url))]).await
    }

    async fn dispatch(&self, notices: &[(&str, Notice)]) -> Vec<(&'static str, Report)> {
        let mut reports = Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            let name = slot.name();
            let report = match slot {
                Slot::Disabled(_) => Report::Skipped,
                Slot::Misconfigured(_, err) => {
                    warn!("skip {}: {}", name, err);
                    Report::ConfigError(err.to_string())
                }
                Slot::Ready(channel) => {
                    let mut deliveries = Vec::with_capacity(notices.len());
                    for (entry_id, notice) in notices {
                        let result = channel.send(notice).await;
                        match &result {
                            Ok(()) => info!(
                                "{}: notice {} \"{}\" sent",
                                name,
                                entry_id,
                                notice.subject.as_deref().unwrap_or(&notice.title)
                            ),
                            Err(err) => warn!("{}: notice {} not sent: {}", name, entry_id, err),
                        }
                        deliveries.push(Delivery {
                            entry_id: entry_id.to_string(),
                            result,
                        });
                    }
                    Report::Delivered(deliveries)
                }
            };
            reports.push((name, report));
        }

        reports
    }
}
