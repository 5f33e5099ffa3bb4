use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use tokio::fs;

const DEFAULT_CONFIG_FILE: &str = "notice-monitor.toml";
const DEFAULT_FEED_URL: &str = "https://www.guoxinlanqiao.com/api/news/find?status=1&project=dasai&progid=20&pageno=1&pagesize=10";
const DEFAULT_NOTICE_BASE_URL: &str = "https://dasai.lanqiao.cn/notices";
const DEFAULT_DINGTALK_ENDPOINT: &str = "https://oapi.dingtalk.com/robot/send";

pub const DINGTALK_ENABLED: &str = "DINGTALK_ENABLED";
pub const DINGTALK_TOKEN: &str = "DINGTALK_TOKEN";
pub const DINGTALK_SECRET: &str = "DINGTALK_SECRET";
pub const FEISHU_ENABLED: &str = "FEISHU_ENABLED";
pub const FEISHU_WEBHOOK_URL: &str = "FEISHU_WEBHOOK_URL";
pub const FEISHU_SECRET: &str = "FEISHU_SECRET";

#[derive(serde::Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub snapshot: SnapshotConfig,
    pub dingtalk: DingTalkConfig,
    pub feishu: FeishuConfig,
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    // Detail links are rendered as "<notice_base_url>/<id>/".
    pub notice_base_url: String,
    // Applies to every outbound request, in seconds.
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            notice_base_url: DEFAULT_NOTICE_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(serde::Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: Option<PathBuf>,
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DingTalkConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub token: Option<String>,
    pub secret: Option<String>,
}

impl Default for DingTalkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_DINGTALK_ENDPOINT.to_string(),
            token: None,
            secret: None,
        }
    }
}

#[derive(serde::Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct FeishuConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub secret: Option<String>,
}

impl Config {
    /// Overlays channel switches and credentials found through `lookup`,
    /// which is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(enabled) = lookup(DINGTALK_ENABLED).as_deref().and_then(parse_bool) {
            self.dingtalk.enabled = enabled;
        }
        if let Some(token) = lookup(DINGTALK_TOKEN) {
            self.dingtalk.token = Some(token);
        }
        if let Some(secret) = lookup(DINGTALK_SECRET) {
            self.dingtalk.secret = Some(secret);
        }
        if let Some(enabled) = lookup(FEISHU_ENABLED).as_deref().and_then(parse_bool) {
            self.feishu.enabled = enabled;
        }
        if let Some(url) = lookup(FEISHU_WEBHOOK_URL) {
            self.feishu.webhook_url = Some(url);
        }
        if let Some(secret) = lookup(FEISHU_SECRET) {
            self.feishu.secret = Some(secret);
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!("ignore unrecognized boolean \"{}\"", other);
            None
        }
    }
}

/// Directory holding the running executable. State and the default config
/// live here so that a scheduler calling from any cwd sees the same files.
pub fn exe_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Loads the config file. An explicitly given path must be readable and
/// valid; the default one is optional.
pub async fn load(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        let literal = fs::read_to_string(path)
            .await
            .with_context(|| format!("read config {}", path.display()))?;
        return toml::from_str(&literal).with_context(|| format!("parse config {}", path.display()));
    }

    let default_path = exe_dir().join(DEFAULT_CONFIG_FILE);
    let literal = match fs::read_to_string(&default_path).await {
        Ok(literal) => literal,
        Err(_) => return Ok(Config::default()),
    };

    match toml::from_str(&literal) {
        Ok(config) => Ok(config),
        Err(err) => {
            warn!("ignore invalid config {}: {}", default_path.display(), err);
            Ok(Config::default())
        }
    }
}
