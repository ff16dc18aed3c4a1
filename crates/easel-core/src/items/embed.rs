//! Embedded external page data and its preview state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Result of checking whether the embedded page may be framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FramePolicy {
    #[default]
    Unknown,
    Checking,
    Allowed,
    Blocked,
}

/// Progress of an asynchronous preview (snapshot or live session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreviewStatus {
    #[default]
    Idle,
    Pending,
    Ready,
    Failed,
}

/// Preferred way of presenting an embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedDisplay {
    #[default]
    Auto,
    Frame,
    Snapshot,
    Live,
}

/// Asynchronous preview bundle filled in by the preview collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedPreview {
    pub frame_policy: FramePolicy,
    pub snapshot_status: PreviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_url: Option<String>,
    pub live_status: PreviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
}

/// Data carried by an embed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedData {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub display: EmbedDisplay,
    /// Space separated iframe sandbox tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<String>,
    #[serde(default)]
    pub preview: EmbedPreview,
    /// Origin adopted from the first accepted state message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_state_version: Option<u32>,
}

impl EmbedData {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            display: EmbedDisplay::default(),
            sandbox: None,
            allow: None,
            preview: EmbedPreview::default(),
            embed_origin: None,
            embed_state: None,
            embed_state_version: None,
        }
    }

    /// Origin of the embedded URL (`scheme://host[:port]`), if it has one.
    pub fn url_origin(&self) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        let origin = url.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Whether a message from `origin` may update this embed.
    pub fn accepts_origin(&self, origin: &str) -> bool {
        match &self.embed_origin {
            Some(recorded) => recorded == origin,
            None => true,
        }
    }
}
