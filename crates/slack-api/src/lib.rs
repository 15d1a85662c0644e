//! Typed Rust client for the Slack Web API.
//!
//! Covers the methods a chat-driven bot needs: posting messages, opening
//! direct conversations, reactions, user lookup and file upload. Inbound
//! events are consumed over Socket Mode (see [`socket`]).

pub mod socket;
mod types;

pub use types::{Attachment, AttachmentField, MessageEvent, PostedMessage, Profile, User};

use serde::Serialize;
use serde::de::DeserializeOwned;
use types::{
    CompletedFile, ConnectionsOpenResponse, OpenConversationResponse, PostMessageRequest,
    ReactionRequest, UploadUrlResponse, UserInfoResponse,
};

const BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("slack api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("slack api {method} returned {status}: {body}")]
    Http {
        method: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("slack api {method} failed: {error}")]
    Api { method: &'static str, error: String },

    #[error("slack payload could not be decoded: {0}")]
    Json(#[from] serde_json::Error),

    #[error("slack socket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("slack socket closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the Slack Web API.
///
/// `bot_token` (xoxb-) authorizes Web API calls; `app_token` (xapp-) is only
/// used to open Socket Mode connections.
#[derive(Clone)]
pub struct SlackClient {
    bot_token: String,
    app_token: String,
    http: reqwest::Client,
}

impl SlackClient {
    pub fn new(bot_token: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            app_token: app_token.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(method: &str) -> String {
        format!("{BASE_URL}/{method}")
    }

    fn auth(token: &str) -> String {
        format!("Bearer {token}")
    }

    /// Slack answers 200 for most failures and reports them in the `ok` flag.
    async fn parse<T: DeserializeOwned>(
        resp: reqwest::Response,
        method: &'static str,
    ) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http { method, status, body });
        }

        let value: serde_json::Value = resp.json().await?;
        if value.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
            let error = value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            return Err(Error::Api { method, error });
        }

        serde_json::from_value(value).map_err(Error::from)
    }

    async fn post_json<B, T>(&self, method: &'static str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(Self::url(method))
            .header("Authorization", Self::auth(&self.bot_token))
            .json(body)
            .send()
            .await?;

        Self::parse(resp, method).await
    }

    // ── Messages ────────────────────────────────────────────────────

    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<PostedMessage> {
        self.post_json(
            "chat.postMessage",
            &PostMessageRequest {
                channel,
                text,
                as_user: true,
                attachments,
            },
        )
        .await
    }

    /// Open (or reuse) the direct-message conversation with a user.
    pub async fn open_conversation(&self, user: &str) -> Result<String> {
        let resp: OpenConversationResponse = self
            .post_json("conversations.open", &serde_json::json!({ "users": user }))
            .await?;
        Ok(resp.channel.id)
    }

    pub async fn user_info(&self, user: &str) -> Result<User> {
        let resp = self
            .http
            .get(Self::url("users.info"))
            .header("Authorization", Self::auth(&self.bot_token))
            .query(&[("user", user)])
            .send()
            .await?;

        let info: UserInfoResponse = Self::parse(resp, "users.info").await?;
        Ok(info.user)
    }

    // ── Reactions ───────────────────────────────────────────────────

    pub async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post_json(
                "reactions.add",
                &ReactionRequest { channel, timestamp: ts, name },
            )
            .await?;
        Ok(())
    }

    pub async fn remove_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post_json(
                "reactions.remove",
                &ReactionRequest { channel, timestamp: ts, name },
            )
            .await?;
        Ok(())
    }

    // ── Files ───────────────────────────────────────────────────────

    /// Upload `content` as `filename` and share it into `channel`.
    ///
    /// Uses the external upload flow: reserve an upload URL, push the bytes,
    /// then complete the upload against the target channel.
    pub async fn upload_file(&self, channel: &str, filename: &str, content: &[u8]) -> Result<()> {
        let length = content.len().to_string();
        let resp = self
            .http
            .get(Self::url("files.getUploadURLExternal"))
            .header("Authorization", Self::auth(&self.bot_token))
            .query(&[("filename", filename), ("length", length.as_str())])
            .send()
            .await?;
        let reserved: UploadUrlResponse = Self::parse(resp, "files.getUploadURLExternal").await?;

        let resp = self
            .http
            .post(&reserved.upload_url)
            .body(content.to_vec())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                method: "file upload",
                status,
                body,
            });
        }

        let files = serde_json::to_string(&[CompletedFile {
            id: &reserved.file_id,
            title: filename,
        }])?;
        let resp = self
            .http
            .post(Self::url("files.completeUploadExternal"))
            .header("Authorization", Self::auth(&self.bot_token))
            .form(&[("files", files.as_str()), ("channel_id", channel)])
            .send()
            .await?;
        let _: serde_json::Value = Self::parse(resp, "files.completeUploadExternal").await?;
        Ok(())
    }

    // ── Socket Mode ─────────────────────────────────────────────────

    /// Request a fresh Socket Mode WebSocket URL.
    pub async fn open_connection(&self) -> Result<String> {
        let resp = self
            .http
            .post(Self::url("apps.connections.open"))
            .header("Authorization", Self::auth(&self.app_token))
            .send()
            .await?;

        let opened: ConnectionsOpenResponse = Self::parse(resp, "apps.connections.open").await?;
        Ok(opened.url)
    }
}
