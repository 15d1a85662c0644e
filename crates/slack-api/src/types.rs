use serde::{Deserialize, Serialize};

// ── Messages ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
    pub as_user: bool,
    #[serde(skip_serializing_if = "no_attachments")]
    pub attachments: &'a [Attachment],
}

fn no_attachments(attachments: &&[Attachment]) -> bool {
    attachments.is_empty()
}

/// Reference to a posted message: the channel it landed in and its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    #[serde(default)]
    pub short: bool,
}

// ── Reactions ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ReactionRequest<'a> {
    pub channel: &'a str,
    pub timestamp: &'a str,
    pub name: &'a str,
}

// ── Conversations / users ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OpenConversationResponse {
    pub channel: ChannelRef,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserInfoResponse {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
}

// ── Files ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadUrlResponse {
    pub upload_url: String,
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CompletedFile<'a> {
    pub id: &'a str,
    pub title: &'a str,
}

// ── Socket Mode ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConnectionsOpenResponse {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub payload: Option<EventsApiPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EventsApiPayload {
    #[serde(default)]
    pub event: Option<RawEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A plain user-authored message delivered over Socket Mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub user: String,
    pub channel: String,
    pub text: String,
}

impl RawEvent {
    /// Keep only user-authored messages; edits, joins and bot echoes are dropped.
    pub(crate) fn into_message(self) -> Option<MessageEvent> {
        if self.kind != "message" || self.subtype.is_some() || self.bot_id.is_some() {
            return None;
        }
        Some(MessageEvent {
            user: self.user?,
            channel: self.channel?,
            text: self.text?,
        })
    }
}
