use async_trait::async_trait;
use slack_api::{Attachment, SlackClient};

pub type ChatResult<T> = Result<T, slack_api::Error>;

/// A posted message, addressable for reactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel: String,
    pub ts: String,
}

/// An inbound user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub user: String,
    pub channel: String,
    pub text: String,
}

impl From<slack_api::MessageEvent> for IncomingMessage {
    fn from(event: slack_api::MessageEvent) -> Self {
        Self {
            user: event.user,
            channel: event.channel,
            text: event.text,
        }
    }
}

/// Outbound chat primitives used by the command handlers.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    async fn open_direct_channel(&self, user_id: &str) -> ChatResult<String>;

    async fn post_to_channel(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> ChatResult<MessageRef>;

    async fn upload_file(&self, channel: &str, filename: &str, content: &[u8]) -> ChatResult<()>;

    async fn add_reaction(&self, message: &MessageRef, name: &str) -> ChatResult<()>;

    async fn remove_reaction(&self, message: &MessageRef, name: &str) -> ChatResult<()>;

    /// Display name of a user.
    async fn user_name(&self, user_id: &str) -> ChatResult<String>;

    async fn send_direct_message(
        &self,
        user_id: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> ChatResult<MessageRef> {
        let channel = self.open_direct_channel(user_id).await?;
        self.post_to_channel(&channel, text, attachments).await
    }

    /// Plain direct message.
    async fn im(&self, user_id: &str, text: &str) -> ChatResult<MessageRef> {
        self.send_direct_message(user_id, text, &[]).await
    }
}

pub struct SlackTransport {
    client: SlackClient,
}

impl SlackTransport {
    pub fn new(client: SlackClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for SlackTransport {
    async fn open_direct_channel(&self, user_id: &str) -> ChatResult<String> {
        self.client.open_conversation(user_id).await
    }

    async fn post_to_channel(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> ChatResult<MessageRef> {
        let posted = self.client.post_message(channel, text, attachments).await?;
        Ok(MessageRef {
            channel: posted.channel,
            ts: posted.ts,
        })
    }

    async fn upload_file(&self, channel: &str, filename: &str, content: &[u8]) -> ChatResult<()> {
        self.client.upload_file(channel, filename, content).await
    }

    async fn add_reaction(&self, message: &MessageRef, name: &str) -> ChatResult<()> {
        self.client
            .add_reaction(&message.channel, &message.ts, name)
            .await
    }

    async fn remove_reaction(&self, message: &MessageRef, name: &str) -> ChatResult<()> {
        self.client
            .remove_reaction(&message.channel, &message.ts, name)
            .await
    }

    async fn user_name(&self, user_id: &str) -> ChatResult<String> {
        let user = self.client.user_info(user_id).await?;
        Ok(user.profile.first_name.unwrap_or(user.name))
    }
}
