//! Conversation with the rendering assistant.

use crate::error::{AtomError, Result};
use crate::service::{CHAT_OPERATION, GenerationService};
use crate::types::{Attachment, Message, MessageId, Role};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_TITLE: &str = "New chat";
const TITLE_MAX_CHARS: usize = 40;
const APOLOGY: &str = "ขออภัย เกิดข้อผิดพลาดในการประมวลผล กรุณาลองใหม่อีกครั้ง";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: MessageId,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::from_timestamp(now, 0),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            updated_at: now,
        }
    }

    /// Send `input` and stream the reply into a single assistant message.
    ///
    /// `on_update` receives the accumulated reply after every delta. Empty
    /// input without attachments is ignored. On failure the partial reply is
    /// replaced by a system apology and the error is returned.
    pub async fn send<F>(
        &mut self,
        service: &dyn GenerationService,
        input: &str,
        attachments: Vec<Attachment>,
        now: DateTime<Utc>,
        mut on_update: F,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        if input.trim().is_empty() && attachments.is_empty() {
            return Ok(());
        }

        let mut user_message = Message::new(MessageId::from_timestamp(now, 0), Role::User, input, now);
        user_message.attachments = attachments;
        self.messages.push(user_message);
        self.retitle(input);
        self.touch(now);

        match self.stream_reply(service, now, &mut on_update).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "chat reply failed");
                if self.messages.last().is_some_and(|m| m.role == Role::Assistant) {
                    self.messages.pop();
                }
                self.messages.push(Message::new(
                    MessageId::from_timestamp(now, 2),
                    Role::System,
                    APOLOGY,
                    now,
                ));
                self.touch(now);
                Err(match e {
                    AtomError::RemoteGeneration { .. } => e,
                    other => AtomError::remote(CHAT_OPERATION, other.to_string()),
                })
            }
        }
    }

    async fn stream_reply<F>(
        &mut self,
        service: &dyn GenerationService,
        now: DateTime<Utc>,
        on_update: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        let mut stream = service.chat_stream(&self.messages).await?;
        self.messages.push(Message::new(
            MessageId::from_timestamp(now, 1),
            Role::Assistant,
            "",
            now,
        ));

        while let Some(delta) = stream.next().await {
            let delta = delta?;
            if let Some(reply) = self.messages.last_mut() {
                reply.content.push_str(&delta);
                on_update(&reply.content);
            }
        }
        Ok(())
    }

    fn retitle(&mut self, input: &str) {
        if self.title != DEFAULT_TITLE {
            return;
        }
        let input = input.trim();
        if input.is_empty() {
            return;
        }
        self.title = input.chars().take(TITLE_MAX_CHARS).collect();
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn last_reply(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }
}
