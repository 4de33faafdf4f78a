use async_trait::async_trait;
use thiserror::Error;

use crate::{
    commands::{CommandScope, CommandSpec, RegisteredCommand},
    interaction::{ChannelId, InteractionRef, MessageId, ThreadId},
    message::OutgoingMessage,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("discord request failed: {0}")]
    Request(String),
    #[error("discord application id is not known yet; the session must be ready first")]
    NotReady,
}

impl From<serenity::Error> for PlatformError {
    fn from(error: serenity::Error) -> Self {
        Self::Request(error.to_string())
    }
}

/// Auto-archive windows Discord accepts for threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoArchive {
    OneHour,
    OneDay,
    ThreeDays,
    OneWeek,
}

impl AutoArchive {
    pub fn minutes(self) -> u16 {
        match self {
            Self::OneHour => 60,
            Self::OneDay => 1_440,
            Self::ThreeDays => 4_320,
            Self::OneWeek => 10_080,
        }
    }
}

/// REST surface of the chat platform used by this bot.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn create_command(
        &self,
        spec: &CommandSpec,
        scope: CommandScope,
    ) -> Result<RegisteredCommand, PlatformError>;

    async fn delete_command(&self, command: &RegisteredCommand) -> Result<(), PlatformError>;

    async fn respond_to_interaction(
        &self,
        interaction: &InteractionRef,
        content: &str,
    ) -> Result<(), PlatformError>;

    async fn send_channel_message(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, PlatformError>;

    async fn start_thread_from_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        name: &str,
        auto_archive: AutoArchive,
    ) -> Result<ThreadId, PlatformError>;
}
