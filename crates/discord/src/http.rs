use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, CreateThread,
};
use serenity::http::Http;
use serenity::model::application::{Command, CommandOptionType};
use serenity::model::channel::AutoArchiveDuration;
use serenity::model::id as discord;

use crate::{
    commands::{CommandOptionKind, CommandScope, CommandSpec, RegisteredCommand},
    interaction::{ChannelId, CommandId, InteractionRef, MessageId, ThreadId},
    message::OutgoingMessage,
    platform::{AutoArchive, ChatPlatform, PlatformError},
};

/// [`ChatPlatform`] backed by serenity's rate-limited REST client.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn ensure_application_id(&self) -> Result<(), PlatformError> {
        self.http.application_id().map(|_| ()).ok_or(PlatformError::NotReady)
    }
}

fn command_builder(spec: &CommandSpec) -> CreateCommand {
    spec.options.iter().fold(
        CreateCommand::new(&spec.name).description(&spec.description),
        |command, option| {
            let kind = match option.kind {
                CommandOptionKind::String => CommandOptionType::String,
                CommandOptionKind::Attachment => CommandOptionType::Attachment,
            };
            let builder = CreateCommandOption::new(kind, &option.name, &option.description)
                .required(option.required);
            command.add_option(match option.max_length {
                Some(max_length) => builder.max_length(max_length),
                None => builder,
            })
        },
    )
}

fn message_builder(message: &OutgoingMessage) -> CreateMessage {
    let builder = CreateMessage::new().content(&message.content);
    match &message.embed {
        Some(embed) => builder.embed(
            CreateEmbed::new()
                .title(&embed.title)
                .description(&embed.description)
                .thumbnail(&embed.thumbnail_url)
                .colour(embed.colour),
        ),
        None => builder,
    }
}

fn archive_duration(auto_archive: AutoArchive) -> AutoArchiveDuration {
    match auto_archive {
        AutoArchive::OneHour => AutoArchiveDuration::OneHour,
        AutoArchive::OneDay => AutoArchiveDuration::OneDay,
        AutoArchive::ThreeDays => AutoArchiveDuration::ThreeDays,
        AutoArchive::OneWeek => AutoArchiveDuration::OneWeek,
    }
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn create_command(
        &self,
        spec: &CommandSpec,
        scope: CommandScope,
    ) -> Result<RegisteredCommand, PlatformError> {
        self.ensure_application_id()?;
        let builder = command_builder(spec);
        let command = match scope {
            CommandScope::Global => Command::create_global_command(&*self.http, builder).await?,
            CommandScope::Guild(guild_id) => {
                discord::GuildId::new(guild_id.0).create_command(&*self.http, builder).await?
            }
        };

        Ok(RegisteredCommand { id: CommandId(command.id.get()), name: command.name, scope })
    }

    async fn delete_command(&self, command: &RegisteredCommand) -> Result<(), PlatformError> {
        self.ensure_application_id()?;
        let command_id = discord::CommandId::new(command.id.0);
        match command.scope {
            CommandScope::Global => Command::delete_global_command(&*self.http, command_id).await?,
            CommandScope::Guild(guild_id) => {
                discord::GuildId::new(guild_id.0).delete_command(&*self.http, command_id).await?
            }
        }
        Ok(())
    }

    async fn respond_to_interaction(
        &self,
        interaction: &InteractionRef,
        content: &str,
    ) -> Result<(), PlatformError> {
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content(content),
        );
        self.http
            .create_interaction_response(
                discord::InteractionId::new(interaction.id.0),
                &interaction.token,
                &response,
                Vec::new(),
            )
            .await?;
        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, PlatformError> {
        let sent = discord::ChannelId::new(channel_id.0)
            .send_message(&*self.http, message_builder(message))
            .await?;
        Ok(MessageId(sent.id.get()))
    }

    async fn start_thread_from_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        name: &str,
        auto_archive: AutoArchive,
    ) -> Result<ThreadId, PlatformError> {
        let thread = discord::ChannelId::new(channel_id.0)
            .create_thread_from_message(
                &*self.http,
                discord::MessageId::new(message_id.0),
                CreateThread::new(name).auto_archive_duration(archive_duration(auto_archive)),
            )
            .await?;
        Ok(ThreadId(thread.id.get()))
    }
}
