//! In-memory platform fake shared by the unit tests in this crate.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    commands::{CommandScope, CommandSpec, RegisteredCommand, DESCRIPTION_OPTION, VIDEO_OPTION},
    interaction::{
        AttachmentDescriptor, ChannelId, CommandId, InteractionEvent, InteractionId,
        InteractionRef, InvokingUser, MessageId, OptionValue, ThreadId, UserId,
    },
    message::OutgoingMessage,
    platform::{AutoArchive, ChatPlatform, PlatformError},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformCall {
    CreateCommand { name: String, scope: CommandScope },
    DeleteCommand { id: CommandId },
    Respond { interaction_id: InteractionId, content: String },
    SendMessage { channel_id: ChannelId, message: OutgoingMessage },
    StartThread { channel_id: ChannelId, message_id: MessageId, name: String, auto_archive_minutes: u16 },
}

#[derive(Default)]
pub struct RecordingPlatform {
    state: Mutex<RecordingState>,
    failures: Failures,
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<PlatformCall>,
    sent_messages: Vec<MessageId>,
    next_id: u64,
}

#[derive(Default)]
struct Failures {
    create: Option<PlatformError>,
    delete: Option<PlatformError>,
    respond: Option<PlatformError>,
    send: Option<PlatformError>,
    thread: Option<PlatformError>,
}

impl RecordingState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        1_000 + self.next_id
    }
}

impl RecordingPlatform {
    pub fn fail_create(mut self, error: PlatformError) -> Self {
        self.failures.create = Some(error);
        self
    }

    pub fn fail_delete(mut self, error: PlatformError) -> Self {
        self.failures.delete = Some(error);
        self
    }

    pub fn fail_respond(mut self, error: PlatformError) -> Self {
        self.failures.respond = Some(error);
        self
    }

    pub fn fail_send(mut self, error: PlatformError) -> Self {
        self.failures.send = Some(error);
        self
    }

    pub fn fail_thread(mut self, error: PlatformError) -> Self {
        self.failures.thread = Some(error);
        self
    }

    pub async fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn sent_message_ids(&self) -> Vec<MessageId> {
        self.state.lock().await.sent_messages.clone()
    }
}

fn scripted(failure: &Option<PlatformError>) -> Result<(), PlatformError> {
    failure.clone().map_or(Ok(()), Err)
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn create_command(
        &self,
        spec: &CommandSpec,
        scope: CommandScope,
    ) -> Result<RegisteredCommand, PlatformError> {
        let mut state = self.state.lock().await;
        state.calls.push(PlatformCall::CreateCommand { name: spec.name.clone(), scope });
        scripted(&self.failures.create)?;
        let id = state.allocate_id();
        Ok(RegisteredCommand { id: CommandId(id), name: spec.name.clone(), scope })
    }

    async fn delete_command(&self, command: &RegisteredCommand) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        state.calls.push(PlatformCall::DeleteCommand { id: command.id });
        scripted(&self.failures.delete)
    }

    async fn respond_to_interaction(
        &self,
        interaction: &InteractionRef,
        content: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        state.calls.push(PlatformCall::Respond {
            interaction_id: interaction.id,
            content: content.to_owned(),
        });
        scripted(&self.failures.respond)
    }

    async fn send_channel_message(
        &self,
        channel_id: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, PlatformError> {
        let mut state = self.state.lock().await;
        state.calls.push(PlatformCall::SendMessage { channel_id, message: message.clone() });
        scripted(&self.failures.send)?;
        let id = MessageId(state.allocate_id());
        state.sent_messages.push(id);
        Ok(id)
    }

    async fn start_thread_from_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        name: &str,
        auto_archive: AutoArchive,
    ) -> Result<ThreadId, PlatformError> {
        let mut state = self.state.lock().await;
        state.calls.push(PlatformCall::StartThread {
            channel_id,
            message_id,
            name: name.to_owned(),
            auto_archive_minutes: auto_archive.minutes(),
        });
        scripted(&self.failures.thread)?;
        Ok(ThreadId(state.allocate_id()))
    }
}

/// A `form-check` invocation by `alice` (id 123) in channel 555.
pub fn form_check_event(description: &str, video_urls: &[&str]) -> InteractionEvent {
    let mut options = HashMap::new();
    options.insert(DESCRIPTION_OPTION.to_owned(), OptionValue::String(description.to_owned()));

    let mut attachments = BTreeMap::new();
    for (index, url) in video_urls.iter().enumerate() {
        let reference = format!("att-{index}");
        if index == 0 {
            options.insert(VIDEO_OPTION.to_owned(), OptionValue::Attachment(reference.clone()));
        }
        attachments.insert(
            reference,
            AttachmentDescriptor {
                url: (*url).to_owned(),
                proxy_url: format!("{url}?proxy"),
                width: Some(1280),
                height: Some(720),
                filename: "lift.mp4".to_owned(),
                content_type: Some("video/mp4".to_owned()),
            },
        );
    }

    InteractionEvent {
        interaction: InteractionRef { id: InteractionId(900), token: "interaction-token".to_owned() },
        command_name: "form-check".to_owned(),
        user: InvokingUser {
            id: UserId(123),
            username: "alice".to_owned(),
            display_name: "Alice".to_owned(),
        },
        channel_id: ChannelId(555),
        options,
        attachments,
    }
}
