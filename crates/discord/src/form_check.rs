//! The `/form-check` command: acknowledge, post the clip, open a thread on it.

use async_trait::async_trait;
use formcheck_core::MessageStyle;
use tracing::{info, warn};

use crate::{
    commands::{DESCRIPTION_MAX_CHARS, DESCRIPTION_OPTION, FORM_CHECK_COMMAND},
    events::{CommandHandler, HandlerError},
    interaction::{AttachmentDescriptor, InteractionEvent},
    message::{form_check_message, thread_name, OutgoingMessage, ACKNOWLEDGEMENT},
    platform::{AutoArchive, ChatPlatform},
};

pub const THREAD_AUTO_ARCHIVE: AutoArchive = AutoArchive::OneHour;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission<'a> {
    pub description: &'a str,
    pub video: &'a AttachmentDescriptor,
}

/// Pulls the description and the single video out of an interaction.
pub fn resolve_submission(event: &InteractionEvent) -> Result<Submission<'_>, HandlerError> {
    let description = event
        .string_option(DESCRIPTION_OPTION)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| HandlerError::InvalidSubmission("a description is required".to_owned()))?;

    let length = description.chars().count();
    if length > usize::from(DESCRIPTION_MAX_CHARS) {
        return Err(HandlerError::InvalidSubmission(format!(
            "the description is {length} characters long; the limit is {DESCRIPTION_MAX_CHARS}"
        )));
    }

    let mut attachments = event.attachments.values();
    let video = match (attachments.next(), attachments.next()) {
        (Some(video), None) => video,
        (None, _) => {
            return Err(HandlerError::InvalidSubmission(
                "a video attachment is required".to_owned(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(HandlerError::InvalidSubmission(format!(
                "expected exactly one video attachment, got {}",
                event.attachments.len()
            )))
        }
    };

    Ok(Submission { description, video })
}

pub struct FormCheckHandler {
    style: MessageStyle,
}

impl FormCheckHandler {
    pub fn new(style: MessageStyle) -> Self {
        Self { style }
    }

    /// Builds the channel post, rejecting anything Discord would refuse to deliver.
    fn compose(&self, event: &InteractionEvent) -> Result<OutgoingMessage, HandlerError> {
        let submission = resolve_submission(event)?;
        let message = form_check_message(
            self.style,
            &event.user,
            submission.description,
            &submission.video.url,
        );
        if !message.within_limits() {
            return Err(HandlerError::InvalidSubmission(
                "the form check message would be too long for Discord; shorten the description"
                    .to_owned(),
            ));
        }
        Ok(message)
    }
}

#[async_trait]
impl CommandHandler for FormCheckHandler {
    fn command_name(&self) -> &str {
        FORM_CHECK_COMMAND
    }

    async fn handle(
        &self,
        event: &InteractionEvent,
        platform: &dyn ChatPlatform,
    ) -> Result<(), HandlerError> {
        let message = match self.compose(event) {
            Ok(message) => message,
            Err(error) => {
                let reply = format!("Could not create a form check thread: {error}");
                acknowledge(platform, event, &reply).await;
                return Err(error);
            }
        };

        // Discord drops interactions that are not answered within three seconds.
        acknowledge(platform, event, ACKNOWLEDGEMENT).await;

        let message_id = match platform.send_channel_message(event.channel_id, &message).await {
            Ok(message_id) => message_id,
            Err(error) => {
                warn!(
                    event_name = "formcheck.message.failed",
                    correlation_id = %event.correlation_id(),
                    channel_id = %event.channel_id,
                    error = %error,
                    "form check message failed; skipping thread creation"
                );
                return Err(HandlerError::SendMessage(error));
            }
        };
        info!(
            event_name = "formcheck.message.sent",
            correlation_id = %event.correlation_id(),
            channel_id = %event.channel_id,
            message_id = %message_id,
            "form check message posted"
        );

        let name = thread_name(&event.user);
        let thread_id = platform
            .start_thread_from_message(event.channel_id, message_id, &name, THREAD_AUTO_ARCHIVE)
            .await
            .map_err(HandlerError::StartThread)?;
        info!(
            event_name = "formcheck.thread.started",
            correlation_id = %event.correlation_id(),
            channel_id = %event.channel_id,
            message_id = %message_id,
            thread_id = %thread_id,
            thread_name = %name,
            "form check thread started"
        );

        Ok(())
    }
}

async fn acknowledge(platform: &dyn ChatPlatform, event: &InteractionEvent, content: &str) {
    if let Err(error) = platform.respond_to_interaction(&event.interaction, content).await {
        warn!(
            event_name = "formcheck.ack.failed",
            correlation_id = %event.correlation_id(),
            error = %error,
            "failed to acknowledge interaction"
        );
    }
}
