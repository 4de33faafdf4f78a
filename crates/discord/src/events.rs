use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use formcheck_core::MessageStyle;
use thiserror::Error;
use tracing::debug;

use crate::{
    form_check::FormCheckHandler,
    interaction::InteractionEvent,
    platform::{ChatPlatform, PlatformError},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error("could not post the form check message: {0}")]
    SendMessage(#[source] PlatformError),
    #[error("could not start the form check thread: {0}")]
    StartThread(#[source] PlatformError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("`{command}` handler failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: HandlerError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Ignored,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn command_name(&self) -> &str;
    async fn handle(
        &self,
        event: &InteractionEvent,
        platform: &dyn ChatPlatform,
    ) -> Result<(), HandlerError>;
}

/// Routes interactions to handlers by command name. Built once, read-only afterwards.
#[derive(Default)]
pub struct InteractionDispatcher {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl InteractionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.handlers.insert(handler.command_name().to_owned(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        event: &InteractionEvent,
        platform: &dyn ChatPlatform,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(handler) = self.handlers.get(&event.command_name) else {
            debug!(
                event_name = "ingress.discord.interaction_ignored",
                correlation_id = %event.correlation_id(),
                command = %event.command_name,
                "no handler registered for command"
            );
            return Ok(DispatchOutcome::Ignored);
        };

        handler.handle(event, platform).await.map_err(|source| DispatchError::Handler {
            command: event.command_name.clone(),
            source,
        })?;
        Ok(DispatchOutcome::Handled)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher(style: MessageStyle) -> InteractionDispatcher {
    let mut dispatcher = InteractionDispatcher::new();
    dispatcher.register(FormCheckHandler::new(style));
    dispatcher
}
