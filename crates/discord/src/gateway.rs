use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serenity::client::{Client, Context, EventHandler};
use serenity::gateway::ShardManager;
use serenity::model::application::Interaction;
use serenity::model::gateway::{GatewayIntents, Ready};
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    events::InteractionDispatcher, http::SerenityPlatform, interaction::InteractionEvent,
    platform::ChatPlatform,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("could not build discord client: {0}")]
    Build(String),
    #[error("discord session stopped before it was ready: {0}")]
    Start(String),
    #[error("discord session did not shut down cleanly: {0}")]
    Close(String),
    #[error("discord session is already open")]
    AlreadyOpen,
    #[error("discord session is not open")]
    NotOpen,
}

/// Live connection to the chat platform.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Connects and waits until the session is ready to serve REST calls.
    async fn open(&self) -> Result<Arc<dyn ChatPlatform>, GatewayError>;
    async fn close(&self) -> Result<(), GatewayError>;
}

type RunnerHandle = JoinHandle<Result<(), serenity::Error>>;

struct Session {
    shard_manager: Arc<ShardManager>,
    runner: RunnerHandle,
}

pub struct SerenityGateway {
    token: SecretString,
    intents: GatewayIntents,
    dispatcher: Arc<InteractionDispatcher>,
    session: Mutex<Option<Session>>,
}

impl SerenityGateway {
    pub fn new(token: SecretString, dispatcher: Arc<InteractionDispatcher>) -> Self {
        Self {
            token,
            intents: GatewayIntents::GUILD_MESSAGES,
            dispatcher,
            session: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Gateway for SerenityGateway {
    async fn open(&self) -> Result<Arc<dyn ChatPlatform>, GatewayError> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Err(GatewayError::AlreadyOpen);
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let router = InteractionRouter {
            dispatcher: Arc::clone(&self.dispatcher),
            ready: StdMutex::new(Some(ready_tx)),
        };

        info!(
            event_name = "system.gateway.opening",
            correlation_id = "bootstrap",
            "opening discord gateway session"
        );
        let client = Client::builder(self.token.expose_secret(), self.intents)
            .event_handler(router)
            .await
            .map_err(|error| GatewayError::Build(error.to_string()))?;

        let http = Arc::clone(&client.http);
        let shard_manager = Arc::clone(&client.shard_manager);
        let mut runner: RunnerHandle = tokio::spawn(async move {
            let mut client = client;
            client.start().await
        });
        let mut pending = AbortOnDrop::new(&runner);

        let ready = tokio::select! {
            ready = ready_rx => ready.is_ok(),
            finished = &mut runner => {
                return Err(GatewayError::Start(runner_outcome(finished)));
            }
        };
        if !ready {
            return Err(GatewayError::Start(runner_outcome(runner.await)));
        }

        pending.disarm();
        *session = Some(Session { shard_manager, runner });
        Ok(Arc::new(SerenityPlatform::new(http)))
    }

    async fn close(&self) -> Result<(), GatewayError> {
        let Some(session) = self.session.lock().await.take() else {
            return Err(GatewayError::NotOpen);
        };

        info!(
            event_name = "system.gateway.closing",
            correlation_id = "shutdown",
            "closing discord gateway session"
        );
        session.shard_manager.shutdown_all().await;

        match session.runner.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(GatewayError::Close(error.to_string())),
            Err(error) => Err(GatewayError::Close(error.to_string())),
        }
    }
}

/// Aborts a spawned gateway runner if `open` is dropped before the session is stored.
struct AbortOnDrop(Option<AbortHandle>);

impl AbortOnDrop {
    fn new<T>(handle: &JoinHandle<T>) -> Self {
        Self(Some(handle.abort_handle()))
    }

    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

fn runner_outcome(finished: Result<Result<(), serenity::Error>, JoinError>) -> String {
    match finished {
        Ok(Ok(())) => "gateway exited without error".to_owned(),
        Ok(Err(error)) => error.to_string(),
        Err(error) => error.to_string(),
    }
}

struct InteractionRouter {
    dispatcher: Arc<InteractionDispatcher>,
    ready: StdMutex<Option<oneshot::Sender<()>>>,
}

impl InteractionRouter {
    fn signal_ready(&self) {
        let sender = self.ready.lock().ok().and_then(|mut ready| ready.take());
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }
}

#[serenity::async_trait]
impl EventHandler for InteractionRouter {
    async fn ready(&self, ctx: Context, ready: Ready) {
        ctx.http.set_application_id(ready.application.id);
        info!(
            event_name = "system.gateway.ready",
            correlation_id = "bootstrap",
            user = %ready.user.name,
            "logged in as {}",
            ready.user.name
        );
        self.signal_ready();
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let command = match interaction {
            Interaction::Command(command) => command,
            other => {
                debug!(
                    event_name = "ingress.discord.interaction_skipped",
                    correlation_id = %other.id(),
                    "ignoring non-command interaction"
                );
                return;
            }
        };

        let event = InteractionEvent::from(&command);
        info!(
            event_name = "ingress.discord.interaction_received",
            correlation_id = %event.correlation_id(),
            command = %event.command_name,
            user_id = %event.user.id,
            channel_id = %event.channel_id,
            "received slash command"
        );

        let platform = SerenityPlatform::new(Arc::clone(&ctx.http));
        if let Err(error) = self.dispatcher.dispatch(&event, &platform).await {
            warn!(
                event_name = "ingress.discord.dispatch_failed",
                correlation_id = %event.correlation_id(),
                command = %event.command_name,
                error = %error,
                "interaction dispatch failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use formcheck_core::MessageStyle;
    use tokio::sync::oneshot;

    use super::{AbortOnDrop, Gateway, GatewayError, InteractionRouter, SerenityGateway};
    use crate::events::default_dispatcher;

    #[tokio::test]
    async fn closing_an_unopened_session_is_rejected() {
        let gateway = SerenityGateway::new(
            "test-token".to_owned().into(),
            Arc::new(default_dispatcher(MessageStyle::Text)),
        );

        assert_eq!(gateway.close().await, Err(GatewayError::NotOpen));
    }

    #[tokio::test]
    async fn ready_is_signalled_only_once() {
        let (ready_tx, ready_rx) = oneshot::channel();
        let router = InteractionRouter {
            dispatcher: Arc::new(default_dispatcher(MessageStyle::Text)),
            ready: std::sync::Mutex::new(Some(ready_tx)),
        };

        router.signal_ready();
        router.signal_ready();

        assert!(ready_rx.await.is_ok());
        assert!(router.ready.lock().expect("ready lock").is_none());
    }

    #[tokio::test]
    async fn dropping_an_unfinished_open_aborts_the_runner() {
        let runner = tokio::spawn(std::future::pending::<()>());
        drop(AbortOnDrop::new(&runner));

        let outcome = runner.await;
        assert!(outcome.is_err_and(|error| error.is_cancelled()));
    }

    #[tokio::test]
    async fn disarmed_guard_leaves_the_runner_alive() {
        let runner = tokio::spawn(std::future::pending::<()>());
        let mut guard = AbortOnDrop::new(&runner);
        guard.disarm();
        drop(guard);
        tokio::task::yield_now().await;

        assert!(!runner.is_finished());
        runner.abort();
    }
}
