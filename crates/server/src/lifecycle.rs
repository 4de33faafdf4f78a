use std::sync::Arc;

use formcheck_discord::{
    commands::{CommandScope, CommandSpec},
    gateway::{Gateway, GatewayError},
    platform::ChatPlatform,
    registrar::{CommandRegistrar, RegistrationError},
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Connected,
    Running,
    ShuttingDown,
    Exited,
}

impl LifecycleState {
    fn correlation_id(self) -> &'static str {
        match self {
            Self::Starting | Self::Connected | Self::Running => "bootstrap",
            Self::ShuttingDown | Self::Exited => "shutdown",
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not open discord session: {0}")]
    Open(#[source] GatewayError),
    #[error("command registration failed: {0}")]
    Register(#[source] RegistrationError),
    #[error("command removal failed: {0}")]
    Deregister(#[source] RegistrationError),
}

/// Opens the session, registers commands, waits for shutdown, then tears both down.
pub struct Lifecycle {
    gateway: Arc<dyn Gateway>,
    commands: Vec<CommandSpec>,
    scope: CommandScope,
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new(gateway: Arc<dyn Gateway>, commands: Vec<CommandSpec>, scope: CommandScope) -> Self {
        Self { gateway, commands, scope, state: LifecycleState::Starting }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn transition(&mut self, next: LifecycleState) {
        info!(
            event_name = "system.lifecycle.transition",
            correlation_id = next.correlation_id(),
            from = ?self.state,
            to = ?next,
            "lifecycle state changed"
        );
        self.state = next;
    }

    /// Shutdown requested while opening or registering wins over the pending call.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), LifecycleError> {
        let opened = tokio::select! {
            biased;
            opened = self.gateway.open() => Some(opened),
            () = shutdown.cancelled() => None,
        };
        let platform = match opened {
            Some(Ok(platform)) => platform,
            Some(Err(open_error)) => {
                self.transition(LifecycleState::Exited);
                return Err(LifecycleError::Open(open_error));
            }
            None => {
                info!(
                    event_name = "system.lifecycle.cancelled",
                    correlation_id = "shutdown",
                    phase = "open",
                    "shutdown requested before the discord session opened"
                );
                self.transition(LifecycleState::ShuttingDown);
                self.transition(LifecycleState::Exited);
                return Ok(());
            }
        };

        let mut registrar = CommandRegistrar::new();
        let registered = tokio::select! {
            biased;
            registered = registrar.register_all(platform.as_ref(), &self.commands, self.scope) => {
                Some(registered)
            }
            () = shutdown.cancelled() => None,
        };
        match registered {
            Some(Ok(())) => {}
            Some(Err(registration_error)) => {
                if let Err(cleanup_error) = self.tear_down(&mut registrar, platform.as_ref()).await {
                    warn!(
                        event_name = "system.lifecycle.cleanup_failed",
                        correlation_id = "shutdown",
                        error = %cleanup_error,
                        "could not remove commands registered before the failure"
                    );
                }
                return Err(LifecycleError::Register(registration_error));
            }
            None => {
                info!(
                    event_name = "system.lifecycle.cancelled",
                    correlation_id = "shutdown",
                    phase = "register",
                    registered = registrar.registered().len(),
                    "shutdown requested while registering commands"
                );
                return self.tear_down(&mut registrar, platform.as_ref()).await;
            }
        }
        self.transition(LifecycleState::Connected);

        self.transition(LifecycleState::Running);
        info!(
            event_name = "system.server.started",
            correlation_id = "bootstrap",
            "bot is now running; press ctrl-c to exit"
        );
        shutdown.cancelled().await;

        self.tear_down(&mut registrar, platform.as_ref()).await
    }

    /// Closes the session first, then deletes whatever the registrar recorded.
    async fn tear_down(
        &mut self,
        registrar: &mut CommandRegistrar,
        platform: &dyn ChatPlatform,
    ) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::ShuttingDown);
        self.close_session().await;
        let result = registrar.deregister_all(platform).await.map_err(LifecycleError::Deregister);
        self.transition(LifecycleState::Exited);
        result
    }

    async fn close_session(&self) {
        if let Err(close_error) = self.gateway.close().await {
            warn!(
                event_name = "system.gateway.close_failed",
                correlation_id = "shutdown",
                error = %close_error,
                "discord session did not close cleanly"
            );
        }
    }
}

/// Cancels `shutdown` on SIGINT or SIGTERM. Handlers already running are left to finish.
pub fn spawn_signal_listener(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                signal,
                "termination signal received"
            ),
            Err(signal_error) => error!(
                event_name = "system.server.signal_failed",
                correlation_id = "shutdown",
                error = %signal_error,
                "could not listen for termination signals; shutting down"
            ),
        }
        shutdown.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => interrupted.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
