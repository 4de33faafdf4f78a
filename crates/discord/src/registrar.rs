use thiserror::Error;
use tracing::{error, info};

use crate::{
    commands::{CommandScope, CommandSpec, RegisteredCommand},
    interaction::CommandId,
    platform::{ChatPlatform, PlatformError},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("cannot create `{name}` command: {source}")]
    Create {
        name: String,
        #[source]
        source: PlatformError,
    },
    #[error("cannot delete `{name}` command ({id}): {source}")]
    Delete {
        name: String,
        id: CommandId,
        #[source]
        source: PlatformError,
    },
}

/// Tracks the commands this run created so shutdown removes exactly those.
#[derive(Debug, Default)]
pub struct CommandRegistrar {
    registered: Vec<RegisteredCommand>,
}

impl CommandRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) -> &[RegisteredCommand] {
        &self.registered
    }

    pub async fn register_all(
        &mut self,
        platform: &dyn ChatPlatform,
        specs: &[CommandSpec],
        scope: CommandScope,
    ) -> Result<(), RegistrationError> {
        info!(
            event_name = "system.commands.registering",
            correlation_id = "bootstrap",
            count = specs.len(),
            scope = ?scope,
            "adding commands"
        );

        for spec in specs {
            let command = platform.create_command(spec, scope).await.map_err(|source| {
                RegistrationError::Create { name: spec.name.clone(), source }
            })?;
            info!(
                event_name = "system.commands.registered",
                correlation_id = "bootstrap",
                command = %command.name,
                command_id = %command.id,
                "command registered"
            );
            self.registered.push(command);
        }

        Ok(())
    }

    /// Deletes every tracked command. All deletions are attempted; the first failure is returned.
    pub async fn deregister_all(
        &mut self,
        platform: &dyn ChatPlatform,
    ) -> Result<(), RegistrationError> {
        info!(
            event_name = "system.commands.removing",
            correlation_id = "shutdown",
            count = self.registered.len(),
            "removing commands"
        );

        let mut first_failure = None;
        for command in self.registered.drain(..) {
            match platform.delete_command(&command).await {
                Ok(()) => info!(
                    event_name = "system.commands.removed",
                    correlation_id = "shutdown",
                    command = %command.name,
                    command_id = %command.id,
                    "command removed"
                ),
                Err(source) => {
                    error!(
                        event_name = "system.commands.remove_failed",
                        correlation_id = "shutdown",
                        command = %command.name,
                        command_id = %command.id,
                        error = %source,
                        "cannot delete command; it stays registered"
                    );
                    first_failure.get_or_insert(RegistrationError::Delete {
                        name: command.name,
                        id: command.id,
                        source,
                    });
                }
            }
        }

        first_failure.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandRegistrar, RegistrationError};
    use crate::commands::{declared_commands, CommandScope, CommandSpec};
    use crate::interaction::{CommandId, GuildId};
    use crate::platform::PlatformError;
    use crate::testing::{PlatformCall, RecordingPlatform};

    #[tokio::test]
    async fn registers_once_and_deletes_the_same_id() {
        let platform = RecordingPlatform::default();
        let mut registrar = CommandRegistrar::new();

        registrar
            .register_all(&platform, &declared_commands(), CommandScope::Global)
            .await
            .expect("registration");
        let id = registrar.registered()[0].id;
        registrar.deregister_all(&platform).await.expect("deregistration");

        assert_eq!(
            platform.calls().await,
            vec![
                PlatformCall::CreateCommand {
                    name: "form-check".to_owned(),
                    scope: CommandScope::Global,
                },
                PlatformCall::DeleteCommand { id },
            ]
        );
        assert!(registrar.registered().is_empty());
    }

    #[tokio::test]
    async fn guild_scope_is_passed_through() {
        let platform = RecordingPlatform::default();
        let mut registrar = CommandRegistrar::new();
        let scope = CommandScope::Guild(GuildId(77));

        registrar.register_all(&platform, &declared_commands(), scope).await.expect("registration");

        assert_eq!(registrar.registered()[0].scope, scope);
    }

    #[tokio::test]
    async fn create_failure_names_the_command() {
        let platform =
            RecordingPlatform::default().fail_create(PlatformError::Request("401".to_owned()));
        let mut registrar = CommandRegistrar::new();

        let error = registrar
            .register_all(&platform, &declared_commands(), CommandScope::Global)
            .await
            .expect_err("registration should fail");

        assert!(matches!(error, RegistrationError::Create { ref name, .. } if name == "form-check"));
        assert!(registrar.registered().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_still_attempts_every_command() {
        let platform =
            RecordingPlatform::default().fail_delete(PlatformError::Request("503".to_owned()));
        let mut registrar = CommandRegistrar::new();
        let specs = vec![
            CommandSpec::new("first", "first command"),
            CommandSpec::new("second", "second command"),
        ];
        registrar.register_all(&platform, &specs, CommandScope::Global).await.expect("registration");

        let error = registrar.deregister_all(&platform).await.expect_err("deletion should fail");

        assert!(matches!(error, RegistrationError::Delete { ref name, .. } if name == "first"));
        let deletes: Vec<CommandId> = platform
            .calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::DeleteCommand { id } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(deletes.len(), 2);
    }
}
