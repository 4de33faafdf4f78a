use crate::interaction::{CommandId, GuildId};

pub const FORM_CHECK_COMMAND: &str = "form-check";
pub const DESCRIPTION_OPTION: &str = "description";
pub const VIDEO_OPTION: &str = "video";
/// Leaves room for the header, mention and clip link inside a 2000 character message.
pub const DESCRIPTION_MAX_CHARS: u16 = 1500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOptionKind {
    String,
    Attachment,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOptionSpec {
    pub name: String,
    pub description: String,
    pub kind: CommandOptionKind,
    pub required: bool,
    pub max_length: Option<u16>,
}

impl CommandOptionSpec {
    pub fn new(
        kind: CommandOptionKind,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            max_length: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Upper bound on string input, enforced by the client before the command is sent.
    pub fn max_length(mut self, max_length: u16) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// Declarative shape of a slash command, before the platform assigns it an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOptionSpec>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), options: Vec::new() }
    }

    pub fn option(mut self, option: CommandOptionSpec) -> Self {
        self.options.push(option);
        self
    }
}

/// Where a command is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandScope {
    Global,
    Guild(GuildId),
}

impl CommandScope {
    pub fn from_guild(guild_id: Option<u64>) -> Self {
        guild_id.map_or(Self::Global, |id| Self::Guild(GuildId(id)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub id: CommandId,
    pub name: String,
    pub scope: CommandScope,
}

pub fn form_check_command() -> CommandSpec {
    CommandSpec::new(FORM_CHECK_COMMAND, "Command to initiate a new form check")
        .option(
            CommandOptionSpec::new(
                CommandOptionKind::String,
                DESCRIPTION_OPTION,
                "Describe your lift, what felt strong? what felt weak? Any other comments?",
            )
            .required(true)
            .max_length(DESCRIPTION_MAX_CHARS),
        )
        .option(
            CommandOptionSpec::new(
                CommandOptionKind::Attachment,
                VIDEO_OPTION,
                "Attach a clip of your lift",
            )
            .required(true),
        )
}

/// Commands this bot declares at startup.
pub fn declared_commands() -> Vec<CommandSpec> {
    vec![form_check_command()]
}

#[cfg(test)]
mod tests {
    use super::{
        declared_commands, form_check_command, CommandOptionKind, CommandScope,
        DESCRIPTION_MAX_CHARS,
    };
    use crate::interaction::GuildId;

    #[test]
    fn form_check_declares_two_required_options() {
        let spec = form_check_command();

        assert_eq!(spec.name, "form-check");
        let shape: Vec<_> =
            spec.options.iter().map(|option| (option.name.as_str(), option.kind)).collect();
        assert_eq!(
            shape,
            vec![("description", CommandOptionKind::String), ("video", CommandOptionKind::Attachment)]
        );
        assert!(spec.options.iter().all(|option| option.required));
    }

    #[test]
    fn description_length_is_capped_below_the_message_limit() {
        let spec = form_check_command();

        let limits: Vec<_> =
            spec.options.iter().map(|option| (option.name.as_str(), option.max_length)).collect();
        assert_eq!(limits, vec![("description", Some(DESCRIPTION_MAX_CHARS)), ("video", None)]);
        assert!(usize::from(DESCRIPTION_MAX_CHARS) < crate::message::MESSAGE_MAX_CHARS);
    }

    #[test]
    fn exactly_one_command_is_declared() {
        let commands = declared_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0], form_check_command());
    }

    #[test]
    fn scope_follows_optional_guild_id() {
        assert_eq!(CommandScope::from_guild(None), CommandScope::Global);
        assert_eq!(CommandScope::from_guild(Some(5)), CommandScope::Guild(GuildId(5)));
    }
}
