use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serenity::model::application::{CommandDataOptionValue, CommandInteraction};
use serenity::model::channel::Attachment;
use serenity::model::id::AttachmentId;
use serenity::model::user::User;

macro_rules! snowflake {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

snowflake!(InteractionId, UserId, ChannelId, MessageId, ThreadId, CommandId, GuildId);

/// Handle needed to answer an interaction: its id plus the short-lived token.
#[derive(Clone, PartialEq, Eq)]
pub struct InteractionRef {
    pub id: InteractionId,
    pub token: String,
}

impl fmt::Debug for InteractionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionRef").field("id", &self.id).field("token", &"[redacted]").finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokingUser {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
}

impl InvokingUser {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    /// Reference into [`InteractionEvent::attachments`].
    Attachment(String),
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub url: String,
    pub proxy_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub filename: String,
    pub content_type: Option<String>,
}

/// A slash command invocation, detached from the gateway types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionEvent {
    pub interaction: InteractionRef,
    pub command_name: String,
    pub user: InvokingUser,
    pub channel_id: ChannelId,
    pub options: HashMap<String, OptionValue>,
    pub attachments: BTreeMap<String, AttachmentDescriptor>,
}

impl InteractionEvent {
    pub fn correlation_id(&self) -> String {
        self.interaction.id.to_string()
    }

    pub fn string_option(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<&Attachment> for AttachmentDescriptor {
    fn from(attachment: &Attachment) -> Self {
        Self {
            url: attachment.url.clone(),
            proxy_url: attachment.proxy_url.clone(),
            width: attachment.width,
            height: attachment.height,
            filename: attachment.filename.clone(),
            content_type: attachment.content_type.clone(),
        }
    }
}

impl From<&CommandDataOptionValue> for OptionValue {
    fn from(value: &CommandDataOptionValue) -> Self {
        match value {
            CommandDataOptionValue::String(text) => Self::String(text.clone()),
            CommandDataOptionValue::Attachment(id) => Self::Attachment(id.get().to_string()),
            _ => Self::Other,
        }
    }
}

impl InvokingUser {
    /// Header name falls back from the guild nickname to the global name to the username.
    pub fn from_discord(user: &User, nick: Option<&str>) -> Self {
        let display_name = nick
            .map(str::to_owned)
            .or_else(|| user.global_name.clone())
            .unwrap_or_else(|| user.name.clone());
        Self { id: UserId(user.id.get()), username: user.name.clone(), display_name }
    }
}

/// Keys resolved attachments the same way attachment options refer to them.
fn resolved_attachments(
    resolved: &HashMap<AttachmentId, Attachment>,
) -> BTreeMap<String, AttachmentDescriptor> {
    resolved
        .iter()
        .map(|(id, attachment)| (id.get().to_string(), AttachmentDescriptor::from(attachment)))
        .collect()
}

impl From<&CommandInteraction> for InteractionEvent {
    fn from(interaction: &CommandInteraction) -> Self {
        // Direct messages carry no member, so there is no nickname to prefer.
        let nick = interaction.member.as_ref().and_then(|member| member.nick.as_deref());

        let options = interaction
            .data
            .options
            .iter()
            .map(|option| (option.name.clone(), OptionValue::from(&option.value)))
            .collect();

        Self {
            interaction: InteractionRef {
                id: InteractionId(interaction.id.get()),
                token: interaction.token.clone(),
            },
            command_name: interaction.data.name.clone(),
            user: InvokingUser::from_discord(&interaction.user, nick),
            channel_id: ChannelId(interaction.channel_id.get()),
            options,
            attachments: resolved_attachments(&interaction.data.resolved.attachments),
        }
    }
}
