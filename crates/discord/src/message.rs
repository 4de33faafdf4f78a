use formcheck_core::MessageStyle;

use crate::interaction::InvokingUser;

pub const ACKNOWLEDGEMENT: &str = "Creating a form check thread...";
pub const EMBED_COLOUR: u32 = 0x1c1c1c;
pub const MESSAGE_MAX_CHARS: usize = 2000;
pub const EMBED_DESCRIPTION_MAX_CHARS: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedTemplate {
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub colour: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    pub embed: Option<EmbedTemplate>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), embed: None }
    }

    /// Whether Discord will accept the message without a "Message too large" rejection.
    pub fn within_limits(&self) -> bool {
        self.content.chars().count() <= MESSAGE_MAX_CHARS
            && self.embed.as_ref().map_or(true, |embed| {
                embed.description.chars().count() <= EMBED_DESCRIPTION_MAX_CHARS
            })
    }

    /// Everything a reader of the channel sees, content and embed together.
    pub fn rendered_text(&self) -> String {
        match &self.embed {
            Some(embed) => format!("{}\n{}", self.content, embed.description),
            None => self.content.clone(),
        }
    }
}

pub fn thread_name(user: &InvokingUser) -> String {
    format!("Form Check for {}", user.username)
}

pub fn form_check_body(user: &InvokingUser, description: &str, video_url: &str) -> String {
    format!(
        "**Form check from {}**\n**Description**\n{description}\n{}\nLink to the clip of a lift: \n{video_url}",
        user.display_name,
        user.mention()
    )
}

/// Builds the channel post. Embeds cannot ping, so the mention stays in the content.
pub fn form_check_message(
    style: MessageStyle,
    user: &InvokingUser,
    description: &str,
    video_url: &str,
) -> OutgoingMessage {
    let body = form_check_body(user, description, video_url);
    match style {
        MessageStyle::Text => OutgoingMessage::text(body),
        MessageStyle::Embed => OutgoingMessage {
            content: user.mention(),
            embed: Some(EmbedTemplate {
                title: thread_name(user),
                description: body,
                thumbnail_url: video_url.to_owned(),
                colour: EMBED_COLOUR,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use formcheck_core::MessageStyle;

    use super::{form_check_message, thread_name, OutgoingMessage, EMBED_COLOUR, MESSAGE_MAX_CHARS};
    use crate::interaction::{InvokingUser, UserId};

    fn alice() -> InvokingUser {
        InvokingUser {
            id: UserId(123),
            username: "alice".to_owned(),
            display_name: "Alice L.".to_owned(),
        }
    }

    #[test]
    fn text_message_carries_description_mention_and_link() {
        let message = form_check_message(MessageStyle::Text, &alice(), "leg day", "https://x/y.mp4");

        assert!(message.embed.is_none());
        assert!(message.content.contains("leg day"));
        assert!(message.content.contains("<@123>"));
        assert!(message.content.contains("https://x/y.mp4"));
        assert!(message.content.contains("Alice L."));
    }

    #[test]
    fn embed_message_keeps_mention_in_content() {
        let message =
            form_check_message(MessageStyle::Embed, &alice(), "bench", "https://x/bench.mp4");

        assert_eq!(message.content, "<@123>");
        let embed = message.embed.clone().expect("embed style should attach an embed");
        assert_eq!(embed.title, "Form Check for alice");
        assert_eq!(embed.thumbnail_url, "https://x/bench.mp4");
        assert_eq!(embed.colour, EMBED_COLOUR);
        assert!(message.rendered_text().contains("bench"));
    }

    #[test]
    fn thread_name_uses_username_not_display_name() {
        assert_eq!(thread_name(&alice()), "Form Check for alice");
    }

    #[test]
    fn message_limit_counts_characters_not_bytes() {
        assert!(OutgoingMessage::text("é".repeat(MESSAGE_MAX_CHARS)).within_limits());
        assert!(!OutgoingMessage::text("a".repeat(MESSAGE_MAX_CHARS + 1)).within_limits());

        let long = "a".repeat(1_950);
        assert!(!form_check_message(MessageStyle::Text, &alice(), &long, "https://x/y.mp4")
            .within_limits());
        assert!(form_check_message(MessageStyle::Embed, &alice(), &long, "https://x/y.mp4")
            .within_limits());
    }
}
