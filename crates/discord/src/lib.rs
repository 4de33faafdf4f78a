//! Discord integration for the form-check bot
//!
//! - **Gateway** (`gateway`) - serenity session, ready handshake, interaction intake
//! - **Platform** (`platform`, `http`) - REST capability surface and its serenity implementation
//! - **Commands** (`commands`, `registrar`) - `/form-check` schema, registration and teardown
//! - **Events** (`events`) - name-keyed dispatcher for slash command interactions
//! - **Form check** (`form_check`, `message`) - the command handler and the messages it posts
//!
//! # Architecture
//!
//! ```text
//! Discord gateway → InteractionRouter → InteractionDispatcher → FormCheckHandler
//!                                                                   ↓
//!                                       ChatPlatform (ack, channel message, thread)
//! ```

pub mod commands;
pub mod events;
pub mod form_check;
pub mod gateway;
pub mod http;
pub mod interaction;
pub mod message;
pub mod platform;
pub mod registrar;

#[cfg(test)]
pub(crate) mod testing;
