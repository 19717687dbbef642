pub mod telegram;

use serde::Deserialize;

/// An inbound Telegram update. Only `message` is read; other update kinds
/// (edited messages, channel posts, callbacks) decode with `message: None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<Message>,
}

/// A message as delivered to the webhook. Missing fields fall back to empty
/// values so partial updates simply fail to trigger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub new_chat_members: Vec<User>,
    #[serde(default)]
    pub message_thread_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}
