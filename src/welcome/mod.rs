pub mod compose;
pub mod mention;

use serde::Deserialize;

use crate::config::WelcomeConfig;
use crate::platform::Message;

/// What made a message worth greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Someone mentioned the keyword in the target chat; greet the sender.
    Keyword,
    /// Members were added to the target chat; greet them.
    Join,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Keyword => write!(f, "keyword"),
            Trigger::Join => write!(f, "join"),
        }
    }
}

pub fn contains_keyword(message: Option<&Message>, chat_id: i64, keyword: &str) -> bool {
    message.is_some_and(|msg| {
        msg.chat.id == chat_id && msg.text.to_lowercase().contains(&keyword.to_lowercase())
    })
}

pub fn is_new_member_joined(message: Option<&Message>, chat_id: i64) -> bool {
    message.is_some_and(|msg| msg.chat.id == chat_id && !msg.new_chat_members.is_empty())
}

/// Decides whether an update warrants a welcome reply.
#[derive(Debug, Clone)]
pub struct Detector {
    chat_id: i64,
    triggers: Vec<Trigger>,
    keyword: String,
}

impl Detector {
    pub fn new(chat_id: i64, welcome: &WelcomeConfig) -> Self {
        Self {
            chat_id,
            triggers: welcome.triggers.clone(),
            keyword: welcome.keyword.to_lowercase(),
        }
    }

    fn enabled(&self, trigger: Trigger) -> bool {
        self.triggers.contains(&trigger)
    }

    /// Join takes precedence over keyword when a message matches both.
    pub fn detect(&self, message: Option<&Message>) -> Option<Trigger> {
        if self.enabled(Trigger::Join) && is_new_member_joined(message, self.chat_id) {
            return Some(Trigger::Join);
        }
        if self.enabled(Trigger::Keyword) && contains_keyword(message, self.chat_id, &self.keyword)
        {
            return Some(Trigger::Keyword);
        }
        None
    }
}
