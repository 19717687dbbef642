//! Builds the welcome reply for a triggering message.

use crate::config::{Links, WelcomeConfig, MENTION_PLACEHOLDER};
use crate::platform::telegram::{InlineKeyboardButton, InlineKeyboardMarkup, ReplyPayload};
use crate::platform::{Message, User};

use super::mention::join_mentions;
use super::Trigger;

/// Thread ids at or below this are not sent. 0 is "no thread" and 1 is the
/// forum's General topic, which `sendMessage` rejects.
const NO_THREAD: i64 = 1;

/// Users addressed by the greeting.
pub fn greeted_users(message: &Message, trigger: Trigger) -> &[User] {
    match trigger {
        Trigger::Keyword => std::slice::from_ref(&message.from),
        Trigger::Join => &message.new_chat_members,
    }
}

pub fn create_welcome_message(users: &[User], welcome: &WelcomeConfig) -> String {
    let mention = join_mentions(users, &welcome.conjunction);
    welcome.template.replace(MENTION_PLACEHOLDER, &mention)
}

/// One link button per row, in a fixed order.
pub fn create_buttons_markup(links: &Links) -> InlineKeyboardMarkup {
    let mut buttons = vec![
        ("Как сделать заказ", links.prices.as_str()),
        ("Что такое крафтовое мыло", links.soap.as_str()),
        ("Что такое гидролат", links.distillate.as_str()),
    ];
    if let Some(ubtan) = links.ubtan.as_deref() {
        buttons.push(("Что такое убтан", ubtan));
    }

    InlineKeyboardMarkup {
        inline_keyboard: buttons
            .into_iter()
            .map(|(text, url)| {
                vec![InlineKeyboardButton {
                    text: text.to_string(),
                    url: url.to_string(),
                }]
            })
            .collect(),
    }
}

pub fn reply_thread_id(thread_id: i64) -> Option<i64> {
    (thread_id > NO_THREAD).then_some(thread_id)
}

pub fn compose_reply(
    message: &Message,
    trigger: Trigger,
    welcome: &WelcomeConfig,
    links: &Links,
    thread_id: i64,
) -> ReplyPayload {
    ReplyPayload {
        chat_id: message.chat.id,
        message_thread_id: reply_thread_id(thread_id),
        text: create_welcome_message(greeted_users(message, trigger), welcome),
        reply_markup: create_buttons_markup(links),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Chat;

    const GREETING_TAIL: &str = "!\n\nВы пришли в мастерскую крафтового мыла «Мыльная Мама», которая специализируется на натуральной и безопасной продукции. Делаем своими руками, из своих трав и по своим рецептам.";

    fn links() -> Links {
        Links {
            prices: "https://example.com/prices".to_string(),
            soap: "https://example.com/soap".to_string(),
            distillate: "https://example.com/distillate".to_string(),
            ubtan: Some("https://example.com/ubtan".to_string()),
        }
    }

    fn user(id: i64, first: &str, last: &str, username: Option<&str>) -> User {
        User {
            id,
            first_name: first.to_string(),
            last_name: Some(last.to_string()),
            username: username.map(str::to_string),
        }
    }

    fn jane() -> User {
        user(111222333, "Jane", "Smith", Some("janesmith"))
    }

    fn bob() -> User {
        user(444555666, "Bob", "Johnson", Some("bobjohnson"))
    }

    #[test]
    fn test_create_welcome_message() {
        let welcome = WelcomeConfig::default();
        let cases = [
            (vec![jane()], "Привет, @janesmith"),
            (vec![jane(), bob()], "Привет, @janesmith и @bobjohnson"),
            (
                vec![
                    jane(),
                    bob(),
                    user(777888999, "Alice", "Brown", Some("alicebrown")),
                ],
                "Привет, @janesmith, @bobjohnson и @alicebrown",
            ),
            (
                vec![user(111222333, "Jane", "Smith", None)],
                "Привет, Jane Smith",
            ),
        ];
        for (users, head) in cases {
            assert_eq!(
                create_welcome_message(&users, &welcome),
                format!("{}{}", head, GREETING_TAIL)
            );
        }
    }

    #[test]
    fn test_custom_template_and_conjunction() {
        let welcome = WelcomeConfig {
            conjunction: "and".to_string(),
            template: "Welcome, {mention}!".to_string(),
            ..Default::default()
        };
        assert_eq!(
            create_welcome_message(&[jane(), bob()], &welcome),
            "Welcome, @janesmith and @bobjohnson!"
        );
    }

    #[test]
    fn test_create_buttons_markup() {
        let markup = create_buttons_markup(&links());
        let rows: Vec<(&str, &str)> = markup
            .inline_keyboard
            .iter()
            .map(|row| {
                assert_eq!(row.len(), 1);
                (row[0].text.as_str(), row[0].url.as_str())
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Как сделать заказ", "https://example.com/prices"),
                ("Что такое крафтовое мыло", "https://example.com/soap"),
                ("Что такое гидролат", "https://example.com/distillate"),
                ("Что такое убтан", "https://example.com/ubtan"),
            ]
        );
    }

    #[test]
    fn test_buttons_markup_without_ubtan() {
        let mut links = links();
        links.ubtan = None;
        let markup = create_buttons_markup(&links);
        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(markup.inline_keyboard[2][0].text, "Что такое гидролат");
    }

    #[test]
    fn test_buttons_markup_is_stable() {
        assert_eq!(create_buttons_markup(&links()), create_buttons_markup(&links()));
    }

    #[test]
    fn test_reply_thread_id() {
        assert_eq!(reply_thread_id(0), None);
        assert_eq!(reply_thread_id(1), None);
        assert_eq!(reply_thread_id(-5), None);
        assert_eq!(reply_thread_id(2), Some(2));
    }

    #[test]
    fn test_compose_reply_for_new_members() {
        let message = Message {
            chat: Chat { id: 123456789 },
            from: user(987654321, "John", "Doe", Some("johndoe")),
            new_chat_members: vec![jane()],
            ..Default::default()
        };
        let payload = compose_reply(
            &message,
            Trigger::Join,
            &WelcomeConfig::default(),
            &links(),
            2,
        );
        assert_eq!(payload.chat_id, 123456789);
        assert_eq!(payload.message_thread_id, Some(2));
        assert!(payload.text.starts_with("Привет, @janesmith!"));
        assert_eq!(payload.reply_markup.inline_keyboard.len(), 4);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("123456789"));
        assert!(json.contains("inline_keyboard"));
        assert!(json.contains("message_thread_id"));
    }

    #[test]
    fn test_compose_reply_for_keyword_greets_sender() {
        let message = Message {
            text: "где ботик?".to_string(),
            chat: Chat { id: -100500 },
            from: user(1, "Anna", "Ivanova", None),
            ..Default::default()
        };
        let payload = compose_reply(
            &message,
            Trigger::Keyword,
            &WelcomeConfig::default(),
            &links(),
            0,
        );
        assert_eq!(payload.chat_id, -100500);
        assert!(payload.text.starts_with("Привет, Anna Ivanova!"));

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("message_thread_id"));
    }
}
