use crate::platform::User;

/// `@username` when the user has one, otherwise the full name.
pub fn format_user_mention(user: &User) -> String {
    if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
        return format!("@{}", username);
    }

    match user.last_name.as_deref().filter(|l| !l.is_empty()) {
        Some(last_name) => format!("{} {}", user.first_name, last_name),
        None => user.first_name.clone(),
    }
}

/// Join mentions as natural language: `A`, `A и B`, `A, B и C`.
pub fn join_mentions(users: &[User], conjunction: &str) -> String {
    let mentions: Vec<String> = users.iter().map(format_user_mention).collect();
    match mentions.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} {} {}", head.join(", "), conjunction, last),
    }
}
