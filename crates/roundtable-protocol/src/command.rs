//! Slash commands recognized in chat.
//!
//! Group chats on bot platforms address commands to a specific bot with
//! `/command@botname`. A command addressed to some other bot is just chat.

/// A command the game core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Opt in to the next game in this room.
    Join,
}

impl Command {
    /// Parses `text` as a command for the bot called `bot_name`.
    ///
    /// Accepts `/join` and `/join@<bot_name>` (bot name compared
    /// case-insensitively), with surrounding whitespace and trailing
    /// arguments ignored. When `bot_name` is `None` any `@` suffix is
    /// accepted.
    pub fn parse(text: &str, bot_name: Option<&str>) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let word = word.strip_prefix('/')?;

        let (name, target) = match word.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (word, None),
        };

        if let (Some(target), Some(bot)) = (target, bot_name) {
            if !target.eq_ignore_ascii_case(bot) {
                return None;
            }
        }

        match name.to_ascii_lowercase().as_str() {
            "join" => Some(Self::Join),
            _ => None,
        }
    }
}
