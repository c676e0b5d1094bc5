//! Parsing of inbound message text.

use std::sync::OnceLock;

use regex::Regex;

/// Argument of an index-addressed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexArg {
    /// No argument given.
    Missing,
    /// Something other than ASCII digits.
    NotANumber,
    /// 0-based position in the last listing.
    Index(usize),
}

impl IndexArg {
    fn parse(arg: &str) -> Self {
        let arg = arg.trim();
        if arg.is_empty() {
            Self::Missing
        } else if arg.bytes().all(|b| b.is_ascii_digit()) {
            // overflowing values can never be in range
            Self::Index(arg.parse().unwrap_or(usize::MAX))
        } else {
            Self::NotANumber
        }
    }
}

/// A recognised command, or free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Remove(IndexArg),
    Send(IndexArg),
    Clear,
    Stats,
    /// Anything else, including unknown slash commands.
    Text(String),
}

impl Command {
    /// Parse the text of an inbound message.
    ///
    /// ```
    /// use filerelay::bot::{Command, IndexArg};
    ///
    /// assert_eq!(Command::parse("/rm 2"), Command::Remove(IndexArg::Index(2)));
    /// assert_eq!(Command::parse("/send x"), Command::Send(IndexArg::NotANumber));
    /// assert_eq!(Command::parse("/ls"), Command::List);
    /// ```
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Self::Text(trimmed.to_string());
        }

        let (name, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg),
            None => (trimmed, ""),
        };

        match name {
            "/help" | "/start" => Self::Help,
            "/ls" => Self::List,
            "/rm" => Self::Remove(IndexArg::parse(arg)),
            "/send" => Self::Send(IndexArg::parse(arg)),
            "/clear" => Self::Clear,
            "/stats" => Self::Stats,
            _ => Self::Text(trimmed.to_string()),
        }
    }
}

fn locator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://\S+").expect("valid regex"))
}

/// HTTP(S) locators found in `text`, in order, at most `max` of them.
pub fn extract_locators(text: &str, max: usize) -> Vec<&str> {
    locator_pattern()
        .find_iter(text)
        .take(max)
        .map(|m| m.as_str())
        .collect()
}
