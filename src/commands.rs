//! Front-end command recognition
//!
//! Classifies a line of user input as either a chat message or one of the
//! history-management commands. The history store never sees the tokens.

/// Recognized input kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the chat
    Exit,
    /// Wipe the whole history
    DeleteAll,
    /// Ask for a keyword, then delete matching messages
    DeleteMatching,
    /// Nothing to send
    Empty,
    /// Ordinary chat text, already trimmed
    Message(String),
}

const EXIT_TOKENS: &[&str] = &["/exit"];
const DELETE_ALL_TOKENS: &[&str] = &["/deldtb"];
const DELETE_MATCHING_TOKENS: &[&str] = &["/costumdeldtb", "/customdeldtb"];

impl Command {
    /// Classify a raw input line. Tokens are matched after trimming,
    /// ignoring case.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }

        let token = trimmed.to_lowercase();
        if EXIT_TOKENS.contains(&token.as_str()) {
            Command::Exit
        } else if DELETE_ALL_TOKENS.contains(&token.as_str()) {
            Command::DeleteAll
        } else if DELETE_MATCHING_TOKENS.contains(&token.as_str()) {
            Command::DeleteMatching
        } else {
            Command::Message(trimmed.to_string())
        }
    }
}

/// Usage line shown at startup
pub fn help_text() -> String {
    format!(
        "Type '{}' to quit, '{}' to delete all history, or '{}' to delete specific entries.",
        EXIT_TOKENS[0], DELETE_ALL_TOKENS[0], DELETE_MATCHING_TOKENS[0]
    )
}
