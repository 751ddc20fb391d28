//! Slash commands typed into the conversation input.

/// A command entered on the conversation screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the conversation and return to the start screen.
    Back,
    /// Clear the session history on the server and start over.
    Clear,
    /// Reload the history from the server.
    History,
    /// Save every artifact in the conversation to the export directory.
    Export,
    /// Copy the most recent artifact to the clipboard.
    Copy,
    /// Probe the service behind the conversation.
    Health,
    /// Exit the program.
    Quit,
    /// Anything else starting with `/`.
    Unknown(String),
}

impl Command {
    /// Parse `input` as a command. Returns `None` for ordinary text.
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim().strip_prefix('/')?.split_whitespace().next()?;
        Some(match name.to_ascii_lowercase().as_str() {
            "back" => Self::Back,
            "clear" => Self::Clear,
            "history" => Self::History,
            "export" => Self::Export,
            "copy" => Self::Copy,
            "health" => Self::Health,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(name.to_string()),
        })
    }
}

/// One-line summary shown in the status bar.
pub const HELP: &str = "/back /clear /history /export /copy /health /quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands() {
        assert_eq!(Command::parse("/back"), Some(Command::Back));
        assert_eq!(Command::parse("  /CLEAR "), Some(Command::Clear));
        assert_eq!(Command::parse("/history now"), Some(Command::History));
        assert_eq!(Command::parse("/export"), Some(Command::Export));
        assert_eq!(Command::parse("/copy"), Some(Command::Copy));
        assert_eq!(Command::parse("/health"), Some(Command::Health));
        assert_eq!(Command::parse("/q"), Some(Command::Quit));
    }

    #[test]
    fn unknown_command_keeps_name() {
        assert_eq!(Command::parse("/frobnicate"), Some(Command::Unknown("frobnicate".into())));
    }

    #[test]
    fn ordinary_text_is_not_a_command() {
        assert_eq!(Command::parse("what is /etc?"), None);
        assert_eq!(Command::parse("/"), None);
        assert_eq!(Command::parse(""), None);
    }
}
