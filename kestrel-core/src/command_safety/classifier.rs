//! Command classification: blocklist → block, allowlist → allow,
//! else → requires confirmation.

use crate::command_safety::allowlist::is_allowed;
use crate::command_safety::dangerous::is_dangerous;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    Blocked,
    Allowed,
    RequiresConfirmation,
}

pub fn classify(command: &[String]) -> CommandClass {
    if is_dangerous(command) {
        CommandClass::Blocked
    } else if is_allowed(command) {
        CommandClass::Allowed
    } else {
        CommandClass::RequiresConfirmation
    }
}

/// Tokenizes a shell command line for classification, per `shell_words`'s
/// POSIX-ish quoting rules. Falls back to a naive whitespace split on a
/// malformed (unterminated quote) line so classification never panics.
pub fn tokenize(command_line: &str) -> Vec<String> {
    shell_words::split(command_line)
        .unwrap_or_else(|_| command_line.split_whitespace().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocklist_wins_over_everything() {
        assert_eq!(classify(&tokenize("sudo rm -rf /")), CommandClass::Blocked);
    }

    #[test]
    fn allowlist_skips_confirmation() {
        assert_eq!(classify(&tokenize("git status")), CommandClass::Allowed);
    }

    #[test]
    fn unknown_commands_require_confirmation() {
        assert_eq!(
            classify(&tokenize("curl http://example.com")),
            CommandClass::RequiresConfirmation
        );
    }

    #[test]
    fn tokenizes_quoted_arguments() {
        let tokens = tokenize("git commit -m \"fix bug\"");
        assert_eq!(tokens, vec!["git", "commit", "-m", "fix bug"]);
    }
}
