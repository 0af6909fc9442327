//! Read-only / low-risk commands that run without confirmation.

const ALLOWED_PROGRAMS: &[&str] = &["npm", "yarn", "pnpm", "node", "tsc", "eslint", "prettier"];

const ALLOWED_GIT_SUBCOMMANDS: &[&str] = &["status", "diff", "log", "show", "branch", "blame"];

/// Returns true if `command` is known to be read-only or low-risk enough to
/// run without asking the user first.
pub fn is_allowed(command: &[String]) -> bool {
    let Some(first) = command.first().map(String::as_str) else {
        return false;
    };

    if first.ends_with("git") {
        return command
            .get(1)
            .map(|sub| ALLOWED_GIT_SUBCOMMANDS.contains(&sub.as_str()))
            .unwrap_or(false);
    }

    ALLOWED_PROGRAMS.contains(&first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn allows_git_status_and_diff() {
        assert!(is_allowed(&tokens("git status")));
        assert!(is_allowed(&tokens("git diff")));
    }

    #[test]
    fn does_not_allow_git_commit() {
        assert!(!is_allowed(&tokens("git commit -m hi")));
    }

    #[test]
    fn allows_npm() {
        assert!(is_allowed(&tokens("npm test")));
    }
}
