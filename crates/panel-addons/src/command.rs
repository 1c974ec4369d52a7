use crate::error::InstallError;

/// Command prefixes an install manifest is allowed to run.
///
/// A trimmed command must equal one of these (trailing space stripped)
/// or start with one. Entries ending in a space require at least that
/// prefix plus an argument; bare entries like `yarn` match exactly.
pub const ALLOWED_PREFIXES: &[&str] = &[
    "npm install",
    "npm ci",
    "npm run ",
    "npx ",
    "yarn",
    "yarn install",
    "yarn run ",
    "npx prisma ",
    "prisma ",
    "mv ",
    "cp ",
    "mkdir ",
];

/// Characters that carry meaning in a shell. Commands are executed via a
/// direct argv spawn so these would be inert data anyway, but a manifest
/// that uses them is not one we want to run at all.
const SHELL_METACHARACTERS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '<', '>', '\n', '\r',
];

/// Whether a manifest command passes the prefix allowlist.
pub fn is_allowed(command: &str) -> bool {
    let trimmed = command.trim();

    if trimmed.is_empty() || trimmed.contains(SHELL_METACHARACTERS) {
        return false;
    }

    ALLOWED_PREFIXES
        .iter()
        .any(|prefix| trimmed == prefix.trim_end() || trimmed.starts_with(prefix))
}

/// A command resolved to a binary and argument vector, ready for a
/// shell-free spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub bin: String,
    pub args: Vec<String>,
}

/// Validate a manifest command and split it into binary + argv.
///
/// Splitting is on whitespace only; there is no quoting or expansion,
/// because nothing the allowlist admits needs either.
pub fn parse_command(command: &str) -> Result<CommandLine, InstallError> {
    let trimmed = command.trim();

    if !is_allowed(trimmed) {
        return Err(InstallError::CommandRejected {
            cmd: trimmed.to_owned(),
        });
    }

    let mut parts = parts_of(trimmed);
    let bin = parts.remove(0);

    Ok(CommandLine { bin, args: parts })
}

fn parts_of(trimmed: &str) -> Vec<String> {
    trimmed.split_whitespace().map(str::to_owned).collect()
}
