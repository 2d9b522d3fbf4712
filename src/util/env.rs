//! Environment detection utilities.

use std::io::IsTerminal;

/// Check if stdout is a TTY.
#[must_use]
pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is a TTY.
#[must_use]
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Interpret an environment variable as a boolean flag.
///
/// `1`, `true`, `yes` and `on` (any case) are truthy; everything else,
/// including an unset variable, is not.
#[must_use]
pub fn is_env_truthy(key: &str) -> bool {
    std::env::var(key).is_ok_and(|v| {
        matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// Check if color should be enabled.
#[must_use]
pub fn should_use_color(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }

    // NO_COLOR only needs to be present
    if std::env::var_os("NO_COLOR").is_some() || is_env_truthy("KEYPROBE_NO_COLOR") {
        return false;
    }

    if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
        return false;
    }

    stdout_is_tty()
}
