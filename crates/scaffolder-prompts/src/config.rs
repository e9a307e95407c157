//! Session configuration

use std::time::Duration;

/// Default wait before a lone ESC byte is treated as the Escape key
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);

/// Terminal session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long the decoder waits for the rest of an escape sequence
    pub escape_timeout: Duration,

    /// Enable SGR mouse reporting while the session is started
    pub mouse: bool,

    /// Render on the alternate screen buffer
    pub alternate_screen: bool,

    /// Print one summary line per answered prompt after the session stops
    pub echo_answers: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            escape_timeout: DEFAULT_ESCAPE_TIMEOUT,
            mouse: true,
            alternate_screen: true,
            echo_answers: true,
        }
    }
}

impl SessionConfig {
    /// Build from environment variables using the given prefix:
    /// `<PREFIX>_ESCAPE_TIMEOUT_MS`, `<PREFIX>_NO_MOUSE`, `<PREFIX>_NO_ALT_SCREEN`
    pub fn from_env(prefix: &str) -> Self {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(&format!("{}_ESCAPE_TIMEOUT_MS", prefix)) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.escape_timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!("ignoring invalid {}_ESCAPE_TIMEOUT_MS={:?}", prefix, raw),
            }
        }
        if lookup(&format!("{}_NO_MOUSE", prefix)).is_some_and(|v| is_truthy(&v)) {
            config.mouse = false;
        }
        if lookup(&format!("{}_NO_ALT_SCREEN", prefix)).is_some_and(|v| is_truthy(&v)) {
            config.alternate_screen = false;
        }

        config
    }

    pub fn with_escape_timeout(mut self, timeout: Duration) -> Self {
        self.escape_timeout = timeout;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = SessionConfig::from_lookup("SCAFFOLD", lookup(&[]));
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = SessionConfig::from_lookup(
            "SCAFFOLD",
            lookup(&[
                ("SCAFFOLD_ESCAPE_TIMEOUT_MS", "120"),
                ("SCAFFOLD_NO_MOUSE", "1"),
                ("SCAFFOLD_NO_ALT_SCREEN", "false"),
            ]),
        );
        assert_eq!(config.escape_timeout, Duration::from_millis(120));
        assert!(!config.mouse);
        assert!(config.alternate_screen);
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let config =
            SessionConfig::from_lookup("APP", lookup(&[("APP_ESCAPE_TIMEOUT_MS", "soon")]));
        assert_eq!(config.escape_timeout, DEFAULT_ESCAPE_TIMEOUT);
    }
}
