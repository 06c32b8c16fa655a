//! Key names and normalization
//!
//! Callbacks are registered by name ("space", "p", "esc"), so every source
//! of key events, whether crossterm codes or user-supplied strings, is
//! funneled through the same normalization.

use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};

/// Canonical name of the space bar
pub const SPACE: &str = "space";

/// Edge of a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEventType {
    Press,
    Release,
}

impl std::fmt::Display for KeyEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyEventType::Press => write!(f, "press"),
            KeyEventType::Release => write!(f, "release"),
        }
    }
}

/// Normalize a user-facing key name
///
/// `" "`, `"Key.space"` and `"SPACE"` all become `"space"`.
pub fn normalize_key(raw: &str) -> String {
    if raw == " " {
        return SPACE.to_string();
    }

    let lower = raw.trim().to_lowercase();
    let name = lower.strip_prefix("key.").unwrap_or(&lower);

    match name {
        "spacebar" => SPACE,
        "return" => "enter",
        "escape" => "esc",
        "del" => "delete",
        other => other,
    }
    .to_string()
}

/// Map a crossterm key to its normalized name
///
/// Control chords are reported as `ctrl+<key>`. Keys the CLI never binds
/// (media keys, bare modifiers) yield `None`.
pub fn key_name(code: KeyCode, modifiers: KeyModifiers) -> Option<String> {
    let base = match code {
        KeyCode::Char(' ') => SPACE.to_string(),
        KeyCode::Char(c) => c.to_lowercase().to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => return None,
    };

    if modifiers.contains(KeyModifiers::CONTROL) {
        Some(format!("ctrl+{}", base))
    } else {
        Some(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_aliases() {
        assert_eq!(normalize_key(" "), "space");
        assert_eq!(normalize_key("Key.space"), "space");
        assert_eq!(normalize_key("SPACE"), "space");
        assert_eq!(normalize_key("spacebar"), "space");
    }

    #[test]
    fn test_named_aliases() {
        assert_eq!(normalize_key("Return"), "enter");
        assert_eq!(normalize_key("Key.esc"), "esc");
        assert_eq!(normalize_key("escape"), "esc");
        assert_eq!(normalize_key("P"), "p");
    }

    #[test]
    fn test_crossterm_codes() {
        assert_eq!(
            key_name(KeyCode::Char(' '), KeyModifiers::NONE).as_deref(),
            Some("space")
        );
        assert_eq!(
            key_name(KeyCode::Char('P'), KeyModifiers::SHIFT).as_deref(),
            Some("p")
        );
        assert_eq!(
            key_name(KeyCode::Char('c'), KeyModifiers::CONTROL).as_deref(),
            Some("ctrl+c")
        );
        assert_eq!(key_name(KeyCode::Esc, KeyModifiers::NONE).as_deref(), Some("esc"));
        assert_eq!(key_name(KeyCode::CapsLock, KeyModifiers::NONE), None);
    }

    #[test]
    fn test_crossterm_names_survive_normalization() {
        for code in [KeyCode::Char(' '), KeyCode::Enter, KeyCode::Esc, KeyCode::F(5)] {
            let name = key_name(code, KeyModifiers::NONE).unwrap();
            assert_eq!(normalize_key(&name), name);
        }
    }
}
