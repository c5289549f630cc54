use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Modifier keys held during a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Press phase a typing command listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPhase {
    KeyDown,
    KeyUp,
}

/// Raw keyboard input as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Lowercase key name (`"backspace"`, `"a"`, ...)
    pub key: String,
    pub modifiers: Modifiers,
    pub phase: KeyPhase,
}

impl KeyEvent {
    pub fn key_down(key: &str) -> Self {
        Self {
            key: canonical_key(key),
            modifiers: Modifiers::default(),
            phase: KeyPhase::KeyDown,
        }
    }

    pub fn key_up(key: &str) -> Self {
        Self {
            phase: KeyPhase::KeyUp,
            ..Self::key_down(key)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Result of triggering a typing command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The command changed the document; the host's native action must not run
    Handled,
    /// Nothing was done; the host's native action should run
    Deferred,
    /// A listener vetoed the default behaviour
    Vetoed { suppress_default: bool },
}

impl Outcome {
    /// Whether the host must suppress its native handling of the key
    pub fn suppresses_default(self) -> bool {
        match self {
            Outcome::Handled => true,
            Outcome::Deferred => false,
            Outcome::Vetoed { suppress_default } => suppress_default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HotkeyError {
    #[error("Empty hotkey")]
    Empty,
    #[error("Unknown modifier '{modifier}' in '{combo}'")]
    UnknownModifier { combo: String, modifier: String },
    #[error("Hotkey '{0}' has no key, only modifiers")]
    MissingKey(String),
}

/// A key combination such as `backspace` or `mod+shift+backspace`.
///
/// `mod` stands for the platform command key and is satisfied by either ctrl
/// or meta (but not both).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    key: String,
    ctrl: bool,
    alt: bool,
    shift: bool,
    meta: bool,
    command: bool,
}

impl Hotkey {
    pub fn parse(combo: &str) -> Result<Self, HotkeyError> {
        let trimmed = combo.trim();
        if trimmed.is_empty() {
            return Err(HotkeyError::Empty);
        }
        let mut parts: Vec<String> = trimmed
            .split('+')
            .map(|p| p.trim().to_ascii_lowercase())
            .collect();
        let key = parts.pop().filter(|k| !k.is_empty());
        let Some(key) = key else {
            return Err(HotkeyError::MissingKey(trimmed.to_string()));
        };

        let mut hotkey = Hotkey::plain(&key);
        for part in parts {
            match part.as_str() {
                "ctrl" | "control" => hotkey.ctrl = true,
                "alt" | "option" => hotkey.alt = true,
                "shift" => hotkey.shift = true,
                "meta" | "cmd" | "command" | "super" => hotkey.meta = true,
                "mod" => hotkey.command = true,
                _ => {
                    return Err(HotkeyError::UnknownModifier {
                        combo: trimmed.to_string(),
                        modifier: part,
                    });
                }
            }
        }
        if is_modifier_name(&hotkey.key) {
            return Err(HotkeyError::MissingKey(trimmed.to_string()));
        }
        Ok(hotkey)
    }

    /// A key without modifiers
    pub fn plain(key: &str) -> Self {
        Hotkey {
            key: canonical_key(key),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
            command: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the event is exactly this combination
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let m = event.modifiers;
        if event.key != self.key || m.alt != self.alt || m.shift != self.shift {
            return false;
        }
        if self.command {
            m.ctrl != m.meta
        } else {
            m.ctrl == self.ctrl && m.meta == self.meta
        }
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hotkey::parse(s)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.command, "mod"),
            (self.ctrl, "ctrl"),
            (self.alt, "alt"),
            (self.shift, "shift"),
            (self.meta, "meta"),
        ];
        for (set, name) in flags {
            if set {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}

fn canonical_key(key: &str) -> String {
    let lower = key.trim().to_ascii_lowercase();
    match lower.as_str() {
        "del" => "delete".to_string(),
        "esc" => "escape".to_string(),
        "return" => "enter".to_string(),
        "bksp" => "backspace".to_string(),
        _ => lower,
    }
}

fn is_modifier_name(key: &str) -> bool {
    matches!(
        key,
        "ctrl" | "control" | "alt" | "option" | "shift" | "meta" | "cmd" | "command" | "mod"
    )
}
