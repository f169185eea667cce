//! Key tokens and the key-press collaborator.
//!
//! Without the `keyboard` feature the bundled presser only validates and
//! logs; with it, presses are injected into the OS through `enigo`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyToken {
    /// `a`-`z` or `0`-`9`.
    Char(char),
    Enter,
    Space,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for KeyToken {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let lower = token.trim().to_ascii_lowercase();
        let key = match lower.as_str() {
            "enter" => KeyToken::Enter,
            "space" => KeyToken::Space,
            "esc" => KeyToken::Escape,
            "up" => KeyToken::Up,
            "down" => KeyToken::Down,
            "left" => KeyToken::Left,
            "right" => KeyToken::Right,
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_lowercase() || c.is_ascii_digit() => KeyToken::Char(c),
                    _ => return Err(Error::UnsupportedKey(token.to_string())),
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char(c) => write!(f, "{}", c),
            KeyToken::Enter => f.write_str("enter"),
            KeyToken::Space => f.write_str("space"),
            KeyToken::Escape => f.write_str("esc"),
            KeyToken::Up => f.write_str("up"),
            KeyToken::Down => f.write_str("down"),
            KeyToken::Left => f.write_str("left"),
            KeyToken::Right => f.write_str("right"),
        }
    }
}

/// Simulates a single press-and-release.
#[async_trait]
pub trait KeyPresser: Send + Sync {
    async fn tap(&self, key: KeyToken) -> Result<(), Error>;
}

/// Accepts every valid token and only records it in the log.
#[derive(Debug, Default, Clone)]
pub struct LoggingKeyPresser;

#[async_trait]
impl KeyPresser for LoggingKeyPresser {
    async fn tap(&self, key: KeyToken) -> Result<(), Error> {
        info!("Key press '{}' (keyboard injection not compiled in)", key);
        Ok(())
    }
}

#[cfg(feature = "keyboard")]
mod injected {
    use async_trait::async_trait;
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    use super::{KeyPresser, KeyToken};
    use crate::Error;

    fn to_enigo(key: KeyToken) -> Key {
        match key {
            KeyToken::Char(c) => Key::Unicode(c),
            KeyToken::Enter => Key::Return,
            KeyToken::Space => Key::Space,
            KeyToken::Escape => Key::Escape,
            KeyToken::Up => Key::UpArrow,
            KeyToken::Down => Key::DownArrow,
            KeyToken::Left => Key::LeftArrow,
            KeyToken::Right => Key::RightArrow,
        }
    }

    /// Injects real key events. Each tap opens its own connection on a
    /// blocking thread; `Enigo` is not `Send` on every platform.
    #[derive(Debug, Default, Clone)]
    pub struct EnigoKeyPresser;

    #[async_trait]
    impl KeyPresser for EnigoKeyPresser {
        async fn tap(&self, key: KeyToken) -> Result<(), Error> {
            tokio::task::spawn_blocking(move || {
                let mut enigo =
                    Enigo::new(&Settings::default()).map_err(|e| Error::KeySimulation(e.to_string()))?;
                enigo
                    .key(to_enigo(key), Direction::Click)
                    .map_err(|e| Error::KeySimulation(e.to_string()))
            })
            .await
            .map_err(|e| Error::KeySimulation(e.to_string()))?
        }
    }
}

#[cfg(feature = "keyboard")]
pub use injected::EnigoKeyPresser;

/// The presser matching the enabled features.
pub fn default_key_presser() -> Arc<dyn KeyPresser> {
    #[cfg(feature = "keyboard")]
    {
        Arc::new(EnigoKeyPresser)
    }
    #[cfg(not(feature = "keyboard"))]
    {
        Arc::new(LoggingKeyPresser)
    }
}
