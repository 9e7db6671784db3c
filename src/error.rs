//! Crate-wide error type.
//!
//! Everything here is a setup failure: asset, level or config problems
//! surface before the first frame is drawn.  Runtime hiccups such as a
//! failed camera read are handled where they happen and never become a
//! `GameError`.

use std::fmt;

#[derive(Debug)]
pub enum GameError {
    /// A sprite sheet, map or other named asset could not be found.
    AssetMissing(String),
    /// A map was found but its contents are unusable.
    LevelInvalid { map: String, reason: String },
    /// File I/O error
    Io(String),
    /// Config file could not be parsed
    Config(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::AssetMissing(name) => write!(f, "asset missing: {}", name),
            GameError::LevelInvalid { map, reason } => {
                write!(f, "level '{}' is invalid: {}", map, reason)
            }
            GameError::Io(msg) => write!(f, "I/O error: {}", msg),
            GameError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for GameError {}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        GameError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for GameError {
    fn from(e: serde_json::Error) -> Self {
        GameError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
