//! Client configuration read from the environment.
//!
//! | variable               | default                          |
//! |------------------------|----------------------------------|
//! | `EVMARKET_API_BASE`    | `http://localhost:8080`          |
//! | `EVMARKET_PAGE_SIZE`   | `10`                             |
//! | `EVMARKET_SESSION_FILE`| `$HOME/.evmarket/session.json`   |

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} has the wrong format")]
    WrongFormat(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    pub page_size: u32,
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            session_file: default_session_file(None),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base = lookup("EVMARKET_API_BASE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let page_size = match lookup("EVMARKET_PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::WrongFormat("EVMARKET_PAGE_SIZE")),
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let session_file = lookup("EVMARKET_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_session_file(lookup("HOME")));

        Ok(Self {
            api_base,
            page_size,
            session_file,
        })
    }
}

fn default_session_file(home: Option<String>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(".evmarket").join("session.json"),
        None => PathBuf::from(".evmarket-session.json"),
    }
}
