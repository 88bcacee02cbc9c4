use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::error::ClientError;

/// Everything the client needs to know about its deployment, resolved once at
/// startup instead of being baked into the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Initial descending sort column of the restaurant table.
    pub restaurant_sort_column: usize,
    /// Initial descending sort column of the menu table.
    pub menu_sort_column: usize,
    pub page_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7777,
            restaurant_sort_column: 1,
            menu_sort_column: 2,
            page_length: 10,
        }
    }
}

impl ClientConfig {
    /// Reads `.env` if present, then the `MENU_BROWSER_*` variables.
    pub fn load() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            host: lookup("MENU_BROWSER_HOST").unwrap_or_else(|| {
                info!("MENU_BROWSER_HOST not set, using default: {}", defaults.host);
                defaults.host.clone()
            }),
            port: try_load(&lookup, "MENU_BROWSER_PORT", defaults.port)?,
            restaurant_sort_column: try_load(
                &lookup,
                "MENU_BROWSER_RESTAURANT_SORT_COLUMN",
                defaults.restaurant_sort_column,
            )?,
            menu_sort_column: try_load(
                &lookup,
                "MENU_BROWSER_MENU_SORT_COLUMN",
                defaults.menu_sort_column,
            )?,
            page_length: try_load(&lookup, "MENU_BROWSER_PAGE_LENGTH", defaults.page_length)?,
        };

        if config.page_length == 0 {
            return Err(ClientError::Config {
                key: "MENU_BROWSER_PAGE_LENGTH",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ClientError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };

    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ClientError::Config {
            key,
            reason: format!("{raw:?}: {e}"),
        }
    })
}
