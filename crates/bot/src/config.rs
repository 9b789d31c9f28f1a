use std::collections::HashSet;
use std::net::SocketAddr;

use lightdesk_core::naming::FolderLayout;
use lightdesk_core::types::UserId;

use crate::error::ConfigError;

/// Bot configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Users allowed into the admin menu.
    pub admin_ids: HashSet<UserId>,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Yandex Disk OAuth token.
    pub yandex_token: String,
    /// Remote folder layout (root, inbox, shared files).
    pub folders: FolderLayout,
    /// Bind address of the health endpoint.
    pub health_addr: SocketAddr,
    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default          |
    /// |---------------------|------------------|
    /// | `BOT_TOKEN`         | required         |
    /// | `ADMIN_IDS`         | required         |
    /// | `DATABASE_URL`      | required         |
    /// | `YANDEX_TOKEN`      | required         |
    /// | `YANDEX_ROOT`       | `Festival`       |
    /// | `YANDEX_INBOX`      | `INBOX`          |
    /// | `YANDEX_LOCAL`      | `Shared files`   |
    /// | `HEALTH_ADDR`       | `0.0.0.0:8080`   |
    /// | `POLL_TIMEOUT_SECS` | `30`             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bot_token = required("BOT_TOKEN")?;
        let admin_ids = parse_admin_ids(&required("ADMIN_IDS")?)?;
        let database_url = required("DATABASE_URL")?;
        let yandex_token = required("YANDEX_TOKEN")?;

        let folders = FolderLayout::new(
            or_default("YANDEX_ROOT", "Festival"),
            or_default("YANDEX_INBOX", "INBOX"),
            or_default("YANDEX_LOCAL", "Shared files"),
        );

        let health_addr = or_default("HEALTH_ADDR", "0.0.0.0:8080")
            .parse()
            .map_err(|_| ConfigError::Invalid("HEALTH_ADDR"))?;

        let poll_timeout_secs = or_default("POLL_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| ConfigError::Invalid("POLL_TIMEOUT_SECS"))?;

        Ok(Self {
            bot_token,
            admin_ids,
            database_url,
            yandex_token,
            folders,
            health_addr,
            poll_timeout_secs,
        })
    }
}

fn parse_admin_ids(raw: &str) -> Result<HashSet<UserId>, ConfigError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<UserId>().map_err(|_| ConfigError::Invalid("ADMIN_IDS")))
        .collect::<Result<HashSet<_>, _>>()?;
    if ids.is_empty() {
        return Err(ConfigError::Missing("ADMIN_IDS"));
    }
    Ok(ids)
}
