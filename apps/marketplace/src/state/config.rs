//! # Configuration State
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags of the `lowlow` binary (database path only)
//! 2. Environment variables (`LOWLOW_*`)
//! 3. Defaults (this file)
//!
//! Read-only after initialization, so no mutex.

use std::path::PathBuf;

use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use lowlow_core::{
    Money, DEFAULT_ACCOUNT_BALANCE_TENGE, DEFAULT_AVATAR_MAX_BYTES, DEFAULT_CARD_BALANCE_TENGE,
};
use lowlow_db::legacy::ImportOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Shown in the UI header and logs.
    pub market_name: String,

    /// Explicit database file. `None` means the per-user data folder.
    pub database_path: Option<PathBuf>,

    /// Starting balance of a newly registered customer.
    pub default_balance: Money,

    /// Simulated balance of a newly added card.
    pub card_balance: Money,

    /// Larger inline avatars are dropped on save.
    pub avatar_max_bytes: usize,

    /// Lifetime of a password reset code.
    pub reset_ttl_minutes: i64,

    pub currency_symbol: String,

    /// 0 shows whole tenge, anything else shows tiyn too.
    pub currency_decimals: u8,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            market_name: "LowLow".to_string(),
            database_path: None,
            default_balance: Money::from_tenge(DEFAULT_ACCOUNT_BALANCE_TENGE),
            card_balance: Money::from_tenge(DEFAULT_CARD_BALANCE_TENGE),
            avatar_max_bytes: DEFAULT_AVATAR_MAX_BYTES,
            reset_ttl_minutes: 15,
            currency_symbol: "₸".to_string(),
            currency_decimals: 0,
        }
    }
}

/// Reads `name` and parses it, warning (not failing) on garbage.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}

impl ConfigState {
    /// Defaults overridden by environment variables.
    ///
    /// ## Environment Variables
    /// - `LOWLOW_DB_PATH`: database file
    /// - `LOWLOW_DEFAULT_BALANCE`: new customer balance, tenge
    /// - `LOWLOW_CARD_BALANCE`: new card balance, tenge
    /// - `LOWLOW_AVATAR_MAX_BYTES`: avatar limit
    /// - `LOWLOW_RESET_TTL_MINUTES`: reset code lifetime
    /// - `LOWLOW_MARKET_NAME`: display name
    pub fn from_env() -> Self {
        let mut config = ConfigState::default();

        if let Ok(path) = std::env::var("LOWLOW_DB_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Ok(name) = std::env::var("LOWLOW_MARKET_NAME") {
            config.market_name = name;
        }
        if let Some(tenge) = env_parse::<f64>("LOWLOW_DEFAULT_BALANCE") {
            config.default_balance = Money::from_decimal(tenge.max(0.0));
        }
        if let Some(tenge) = env_parse::<f64>("LOWLOW_CARD_BALANCE") {
            config.card_balance = Money::from_decimal(tenge.max(0.0));
        }
        if let Some(bytes) = env_parse::<usize>("LOWLOW_AVATAR_MAX_BYTES") {
            config.avatar_max_bytes = bytes;
        }
        if let Some(minutes) = env_parse::<i64>("LOWLOW_RESET_TTL_MINUTES") {
            config.reset_ttl_minutes = minutes.max(1);
        }

        config
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::minutes(self.reset_ttl_minutes)
    }

    /// Defaults for a legacy import, taken from this configuration.
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            default_balance: self.default_balance,
            card_balance: self.card_balance,
            avatar_max_bytes: self.avatar_max_bytes,
        }
    }

    /// The database file to open.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/kz.lowlow.store/lowlow.db`
    /// - **Windows**: `%APPDATA%\lowlow\store\data\lowlow.db`
    /// - **Linux**: `~/.local/share/store/lowlow.db`
    pub fn resolve_database_path(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let proj_dirs = ProjectDirs::from("kz", "lowlow", "store")
            .ok_or("Could not determine app data directory")?;
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("lowlow.db"))
    }

    /// Formats an amount for display, symbol last.
    ///
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_money(Money::from_tenge(2490)), "2490 ₸");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        let tiyn = amount.tiyn();
        let sign = if tiyn < 0 { "-" } else { "" };
        let whole = (tiyn / 100).abs();

        if self.currency_decimals == 0 {
            format!("{}{} {}", sign, whole, self.currency_symbol)
        } else {
            format!("{}{}.{:02} {}", sign, whole, (tiyn % 100).abs(), self.currency_symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money_whole_tenge() {
        let config = ConfigState::default();
        assert_eq!(config.format_money(Money::from_tenge(2490)), "2490 ₸");
        assert_eq!(config.format_money(Money::zero()), "0 ₸");
        assert_eq!(config.format_money(Money::from_tenge(-5)), "-5 ₸");
    }

    #[test]
    fn test_format_money_with_tiyn() {
        let config = ConfigState {
            currency_decimals: 2,
            ..Default::default()
        };
        assert_eq!(config.format_money(Money::from_major_minor(990, 50)), "990.50 ₸");
        assert_eq!(config.format_money(Money::from_major_minor(-12, 5)), "-12.05 ₸");
    }

    #[test]
    fn test_import_options_follow_config() {
        let config = ConfigState {
            card_balance: Money::from_tenge(7),
            avatar_max_bytes: 10,
            ..Default::default()
        };
        let options = config.import_options();
        assert_eq!(options.card_balance, Money::from_tenge(7));
        assert_eq!(options.avatar_max_bytes, 10);
        assert_eq!(options.default_balance, Money::from_tenge(DEFAULT_ACCOUNT_BALANCE_TENGE));
    }

    #[test]
    fn test_explicit_path_wins() {
        let config = ConfigState {
            database_path: Some(PathBuf::from("/tmp/x.db")),
            ..Default::default()
        };
        assert_eq!(config.resolve_database_path().unwrap(), PathBuf::from("/tmp/x.db"));
    }
}
