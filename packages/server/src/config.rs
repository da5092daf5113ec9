//! Start-up configuration read from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use protected_area_database::db::DEFAULT_DATABASE_URL;
use protected_area_stats_models::ReferenceBaseline;

/// Server settings, read once at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// `PostgreSQL` connection URL (`DATABASE_URL`).
    pub database_url: String,
    /// Directory holding patch images (`IMAGE_DIR`).
    pub image_dir: PathBuf,
    /// Reference figures injected into yearly overviews
    /// (`PROTECTED_AREA_COUNT`, `PROTECTED_AREA_TOTAL_AREA`).
    pub baseline: ReferenceBaseline,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 9094,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            image_dir: PathBuf::from("./image"),
            baseline: ReferenceBaseline::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unset values take their
    /// defaults; unparsable numeric values are logged and also take their
    /// defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let protected_total_area = parse_or(
            &lookup,
            "PROTECTED_AREA_TOTAL_AREA",
            defaults.baseline.protected_total_area,
        );
        let protected_total_area = if protected_total_area.is_finite() && protected_total_area >= 0.0
        {
            protected_total_area
        } else {
            log::warn!("Ignoring non-finite or negative PROTECTED_AREA_TOTAL_AREA");
            defaults.baseline.protected_total_area
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_or(&lookup, "PORT", defaults.port),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            image_dir: lookup("IMAGE_DIR").map_or(defaults.image_dir, PathBuf::from),
            baseline: ReferenceBaseline {
                protected_count: parse_or(
                    &lookup,
                    "PROTECTED_AREA_COUNT",
                    defaults.baseline.protected_count,
                ),
                protected_total_area,
            },
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        log::warn!("Invalid value for {key}: {raw:?}, using default");
        default
    })
}
