//! Service configuration, read from the environment (and `.env`).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use crate::map::{MapConfig, DEFAULT_ATTRIBUTION, DEFAULT_TILE_URL};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// JSON array of restaurants imported on startup
    pub seed_file: Option<PathBuf>,
    pub allowed_origin: String,
    pub image_base_url: String,
    pub map: MapConfig,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let map = MapConfig {
            tile_url: string("MAP_TILE_URL", DEFAULT_TILE_URL),
            access_token: string("MAPBOX_TOKEN", ""),
            tile_id: string("MAP_TILE_ID", "mapbox.streets"),
            attribution: string("MAP_ATTRIBUTION", DEFAULT_ATTRIBUTION),
            max_zoom: parse(&lookup, "MAP_MAX_ZOOM", 18)?,
            zoom: parse(&lookup, "MAP_ZOOM", 16)?,
        };

        Ok(Self {
            bind_addr: parse(&lookup, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?,
            database_url: string("DATABASE_URL", "sqlite:restaurants.db"),
            seed_file: lookup("SEED_FILE").map(PathBuf::from),
            allowed_origin: string("ALLOWED_ORIGIN", "http://localhost:8080"),
            image_base_url: string("IMAGE_BASE_URL", "/img"),
            map,
            log_level: parse(&lookup, "LOG_LEVEL", tracing::Level::INFO)?,
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config(&[]).unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url, "sqlite:restaurants.db");
        assert!(config.seed_file.is_none());
        assert_eq!(config.image_base_url, "/img");
        assert_eq!(config.log_level, tracing::Level::INFO);
        assert_eq!(config.map.zoom, 16);
        assert_eq!(config.map.max_zoom, 18);
        assert_eq!(config.map.tile_id, "mapbox.streets");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("BIND_ADDR", "0.0.0.0:3000"),
            ("MAPBOX_TOKEN", "pk.abc"),
            ("MAP_ZOOM", "12"),
            ("LOG_LEVEL", "debug"),
            ("SEED_FILE", "data/restaurants.json"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.map.access_token, "pk.abc");
        assert_eq!(config.map.zoom, 12);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.seed_file, Some(PathBuf::from("data/restaurants.json")));
    }

    #[test]
    fn test_malformed_values() {
        assert!(config(&[("MAP_MAX_ZOOM", "lots")]).is_err());
        assert!(config(&[("BIND_ADDR", "localhost")]).is_err());
    }
}
