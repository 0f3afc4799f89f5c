use std::path::PathBuf;
use std::str::FromStr;

fn parsed<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|s| s.trim().parse().ok())
}

/// Runtime settings, read from `HOTELBOOK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub currency: String,
    pub compact_threshold: u64,
    pub metrics_port: Option<u16>,
    pub payments_auto_confirm: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 5000,
            data_dir: PathBuf::from("./data"),
            jwt_secret: "hotelbook-dev-secret".into(),
            currency: "thb".into(),
            compact_threshold: 1000,
            metrics_port: None,
            payments_auto_confirm: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: get("HOTELBOOK_BIND").unwrap_or(defaults.bind),
            port: parsed(&get, "HOTELBOOK_PORT").unwrap_or(defaults.port),
            data_dir: get("HOTELBOOK_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            jwt_secret: get("HOTELBOOK_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            currency: get("HOTELBOOK_CURRENCY").unwrap_or(defaults.currency),
            compact_threshold: parsed(&get, "HOTELBOOK_COMPACT_THRESHOLD")
                .unwrap_or(defaults.compact_threshold),
            metrics_port: parsed(&get, "HOTELBOOK_METRICS_PORT"),
            payments_auto_confirm: get("HOTELBOOK_PAYMENTS_AUTO_CONFIRM")
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes")),
        }
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("hotelbook.wal")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// True while the built-in development secret is in use.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == Self::default().jwt_secret
    }
}
