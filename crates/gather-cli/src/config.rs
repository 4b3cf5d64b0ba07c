use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use gather_core::models::GenerationConfig;
use serde::{Deserialize, Serialize};

/// Settings read from `gather.toml`, overridden by `GATHER_*` variables.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding all site data
    pub database_path: String,
    /// Timezone for series and events created without one (IANA name)
    pub default_timezone: String,
    /// How many days ahead the nightly refresh keeps generated
    pub lookahead_days: u32,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            database_path: "gather.db".to_string(),
            default_timezone: generation.default_timezone,
            lookahead_days: generation.lookahead_days,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("gather.toml"))
            .merge(Env::prefixed("GATHER_"))
            .extract()
    }

    /// Like [`Config::new`], but unreadable settings fall back to the
    /// defaults. The error is handed back so it can be logged once tracing
    /// is installed.
    pub fn load() -> (Self, Option<figment::Error>) {
        match Self::new() {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            lookahead_days: self.lookahead_days,
            default_timezone: self.default_timezone.clone(),
        }
    }
}
