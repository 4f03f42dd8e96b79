//! Configuration for the soulreg binary

use serde::{Deserialize, Serialize};
use soulreg_service::{ServiceConfig, DEFAULT_EVENT_CAPACITY};
use soulreg_types::Address;

use crate::{CliResult, NetworkProfile};

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `SOULREG_LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "SOULREG";

/// First account of the local development chain.
const DEFAULT_OWNER: Address = Address::from_bytes([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79, 0xcf,
    0xff, 0xb9, 0x22, 0x66,
]);

/// Main registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Network profile key
    #[serde(default = "default_network")]
    pub network: String,

    /// Owner of the key, identity and report registries
    #[serde(default = "default_owner")]
    pub owner: Address,

    /// Poll admin; the owner when unset
    #[serde(default)]
    pub poll_admin: Option<Address>,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            owner: default_owner(),
            poll_admin: None,
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast capacity for live subscribers
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_network() -> String {
    "local".to_string()
}

fn default_owner() -> Address {
    DEFAULT_OWNER
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RegistryConfig {
    /// Load configuration: defaults, then the file at `path`, then
    /// `SOULREG_*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment when set.
    fn load_with_env(
        path: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&RegistryConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder.build()?.try_deserialize()
    }

    pub fn profile(&self) -> CliResult<NetworkProfile> {
        NetworkProfile::lookup(&self.network)
    }

    pub fn service_config(&self) -> ServiceConfig {
        let mut service = ServiceConfig::new(self.owner);
        service.poll_admin = self.poll_admin;
        service.event_capacity = self.events.capacity;
        service
    }
}
