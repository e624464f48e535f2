//! Configuration structures for call pacing.
//!
//! Waiters are configured in code through the builders below, or from TOML
//! through [`PacerConfig`]. The file-based configuration supports:
//! - Bundled defaults (include_str! from pacekeeper.toml)
//! - User overrides (./pacekeeper.toml or ~/.config/pacekeeper/pacekeeper.toml)
//! - Automatic merging with user values taking precedence
//!
//! Values are kept as written (limits as signed integers) and normalized
//! once when a waiter is built, so a negative or zero limit simply means
//! "no limit" instead of a load error.

use crate::ResetUnit;
use config::{Config, File, FileFormat};
use pacekeeper_error::{ConfigError, PacekeeperError, PacekeeperResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default name of the header carrying the window's call limit.
pub const DEFAULT_LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Default name of the header carrying the calls left in the window.
pub const DEFAULT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Default name of the header carrying the reset value.
pub const DEFAULT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Settings for a [`ManualWaiter`](crate::ManualWaiter).
///
/// # Example
///
/// ```toml
/// [manual]
/// minutely_limit = 5
/// hourly_limit = 10
/// delay_ms = 250
/// ```
///
/// ```
/// use pacekeeper_rate_limit::ManualLimitConfig;
///
/// let config = ManualLimitConfig::builder()
///     .minutely_limit(5)
///     .hourly_limit(10)
///     .build();
/// assert_eq!(*config.minutely_limit(), Some(5));
/// assert!(!config.test_mode());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, derive_getters::Getters,
)]
#[serde(default, deny_unknown_fields)]
pub struct ManualLimitConfig {
    /// Calls allowed per clock minute (non-positive or absent = unbounded).
    minutely_limit: Option<i64>,

    /// Calls allowed per clock hour (non-positive or absent = unbounded).
    hourly_limit: Option<i64>,

    /// Fixed pause before every admitted call, in milliseconds.
    delay_ms: Option<i64>,

    /// Cap every wait at a couple of seconds.
    #[getter(skip)]
    test_mode: bool,
}

impl ManualLimitConfig {
    /// Creates a new builder.
    pub fn builder() -> ManualLimitConfigBuilder {
        ManualLimitConfigBuilder::default()
    }

    /// Starts a builder from these settings, for layering overrides.
    pub fn to_builder(&self) -> ManualLimitConfigBuilder {
        ManualLimitConfigBuilder {
            config: self.clone(),
        }
    }

    /// Whether waits are capped for fast test runs.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }
}

/// Builder for [`ManualLimitConfig`].
#[derive(Debug, Default)]
pub struct ManualLimitConfigBuilder {
    config: ManualLimitConfig,
}

impl ManualLimitConfigBuilder {
    /// Sets the per-minute call limit.
    pub fn minutely_limit(mut self, value: i64) -> Self {
        self.config.minutely_limit = Some(value);
        self
    }

    /// Sets the per-hour call limit.
    pub fn hourly_limit(mut self, value: i64) -> Self {
        self.config.hourly_limit = Some(value);
        self
    }

    /// Sets the fixed inter-call delay in milliseconds.
    pub fn delay_ms(mut self, value: i64) -> Self {
        self.config.delay_ms = Some(value);
        self
    }

    /// Enables or disables test mode.
    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.config.test_mode = enabled;
        self
    }

    /// Builds the `ManualLimitConfig`.
    pub fn build(self) -> ManualLimitConfig {
        self.config
    }
}

/// Settings for a [`HeaderWaiter`](crate::HeaderWaiter).
///
/// # Example
///
/// ```toml
/// [headers]
/// limit_header = "x-rate-limit-limit"
/// reset_unit = "unix-ms"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderLimitConfig {
    /// Header holding the call limit for the current window.
    limit_header: String,

    /// Header holding the calls left in the current window.
    remaining_header: String,

    /// Header holding the reset value.
    reset_header: String,

    /// How to read the reset value.
    reset_unit: ResetUnit,

    /// Cap every wait at a couple of seconds.
    #[getter(skip)]
    test_mode: bool,
}

impl Default for HeaderLimitConfig {
    fn default() -> Self {
        Self {
            limit_header: DEFAULT_LIMIT_HEADER.to_string(),
            remaining_header: DEFAULT_REMAINING_HEADER.to_string(),
            reset_header: DEFAULT_RESET_HEADER.to_string(),
            reset_unit: ResetUnit::default(),
            test_mode: false,
        }
    }
}

impl HeaderLimitConfig {
    /// Creates a new builder.
    pub fn builder() -> HeaderLimitConfigBuilder {
        HeaderLimitConfigBuilder::default()
    }

    /// Starts a builder from these settings, for layering overrides.
    pub fn to_builder(&self) -> HeaderLimitConfigBuilder {
        HeaderLimitConfigBuilder {
            config: self.clone(),
        }
    }

    /// Whether waits are capped for fast test runs.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Replace blank header names with the conventional defaults.
    pub(crate) fn normalized(mut self) -> Self {
        fn fallback(name: &mut String, default: &str) {
            if name.trim().is_empty() {
                *name = default.to_string();
            }
        }
        fallback(&mut self.limit_header, DEFAULT_LIMIT_HEADER);
        fallback(&mut self.remaining_header, DEFAULT_REMAINING_HEADER);
        fallback(&mut self.reset_header, DEFAULT_RESET_HEADER);
        self
    }
}

/// Builder for [`HeaderLimitConfig`].
#[derive(Debug, Default)]
pub struct HeaderLimitConfigBuilder {
    config: HeaderLimitConfig,
}

impl HeaderLimitConfigBuilder {
    /// Sets the limit header name.
    pub fn limit_header(mut self, name: impl Into<String>) -> Self {
        self.config.limit_header = name.into();
        self
    }

    /// Sets the remaining header name.
    pub fn remaining_header(mut self, name: impl Into<String>) -> Self {
        self.config.remaining_header = name.into();
        self
    }

    /// Sets the reset header name.
    pub fn reset_header(mut self, name: impl Into<String>) -> Self {
        self.config.reset_header = name.into();
        self
    }

    /// Sets how the reset value is read.
    pub fn reset_unit(mut self, unit: ResetUnit) -> Self {
        self.config.reset_unit = unit;
        self
    }

    /// Enables or disables test mode.
    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.config.test_mode = enabled;
        self
    }

    /// Builds the `HeaderLimitConfig`.
    pub fn build(self) -> HeaderLimitConfig {
        self.config
    }
}

/// Top-level Pacekeeper configuration.
///
/// Loads waiter settings from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from pacekeeper.toml)
/// 2. User override (~/.config/pacekeeper/pacekeeper.toml, then ./pacekeeper.toml)
///
/// # Example
///
/// ```no_run
/// use pacekeeper_rate_limit::{ManualWaiter, PacerConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PacerConfig::load()?;
/// let waiter = ManualWaiter::new(config.manual.clone());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct PacerConfig {
    /// Manual-limit waiter settings
    #[serde(default)]
    pub manual: ManualLimitConfig,

    /// Header-driven waiter settings
    #[serde(default)]
    pub headers: HeaderLimitConfig,
}

impl PacerConfig {
    /// Load configuration from a specific file path.
    ///
    /// The format is inferred from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> PacekeeperResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                PacekeeperError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                PacekeeperError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML or does not match
    /// the configuration schema.
    pub fn from_toml_str(toml: &str) -> PacekeeperResult<Self> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| {
                PacekeeperError::from(ConfigError::new(format!(
                    "Failed to read configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                PacekeeperError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (pacekeeper.toml shipped with the library)
    /// 2. User config in home directory (~/.config/pacekeeper/pacekeeper.toml)
    /// 3. User config in current directory (./pacekeeper.toml)
    ///
    /// User config files are optional and will be silently skipped if not found.
    #[instrument]
    pub fn load() -> PacekeeperResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../pacekeeper.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/pacekeeper/pacekeeper.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("pacekeeper").required(false));

        builder
            .build()
            .map_err(|e| {
                PacekeeperError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                PacekeeperError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}
