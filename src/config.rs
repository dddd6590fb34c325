use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_SIZE_THRESHOLD_MM: i64 = 1_000;
const DEFAULT_MAX_PRICE: i64 = 1_000_000;
const DEFAULT_LOCAL_DELIVERY_DAYS: &str = "0-1";
const DEFAULT_OTHER_CITY_DELIVERY_DAYS: &str = "1-4";
const DEFAULT_ORDER_DELIVERY_DAYS: &str = "14-21";

/// How stock levels are presented to customers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDisplayMode {
    /// Availability is resolved against the customer's selected city.
    ByCity,
    /// Only the network-wide total matters.
    Total,
    /// Quantities are hidden; only an in-stock/under-order status shows.
    Hidden,
}

impl Default for StockDisplayMode {
    fn default() -> Self {
        StockDisplayMode::ByCity
    }
}

/// Tuning for the smart-search filter engine.
///
/// These used to live as module-level constants next to the filter code;
/// they are configuration now so catalog operators can adjust them without
/// a deploy.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Minimum parsed length (mm) for which dimension-based filtering
    /// engages. Smaller parsed numbers are treated as free text (model
    /// numbers and the like), not as a size request.
    #[serde(default = "default_size_threshold_mm")]
    #[validate(range(min = 0))]
    pub size_threshold_mm: i64,

    /// Upper price fence used when the caller supplies no maximum. A UI
    /// slider bound, not a domain limit.
    #[serde(default = "default_max_price")]
    #[validate(range(min = 1))]
    pub default_max_price: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            size_threshold_mm: default_size_threshold_mm(),
            default_max_price: default_max_price(),
        }
    }
}

/// Policy for availability resolution and stock display.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StockSettings {
    #[serde(default)]
    pub display_mode: StockDisplayMode,

    /// Embed the numeric count in the availability label. A marketing
    /// choice, not a correctness concern.
    #[serde(default)]
    pub show_quantity: bool,

    /// Delivery estimate when the item sits in the customer's own city.
    #[serde(default = "default_local_delivery_days")]
    pub local_delivery_days: String,

    /// Delivery estimate when the item ships from another city of the
    /// network.
    #[serde(default = "default_other_city_delivery_days")]
    pub other_city_delivery_days: String,

    /// Lead time the ordering flow quotes for a back-order. Availability
    /// itself reports no delivery estimate for unavailable items.
    #[serde(default = "default_order_delivery_days")]
    pub order_delivery_days: String,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            display_mode: StockDisplayMode::default(),
            show_quantity: false,
            local_delivery_days: default_local_delivery_days(),
            other_city_delivery_days: default_other_city_delivery_days(),
            order_delivery_days: default_order_delivery_days(),
        }
    }
}

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    #[validate]
    pub search: SearchConfig,

    #[serde(default)]
    #[validate]
    pub stock: StockSettings,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_size_threshold_mm() -> i64 {
    DEFAULT_SIZE_THRESHOLD_MM
}
fn default_max_price() -> i64 {
    DEFAULT_MAX_PRICE
}
fn default_local_delivery_days() -> String {
    DEFAULT_LOCAL_DELIVERY_DAYS.to_string()
}
fn default_other_city_delivery_days() -> String {
    DEFAULT_OTHER_CITY_DELIVERY_DAYS.to_string()
}
fn default_order_delivery_days() -> String {
    DEFAULT_ORDER_DELIVERY_DAYS.to_string()
}

impl AppConfig {
    /// Loads configuration from files and the environment.
    ///
    /// Layering, lowest priority first: `config/default.toml`, then
    /// `config/{RUN_ENV}.toml`, then `TRAILSTOCK_`-prefixed environment
    /// variables (`TRAILSTOCK_DATABASE_URL`,
    /// `TRAILSTOCK_STOCK__SHOW_QUANTITY`, ...).
    pub fn load() -> Result<Self, ConfigError> {
        let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let mut builder = Config::builder();

        let default_path = Path::new(CONFIG_DIR).join("default.toml");
        if default_path.exists() {
            builder = builder.add_source(File::from(default_path));
        }
        let env_path = Path::new(CONFIG_DIR).join(format!("{run_env}.toml"));
        if env_path.exists() {
            builder = builder.add_source(File::from(env_path));
        }

        builder = builder.add_source(Environment::with_prefix("TRAILSTOCK").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

        info!(environment = %config.environment, "Configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let search = SearchConfig::default();
        assert_eq!(search.size_threshold_mm, 1_000);
        assert_eq!(search.default_max_price, 1_000_000);

        let stock = StockSettings::default();
        assert_eq!(stock.display_mode, StockDisplayMode::ByCity);
        assert!(!stock.show_quantity);
        assert_eq!(stock.order_delivery_days, "14-21");
    }

    #[test]
    fn display_mode_parses_snake_case() {
        let mode: StockDisplayMode = serde_json::from_str("\"by_city\"").unwrap();
        assert_eq!(mode, StockDisplayMode::ByCity);
        let mode: StockDisplayMode = serde_json::from_str("\"hidden\"").unwrap();
        assert_eq!(mode, StockDisplayMode::Hidden);
    }
}
