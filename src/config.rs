use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub query: QueryLimits,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Deserialize, Clone)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self { region: default_region() }
    }
}

fn default_region() -> String {
    "us-east-1".into()
}

/// Bounds applied to every cost query before it reaches the billing backend.
#[derive(Debug, Deserialize, Clone)]
pub struct QueryLimits {
    #[serde(default = "default_max_span_days")]
    pub max_span_days: i64,
    #[serde(default = "default_hourly_lookback_days")]
    pub hourly_lookback_days: i64,
    #[serde(default = "default_max_days_per_query")]
    pub max_days_per_query: i64,
    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: u32,
    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_span_days: default_max_span_days(),
            hourly_lookback_days: default_hourly_lookback_days(),
            max_days_per_query: default_max_days_per_query(),
            max_lookback_days: default_max_lookback_days(),
            backend_timeout_secs: default_backend_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_max_span_days() -> i64 {
    365
}

fn default_hourly_lookback_days() -> i64 {
    14
}

fn default_max_days_per_query() -> i64 {
    92
}

fn default_max_lookback_days() -> u32 {
    365
}

fn default_backend_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("COSTSCOPE").separator("__"))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        Ok(app_config)
    }
}
