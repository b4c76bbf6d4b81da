pub const DEFAULT_CONFIG_PATH: &str = "config/switchboard.toml";
pub const CONFIG_PATH: &str = DEFAULT_CONFIG_PATH;
pub const DEFAULT_ENV_PATH: &str = "config/.env";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_LISTING_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SYSTEM_PROMPT: &str = "Answer the following question:";
