use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Idle time after which the browser session record is dropped.
    #[serde(default = "default_session_idle_hours")]
    pub session_idle_hours: i64,
    /// Mark the session cookie `Secure` (requires HTTPS in front of the console).
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl ServerSettings {
    /// Idle timeout shared by the session record and its credential slot.
    pub fn session_idle(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_idle_hours.max(0) as u64 * 3600)
    }
}

fn default_session_idle_hours() -> i64 {
    24
}

fn default_static_dir() -> String {
    "admin-console/static".to_string()
}

/// Location of the remote sports API and its authentication endpoints.
#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// API origin every request path is resolved against.
    pub base_url: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_profile_path")]
    pub profile_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_path: default_token_path(),
            refresh_path: default_refresh_path(),
            profile_path: default_profile_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_token_path() -> String {
    "/api/token/".to_string()
}

fn default_refresh_path() -> String {
    "/api/token/refresh/".to_string()
}

fn default_profile_path() -> String {
    "/api/users/profile/".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector; spans are only exported when this is set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Support running from the workspace root or from inside the crate
    let configuration_directory = if base_path.ends_with("admin-console") {
        base_path.join("config")
    } else {
        base_path.join("admin-console").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
