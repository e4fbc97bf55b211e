use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub invite: InviteSettings,
    pub quota: QuotaSettings,
    pub notification: NotificationSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    /// Public base URL used when rendering invite links.
    pub base_url: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InviteSettings {
    /// Max retries for invite-code collisions on insert.
    pub code_retry_max: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuotaSettings {
    pub max_members_per_org: u64,
    pub max_orgs_per_user: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    pub ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    pub auto_reset_enabled: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("DOORSIGN"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.base_url", "http://localhost:3000")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "doorsign")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "doorsign")?
            .set_default("invite.code_retry_max", 5)?
            .set_default("quota.max_members_per_org", 10)?
            .set_default("quota.max_orgs_per_user", 5)?
            .set_default("notification.ttl_hours", 24)?
            .set_default("scheduler.auto_reset_enabled", true)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
