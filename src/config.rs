use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEV_SECRET_KEY: &str = "a_very_secret_key_for_dev";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub spreadsheet_path: PathBuf,
    pub document_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_body_size: usize,
    pub cookie_secure: bool,
    pub session_ttl: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_or("DATABASE_URL", "sqlite://users.db");
        let secret_key = env_or("FORMSINK_SECRET_KEY", DEV_SECRET_KEY);

        let host: IpAddr = env_or("FORMSINK_HOST", "127.0.0.1")
            .parse()
            .map_err(|e| format!("Invalid FORMSINK_HOST: {e}"))?;

        let port: u16 = env_or("FORMSINK_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid FORMSINK_PORT: {e}"))?;

        let spreadsheet_path = PathBuf::from(env_or("FORMSINK_SPREADSHEET_PATH", "users.xlsx"));
        let document_dir = PathBuf::from(env_or("FORMSINK_DOCUMENT_DIR", "pdfs"));
        let static_dir = PathBuf::from(env_or("FORMSINK_STATIC_DIR", "static"));

        let max_body_size: usize = env_or("FORMSINK_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid FORMSINK_MAX_BODY_SIZE: {e}"))?;

        let cookie_secure = parse_bool(&env_or("FORMSINK_COOKIE_SECURE", "false"))
            .ok_or_else(|| "Invalid FORMSINK_COOKIE_SECURE: expected true or false".to_string())?;

        let session_ttl_secs: u64 = env_or("FORMSINK_SESSION_TTL_SECS", "86400")
            .parse()
            .map_err(|e| format!("Invalid FORMSINK_SESSION_TTL_SECS: {e}"))?;

        let log_level = env_or("FORMSINK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            secret_key,
            host,
            port,
            spreadsheet_path,
            document_dir,
            static_dir,
            max_body_size,
            cookie_secure,
            session_ttl: Duration::from_secs(session_ttl_secs),
            log_level,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
