use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ClinicDesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_MINUTES_PER_PATIENT: u32 = 15;
/// Upper bound for the per-patient consultation estimate (one day).
pub const MAX_MINUTES_PER_PATIENT: u32 = 24 * 60;
pub const DEFAULT_LOG_FILTER: &str = "clinicdesk=info,tower_http=info";

/// Get the application data directory
/// ~/ClinicDesk/ on all platforms. Falls back to the working directory when
/// no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(APP_NAME),
        None => PathBuf::from(APP_NAME),
    }
}

/// SQLite file inside a data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("clinicdesk.db")
}

/// Runtime configuration, read from `CLINICDESK_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    /// In-memory store seeded with sample records.
    pub demo: bool,
    pub minutes_per_patient: u32,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: app_data_dir(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            demo: false,
            minutes_per_patient: DEFAULT_MINUTES_PER_PATIENT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values keep the default; they
    /// go to stderr because the log filter itself comes from here.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = get("CLINICDESK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(bind) = get("CLINICDESK_BIND") {
            match bind.parse() {
                Ok(addr) => config.bind = addr,
                Err(_) => eprintln!("Ignoring CLINICDESK_BIND={bind}: not a socket address"),
            }
        }
        if let Some(demo) = get("CLINICDESK_DEMO") {
            config.demo = matches!(demo.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(minutes) = get("CLINICDESK_MINUTES_PER_PATIENT") {
            match minutes.parse::<u32>() {
                Ok(m) if (1..=MAX_MINUTES_PER_PATIENT).contains(&m) => config.minutes_per_patient = m,
                _ => eprintln!("Ignoring CLINICDESK_MINUTES_PER_PATIENT={minutes}"),
            }
        }
        if let Some(filter) = get("CLINICDESK_LOG") {
            config.log_filter = filter;
        }
        config
    }

    pub fn database_path(&self) -> PathBuf {
        database_path(&self.data_dir)
    }
}
