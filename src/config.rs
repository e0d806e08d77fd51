//! Feed and pipeline configuration.
//!
//! The source spreadsheets drifted on column names across deployments, so
//! URLs and column names are configuration rather than literals. Values come
//! from the environment (a `.env` file is loaded in main), falling back to
//! the stock deployment's exports.

pub const DEFAULT_SPEED_URL: &str =
    "https://docs.google.com/spreadsheets/d/1KZMz0UJmLzo4R-5uCe61OLcvt0b5LPvrOcABXYSXVFw/export?format=csv";
pub const DEFAULT_CROWD_URL: &str =
    "https://docs.google.com/spreadsheets/d/10YHVsMEsXq5a23Rjfk8NYfgKhIScL6fCbRKD9HCPYyg/export?format=csv";

/// One CSV feed: where to fetch it and which header cells carry the data.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub label: String,
    pub url: String,
    pub timestamp_column: String,
    pub value_column: String,
}

/// Both feeds of the dashboard.
#[derive(Debug, Clone)]
pub struct Settings {
    pub speed: FeedConfig,
    pub crowd: FeedConfig,
}

impl Settings {
    /// Reads settings from the environment with stock defaults.
    pub fn from_env() -> Self {
        Settings {
            speed: FeedConfig {
                label: "speed".to_string(),
                url: env_or("SPEED_CSV_URL", DEFAULT_SPEED_URL),
                timestamp_column: env_or("SPEED_TIMESTAMP_COLUMN", "Timestamp (ESP1)"),
                value_column: env_or("SPEED_VALUE_COLUMN", "Final Speed"),
            },
            crowd: FeedConfig {
                label: "crowd".to_string(),
                url: env_or("CROWD_CSV_URL", DEFAULT_CROWD_URL),
                timestamp_column: env_or("CROWD_TIMESTAMP_COLUMN", "Timestamp"),
                value_column: env_or("CROWD_VALUE_COLUMN", "Count"),
            },
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
