use std::env;
use std::path::PathBuf;

use anyhow::Result;
use dotenvy::dotenv;
use secrecy::SecretString;

/// Name the bot treats as itself when filtering user events.
pub const DEFAULT_SELF_NAME: &str = "_ConnectBot";

/// Bot configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub server: String,
    pub username: String,
    pub password: Option<SecretString>,
    pub insecure: bool,
    pub certificate_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub channel_path: Vec<String>,
    pub default_connect_string: String,
    pub self_name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let certificate_file = non_empty("MUMBLE_CERT_FILE").map(PathBuf::from);
        // The key may live in the certificate file
        let key_file = non_empty("MUMBLE_KEY_FILE")
            .map(PathBuf::from)
            .or_else(|| certificate_file.clone());

        Ok(Self {
            server: non_empty("MUMBLE_SERVER").unwrap_or_else(|| "localhost:64738".to_string()),
            username: non_empty("MUMBLE_USERNAME").unwrap_or_else(|| "gumble-bot".to_string()),
            password: non_empty("MUMBLE_PASSWORD").map(SecretString::from),
            insecure: lookup("MUMBLE_INSECURE")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            certificate_file,
            key_file,
            channel_path: parse_channel_path(&lookup("MUMBLE_CHANNELS").unwrap_or_default()),
            default_connect_string: lookup("MUMBLE_DEFAULT_STRING").unwrap_or_default(),
            self_name: non_empty("MUMBLE_SELF_NAME")
                .unwrap_or_else(|| DEFAULT_SELF_NAME.to_string()),
        })
    }

    pub fn tls_options(&self) -> mumble::TlsOptions {
        mumble::TlsOptions {
            insecure: self.insecure,
            certificate_file: self.certificate_file.clone(),
            key_file: self.key_file.clone(),
        }
    }
}

/// Boolean flag parsing. Unrecognized values are false.
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

/// Comma separated channel names, e.g. `Games,Lobby`.
pub fn parse_channel_path(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
