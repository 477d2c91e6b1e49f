//! Configuration loading.
//!
//! Everything comes from the environment (optionally seeded from `.env`),
//! with defaults for every value.
//!
//! Precedence: env vars > defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::whatsapp::client::DEFAULT_BRIDGE_URL;
use crate::whatsapp::session::ConnectRetry;

/// Default downstream webhook.
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5000/api/webhook/whatsmeow";

/// Default shared secret. Deployments are expected to override it.
pub const DEFAULT_WEBHOOK_SECRET: &str = "default-secret";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8001;

/// Default storage directory for the QR cache.
pub const DEFAULT_STORAGE_DIR: &str = "storages";

/// Default pause between connect attempts.
pub const DEFAULT_CONNECT_RETRY_DELAY_MS: u64 = 2000;

/// A problem found while loading configuration.
///
/// Loading happens before logging is set up, so these are collected and
/// reported by [`GatewayConfig::report_warnings`] once a subscriber exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// An override could not be parsed; the default was kept.
    InvalidValue {
        /// Environment variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A `.env` file exists but could not be read.
    UnreadableDotenv(String),
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Downstream webhook. `None` disables forwarding.
    pub webhook_url: Option<String>,
    /// Value of the `X-Webhook-Secret` header.
    pub webhook_secret: String,
    /// HTTP listen port.
    pub port: u16,
    /// Base URL of the WhatsApp bridge sidecar.
    pub bridge_url: String,
    /// Directory holding the QR cache.
    pub storage_dir: PathBuf,
    /// Extra initial connect attempts. Zero makes the first failure fatal.
    pub connect_retries: u32,
    /// Pause between connect attempts, in milliseconds.
    pub connect_retry_delay_ms: u64,
    /// Forward receipt events to the webhook as well as logging them.
    pub forward_receipts: bool,
    /// Directory for rotated JSON logs. Console-only when unset.
    pub log_dir: Option<PathBuf>,
    /// Problems found while loading, in discovery order.
    pub warnings: Vec<ConfigWarning>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            webhook_url: Some(DEFAULT_WEBHOOK_URL.to_owned()),
            webhook_secret: DEFAULT_WEBHOOK_SECRET.to_owned(),
            port: DEFAULT_PORT,
            bridge_url: DEFAULT_BRIDGE_URL.to_owned(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            connect_retries: 0,
            connect_retry_delay_ms: DEFAULT_CONNECT_RETRY_DELAY_MS,
            forward_receipts: false,
            log_dir: None,
            warnings: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration: `.env` (if present), then process environment over
    /// defaults.
    pub fn load() -> Self {
        let dotenv = dotenvy::dotenv();
        let mut config = Self::from_env(|key| std::env::var(key).ok());
        if let Err(e) = dotenv {
            if !e.not_found() {
                config.warnings.push(ConfigWarning::UnreadableDotenv(e.to_string()));
            }
        }
        config
    }

    /// Build from defaults plus the given env resolver (for testing).
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_overrides(env);
        config
    }

    /// Apply environment overrides.
    ///
    /// Takes a resolver function for testability (avoids `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Webhook. An explicitly empty URL disables forwarding.
        if let Some(v) = env("NEXTJS_WEBHOOK_URL") {
            let v = v.trim();
            self.webhook_url = (!v.is_empty()).then(|| v.to_owned());
        }
        if let Some(v) = non_empty(env("WEBHOOK_SECRET")) {
            self.webhook_secret = v;
        }
        if let Some(v) = env("FORWARD_RECEIPTS") {
            self.warnings.extend(parse_into(
                &mut self.forward_receipts,
                "FORWARD_RECEIPTS",
                &v,
                parse_bool,
            ));
        }

        // Server.
        if let Some(v) = non_empty(env("PORT")) {
            self.warnings
                .extend(parse_into(&mut self.port, "PORT", &v, |s| s.parse().ok()));
        }

        // Bridge.
        if let Some(v) = non_empty(env("BRIDGE_URL")) {
            self.bridge_url = v;
        }
        if let Some(v) = non_empty(env("CONNECT_RETRIES")) {
            self.warnings.extend(parse_into(
                &mut self.connect_retries,
                "CONNECT_RETRIES",
                &v,
                |s| s.parse().ok(),
            ));
        }
        if let Some(v) = non_empty(env("CONNECT_RETRY_DELAY_MS")) {
            self.warnings.extend(parse_into(
                &mut self.connect_retry_delay_ms,
                "CONNECT_RETRY_DELAY_MS",
                &v,
                |s| s.parse().ok(),
            ));
        }

        // Paths.
        if let Some(v) = non_empty(env("STORAGE_DIR")) {
            self.storage_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty(env("LOG_DIR")) {
            self.log_dir = Some(PathBuf::from(v));
        }
    }

    /// Log every problem found while loading. Call after logging is set up.
    pub fn report_warnings(&self) {
        for warning in &self.warnings {
            match warning {
                ConfigWarning::InvalidValue { var, value } => {
                    tracing::warn!(var, value = %value, "ignoring invalid env override");
                }
                ConfigWarning::UnreadableDotenv(error) => {
                    tracing::warn!(%error, "ignoring unreadable .env file");
                }
            }
        }
    }

    /// Initial connect retry policy.
    pub fn connect_retry(&self) -> ConnectRetry {
        ConnectRetry {
            retries: self.connect_retries,
            delay: Duration::from_millis(self.connect_retry_delay_ms),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_into<T>(
    slot: &mut T,
    var: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<ConfigWarning> {
    match parse(value.trim()) {
        Some(parsed) => {
            *slot = parsed;
            None
        }
        None => Some(ConfigWarning::InvalidValue {
            var,
            value: value.to_owned(),
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
