use std::path::Path;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::model::ModelId;
use crate::session::SessionOptions;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Backend API root, e.g. http://localhost:8000/api
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Model selected for new sessions
    #[arg(long, env = "DEFAULT_MODEL")]
    pub default_model: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Largest multipart upload accepted from the browser.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Per-request timeout; `0` disables it.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub title: String,
    pub default_model: ModelId,
    pub clear_uploads_after_ingest: bool,
    pub session_idle_secs: u64,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl ChatConfig {
    /// Options every new session starts with.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            model: self.default_model,
            clear_uploads_after_ingest: self.clear_uploads_after_ingest,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Layer, lowest priority first: defaults, config file, `KA_` env vars,
    /// CLI flags (and their env fallbacks).
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("backend.base_url", "http://localhost:8000/api")?
            .set_default("backend.timeout_secs", 300)?
            .set_default("chat.title", "Knowledge Assistant")?
            .set_default("chat.default_model", ModelId::default().as_str())?
            .set_default("chat.clear_uploads_after_ingest", false)?
            .set_default("chat.session_idle_secs", 30 * 60)?
            .set_default("logging.json", false)?;

        match &cli.config {
            Some(path) => builder = builder.add_source(File::with_name(path)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        // E.g. KA_BACKEND__BASE_URL=http://backend:8000/api
        builder = builder.add_source(
            Environment::with_prefix("KA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(model) = cli.default_model {
            builder = builder.set_override("chat.default_model", model)?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("logging.json", json)?;
        }

        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "backend.base_url cannot be empty".to_string(),
            ));
        }
        if self.chat.session_idle_secs == 0 {
            return Err(config::ConfigError::Message(
                "chat.session_idle_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
