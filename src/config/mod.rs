//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CliArgs, Command, CommentsArgs, ServeArgs, ServeOverrides, StoreOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "visuopost";
const ENV_PREFIX: &str = "VISUOPOST";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SITE_TITLE: &str = "My Blog";
const DEFAULT_SITE_DESCRIPTION: &str = "Notes on React, JavaScript and Tailwind CSS.";
const DEFAULT_COLLECTION: &str = "comments";
const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_RELAY_ENDPOINT: &str = "https://api.web3forms.com/submit";
const DEFAULT_SIGNUP_SUBJECT: &str = "New Newsletter Signup";
const DEFAULT_SIGNUP_REDIRECT: &str = "https://visuopost.netlify.app";
const DEFAULT_IMAGES_DIR: &str = "public";
const DEFAULT_SESSIONS_MAX_ENTRIES: usize = 10_000;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub store: StoreSettings,
    pub newsletter: NewsletterSettings,
    pub assets: AssetSettings,
    pub sessions: SessionSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    Memory,
    Firestore(FirestoreSettings),
}

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub base_url: Url,
    pub project_id: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewsletterSettings {
    pub endpoint: Url,
    /// Relay credential; signups are not forwarded while unset.
    pub access_key: Option<String>,
    pub subject: String,
    pub from_name: String,
    pub redirect: String,
}

#[derive(Debug, Clone)]
pub struct AssetSettings {
    pub images_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Upper bound on live visitor sessions; the least recently used is dropped beyond it.
    pub max_entries: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Comments(args)) => raw.apply_store_overrides(&args.store),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    store: RawStoreSettings,
    newsletter: RawNewsletterSettings,
    assets: RawAssetSettings,
    sessions: RawSessionSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(dir) = overrides.images_dir.as_ref() {
            self.assets.images_dir = Some(dir.clone());
        }
        if let Some(max_entries) = overrides.sessions_max_entries {
            self.sessions.max_entries = Some(max_entries);
        }
        self.apply_store_overrides(&overrides.store);
    }

    fn apply_store_overrides(&mut self, overrides: &StoreOverrides) {
        if let Some(backend) = overrides.backend.as_ref() {
            self.store.backend = Some(backend.clone());
        }
        if let Some(project) = overrides.project_id.as_ref() {
            self.store.project_id = Some(project.clone());
        }
        if let Some(url) = overrides.base_url.as_ref() {
            self.store.base_url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            store,
            newsletter,
            assets,
            sessions,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let site = build_site_settings(site);
        let store = build_store_settings(store)?;
        let newsletter = build_newsletter_settings(newsletter, &site)?;
        let assets = build_asset_settings(assets)?;
        let sessions = build_session_settings(sessions)?;

        Ok(Self {
            server,
            logging,
            site,
            store,
            newsletter,
            assets,
            sessions,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> SiteSettings {
    SiteSettings {
        title: non_blank(site.title).unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        description: non_blank(site.description)
            .unwrap_or_else(|| DEFAULT_SITE_DESCRIPTION.to_string()),
    }
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let collection =
        non_blank(store.collection).unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
    if collection.contains('/') {
        return Err(LoadError::invalid(
            "store.collection",
            "collection id must not contain `/`",
        ));
    }

    let backend_name = non_blank(store.backend).unwrap_or_else(|| "memory".to_string());
    let backend = match backend_name.to_ascii_lowercase().as_str() {
        "memory" => StoreBackend::Memory,
        "firestore" => {
            let project_id = non_blank(store.project_id).ok_or_else(|| {
                LoadError::invalid(
                    "store.project_id",
                    "required when the firestore backend is selected",
                )
            })?;
            let base_url = parse_url(
                "store.base_url",
                store.base_url.as_deref(),
                DEFAULT_FIRESTORE_BASE_URL,
            )?;
            StoreBackend::Firestore(FirestoreSettings {
                base_url,
                project_id,
                api_key: non_blank(store.api_key),
            })
        }
        other => {
            return Err(LoadError::invalid(
                "store.backend",
                format!("unknown backend `{other}` (expected memory or firestore)"),
            ));
        }
    };

    Ok(StoreSettings {
        backend,
        collection,
    })
}

fn build_newsletter_settings(
    newsletter: RawNewsletterSettings,
    site: &SiteSettings,
) -> Result<NewsletterSettings, LoadError> {
    let endpoint = parse_url(
        "newsletter.endpoint",
        newsletter.endpoint.as_deref(),
        DEFAULT_RELAY_ENDPOINT,
    )?;

    Ok(NewsletterSettings {
        endpoint,
        access_key: non_blank(newsletter.access_key),
        subject: non_blank(newsletter.subject)
            .unwrap_or_else(|| DEFAULT_SIGNUP_SUBJECT.to_string()),
        from_name: non_blank(newsletter.from_name).unwrap_or_else(|| site.title.clone()),
        redirect: non_blank(newsletter.redirect)
            .unwrap_or_else(|| DEFAULT_SIGNUP_REDIRECT.to_string()),
    })
}

fn build_asset_settings(assets: RawAssetSettings) -> Result<AssetSettings, LoadError> {
    let images_dir = assets
        .images_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR));
    if images_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "assets.images_dir",
            "path must not be empty",
        ));
    }
    Ok(AssetSettings { images_dir })
}

fn build_session_settings(sessions: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let raw = sessions
        .max_entries
        .unwrap_or(DEFAULT_SESSIONS_MAX_ENTRIES);
    let max_entries = NonZeroUsize::new(raw).ok_or_else(|| {
        LoadError::invalid("sessions.max_entries", "must be greater than zero")
    })?;
    Ok(SessionSettings { max_entries })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    backend: Option<String>,
    collection: Option<String>,
    base_url: Option<String>,
    project_id: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNewsletterSettings {
    endpoint: Option<String>,
    access_key: Option<String>,
    subject: Option<String>,
    from_name: Option<String>,
    redirect: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAssetSettings {
    images_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    max_entries: Option<usize>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_url(key: &'static str, value: Option<&str>, default: &str) -> Result<Url, LoadError> {
    let candidate = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default);
    let url = Url::parse(candidate)
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{candidate}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "url scheme must be http or https"));
    }
    Ok(url)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
