use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Visuopost binary.
#[derive(Debug, Parser)]
#[command(name = "visuopost", version, about = "Visuopost blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "VISUOPOST_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the blog HTTP server.
    Serve(Box<ServeArgs>),
    /// Print the stored comments of one post, oldest first.
    Comments(CommentsArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct StoreOverrides {
    /// Override the comment store backend (memory|firestore).
    #[arg(long = "store-backend", value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Override the Firestore project id.
    #[arg(long = "store-project-id", value_name = "PROJECT")]
    pub project_id: Option<String>,

    /// Override the Firestore REST base URL.
    #[arg(long = "store-base-url", value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the directory post images are served from.
    #[arg(long = "images-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub images_dir: Option<PathBuf>,

    /// Override how many visitor sessions are kept in memory.
    #[arg(long = "sessions-max-entries", value_name = "COUNT")]
    pub sessions_max_entries: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct CommentsArgs {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Post whose comments are printed, e.g. `post-1`.
    #[arg(value_name = "POST_ID")]
    pub post_id: String,
}
