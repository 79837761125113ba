//! microcred daemon: entry point for running the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use microcred_api::{ApiConfig, AppState, Environment, ShutdownController};
use microcred_crypto::OsRandom;
use microcred_store_lmdb::LazyLmdbProvider;
use microcred_types::SystemClock;
use microcred_utils::LogFormat;

#[derive(Parser)]
#[command(name = "microcred", about = "Micro-lending API backed by World ID")]
struct Cli {
    /// Address to bind, e.g. "0.0.0.0:3000".
    #[arg(long, env = "MICROCRED_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Port to bind; replaces the port of the listen address.
    #[arg(long, env = "MICROCRED_PORT")]
    port: Option<u16>,

    /// "development" or "production". Cookies are Secure outside development.
    #[arg(long, env = "MICROCRED_ENV")]
    environment: Option<Environment>,

    /// World ID application id.
    #[arg(long, env = "WORLD_ID_APP_ID")]
    app_id: Option<String>,

    /// Action whose verification creates a user.
    #[arg(long, env = "WORLD_ID_ACCESS_ACTION")]
    access_action: Option<String>,

    /// Action loan requests are verified for.
    #[arg(long, env = "WORLD_ID_LOAN_ACTION")]
    loan_action: Option<String>,

    /// Developer portal base URL.
    #[arg(long, env = "WORLD_ID_BASE_URL")]
    world_id_base_url: Option<String>,

    /// Timeout in seconds for every developer portal call.
    #[arg(long, env = "WORLD_ID_VERIFY_TIMEOUT_SECS")]
    verify_timeout_secs: Option<u64>,

    /// Developer portal API key, needed to confirm survey deposits.
    #[arg(long, env = "DEV_PORTAL_API_KEY", hide_env_values = true)]
    dev_portal_api_key: Option<String>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "MICROCRED_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Name of the LMDB environment under the data directory.
    #[arg(long, env = "MICROCRED_DB_NAME")]
    db_name: Option<String>,

    /// LMDB map size in MiB.
    #[arg(long, env = "MICROCRED_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Session HMAC key, at least 32 bytes.
    #[arg(long, env = "MICROCRED_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    /// Lifetime of a sign-in nonce in seconds.
    #[arg(long, env = "MICROCRED_NONCE_TTL_SECS")]
    nonce_ttl_secs: Option<u64>,

    /// Origins allowed to call the API with credentials (comma-separated).
    #[arg(long, env = "MICROCRED_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Log output: "human" or "json".
    #[arg(long, env = "MICROCRED_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MICROCRED_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Run the HTTP API (the default).
    Serve,
    /// Validate the effective configuration and exit.
    CheckConfig,
}

impl Cli {
    /// Layer CLI and env values over `base`.
    fn merge_into(self, base: ApiConfig) -> ApiConfig {
        let mut listen_addr = self.listen_addr.unwrap_or(base.listen_addr);
        if let Some(port) = self.port {
            let host = listen_addr
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            listen_addr = format!("{host}:{port}");
        }
        ApiConfig {
            listen_addr,
            environment: self.environment.unwrap_or(base.environment),
            world_id_app_id: self.app_id.unwrap_or(base.world_id_app_id),
            access_action: self.access_action.unwrap_or(base.access_action),
            loan_action: self.loan_action.unwrap_or(base.loan_action),
            world_id_base_url: self.world_id_base_url.unwrap_or(base.world_id_base_url),
            verify_timeout_secs: self.verify_timeout_secs.unwrap_or(base.verify_timeout_secs),
            dev_portal_api_key: self.dev_portal_api_key.or(base.dev_portal_api_key),
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            db_name: self.db_name.unwrap_or(base.db_name),
            map_size_mb: self.map_size_mb.unwrap_or(base.map_size_mb),
            session_secret: self.session_secret.or(base.session_secret),
            nonce_ttl_secs: self.nonce_ttl_secs.unwrap_or(base.nonce_ttl_secs),
            cors_allowed_origins: if self.cors_origins.is_empty() {
                base.cors_allowed_origins
            } else {
                self.cors_origins
            },
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
        }
    }
}

async fn run(config: ApiConfig) -> anyhow::Result<()> {
    let provider = Arc::new(LazyLmdbProvider::new(
        config.db_path(),
        config.map_size_bytes(),
    ));
    tracing::info!(
        environment = %config.environment,
        listen = %config.listen_addr,
        db = %config.db_path().display(),
        "starting microcred API"
    );
    let state = AppState::new(config, provider, Arc::new(SystemClock), Arc::new(OsRandom))
        .context("invalid configuration")?;

    let shutdown = Arc::new(ShutdownController::new());
    let signals = Arc::clone(&shutdown);
    tokio::spawn(async move { signals.wait_for_signal().await });

    microcred_api::serve(Arc::new(state), shutdown.signalled()).await?;
    tracing::info!("microcred daemon exited cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Command::Serve);

    let file_config = cli
        .config
        .clone()
        .map(|path| (ApiConfig::from_toml_file(&path), path));
    let base = match &file_config {
        Some((Ok(cfg), _)) => cfg.clone(),
        _ => ApiConfig::default(),
    };
    let config = cli.merge_into(base);

    microcred_utils::init_logging(config.log_format, &config.log_level);
    match &file_config {
        Some((Ok(_), path)) => tracing::info!("Loaded config from {}", path.display()),
        Some((Err(e), _)) => tracing::warn!("Failed to load config file: {e}, using CLI defaults"),
        None => {}
    }

    match command {
        Command::CheckConfig => {
            config.validate().context("invalid configuration")?;
            tracing::info!(
                environment = %config.environment,
                app_id = %config.world_id_app_id,
                "configuration is valid"
            );
            Ok(())
        }
        Command::Serve => run(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("microcred").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_values_override_file_values() {
        let base = ApiConfig::from_toml_str(
            r#"
            world_id_app_id = "app_file"
            access_action = "access"
            db_name = "from_file"
        "#,
        )
        .unwrap();
        let config = parse(&["--app-id", "app_cli", "--environment", "production"]).merge_into(base);
        assert_eq!(config.world_id_app_id, "app_cli");
        assert_eq!(config.access_action, "access");
        assert_eq!(config.db_name, "from_file");
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn port_replaces_listen_port() {
        let config = parse(&["--port", "8080"]).merge_into(ApiConfig::default());
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn default_command_is_serve() {
        assert_eq!(parse(&[]).command, None);
        assert_eq!(parse(&["check-config"]).command, Some(Command::CheckConfig));
    }
}
