use clap::{
    Parser,
    Subcommand,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use reelspin::config::{
    AppConfig,
    ConfigOverrides,
    FileConfig,
    Variant,
};
use std::{
    fs,
    path::PathBuf,
    sync::OnceLock,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(version, about = "Terminal slot machine client", long_about = None)]
struct Args {
    /// Slot server base URL
    #[arg(long)]
    server_url: Option<String>,

    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// JSON config file with timing and timeout overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_dir: Option<String>,

    /// Tracing filter, e.g. `info` or `reelspin=debug`
    #[arg(long)]
    log_level: Option<String>,

    /// Halve all reel timings
    #[arg(long, default_value = "false")]
    turbo: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Play in the terminal (default)
    #[default]
    Play,
    /// Print the server-side balance
    Status,
    /// Reset the server-side balance
    Reset,
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.log_dir).wrap_err_with(|| {
        format!("failed to create log directory {}", config.log_dir.display())
    })?;
    let appender = rolling::daily(&config.log_dir, "reelspin.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .wrap_err("invalid log level")?;
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let file = args.config.as_deref().map(FileConfig::load).transpose()?;
    let overrides = ConfigOverrides {
        server_url: args.server_url,
        variant: args.variant,
        log_dir: args.log_dir,
        log_level: args.log_level,
        turbo: args.turbo,
    };
    let config = AppConfig::resolve(overrides, file)?;
    init_tracing(&config)?;
    tracing::info!(
        server_url = %config.server_url,
        variant = %config.variant,
        "starting reelspin"
    );

    match args.command.unwrap_or_default() {
        Command::Play => client::run_app(config).await,
        Command::Status => client::print_status(&config).await,
        Command::Reset => client::reset_and_print(&config).await,
    }
}
