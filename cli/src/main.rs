use clap::Parser;
use std::sync::Arc;
use surf_vcr_cli::commands::cli;
use surf_vcr_cli::http::{run_server, AppState, ServerConfig};
use surf_vcr_core::api::{
    ensure_video_dir, load_default, load_from_path, wait_for_signal, AppConfig, CliError,
    LoggingConfig, ProcessBackend, RunnerSettings, Shutdown, StreamRegistry,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "surf-vcr exiting with error");
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg: AppConfig = match args.config.as_deref() {
        Some(path) => load_from_path(path)?,
        None => load_default()?,
    };
    let video_dir = ensure_video_dir(&cfg, args.video_dir.as_deref())?;
    init_tracing(&cfg.logging).map_err(CliError::Logging)?;

    if args.check {
        println!(
            "config ok: {} stream(s), video dir {}, listening on {}:{}",
            cfg.streams.len(),
            video_dir.display(),
            cfg.http.host,
            cfg.http.port
        );
        return Ok(0);
    }

    let shutdown = Shutdown::new();
    let registry = StreamRegistry::new(
        cfg.streams.values().cloned(),
        Arc::new(ProcessBackend::new()),
        RunnerSettings::from_config(&cfg.capture),
        video_dir,
        shutdown.clone(),
    );
    tracing::info!(
        streams = registry.len(),
        video_dir = %registry.video_dir().display(),
        capture = %cfg.capture.program,
        "surf-vcr starting"
    );

    // On ^c, cancel the root token and wait for every runner to exit.
    // If draining takes too long, the service manager kills us.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match wait_for_signal().await {
                Ok(()) => shutdown.trigger("signal"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handlers");
                    shutdown.trigger("signal handler setup failed");
                }
            }
        });
    }

    let state = AppState::new(registry, cfg.secret.clone());
    let server = tokio::spawn(run_server(
        ServerConfig::from(&cfg.http),
        state,
        shutdown.clone(),
    ));

    shutdown.drained().await;
    tracing::info!("All streams stopped");

    match server.await {
        Ok(Ok(())) => Ok(0),
        Ok(Err(e)) => Err(e),
        Err(e) => Err(anyhow::Error::new(e)
            .context("HTTP server task aborted")
            .into()),
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config / logging setup error
    // 20: io error or control surface failure
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) | CliError::Logging(_) => 11,
        CliError::Io(_) | CliError::Server(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("surf-vcr"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let appender = tracing_appender::rolling::daily(dir, "surf-vcr.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surf_vcr_core::api::ConfigError;

    #[test]
    fn test_exit_codes_by_error_kind() {
        let config = CliError::Config(ConfigError::Invalid("secret must not be empty".into()));
        assert_eq!(exit_code_for_error(&config), 11);
        assert_eq!(exit_code_for_error(&CliError::Logging("bad filter".into())), 11);
        assert_eq!(exit_code_for_error(&CliError::Server("failed to listen".into())), 20);
        assert_eq!(
            exit_code_for_error(&CliError::Io(std::io::Error::other("disk gone"))),
            20
        );
    }

    #[tokio::test]
    async fn test_aborted_server_task_is_internal_error() {
        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();
        let join_err = task.await.unwrap_err();

        let err: CliError = anyhow::Error::new(join_err)
            .context("HTTP server task aborted")
            .into();
        assert!(err.to_string().contains("HTTP server task aborted"));
        assert_eq!(exit_code_for_error(&err), 50);
    }
}
