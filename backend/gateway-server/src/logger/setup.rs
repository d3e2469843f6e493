//! Logging subsystem setup: a console+file split built directly against
//! `tracing-subscriber`'s own `fmt`/`EnvFilter`/`registry` and
//! `tracing-appender` for non-blocking file output.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use super::config::{Level, Log, LogFormat};

/// Holds the non-blocking writer guards; logging stops flushing once this is
/// dropped, so `main` keeps it alive for the process lifetime.
#[derive(Debug)]
pub struct TelemetryGuard {
    _log_guards: Vec<WorkerGuard>,
}

/// Sets up console and/or file logging per `config`. `service_name` and
/// `crates_to_filter` widen the default `WARN` filter to the given level for
/// this binary's own crates: verbose logging for workspace crates, quiet
/// for dependencies.
pub fn setup(
    config: &Log,
    service_name: &str,
    crates_to_filter: impl AsRef<[&'static str]>,
) -> std::io::Result<TelemetryGuard> {
    let mut guards = Vec::new();
    let mut layers = Vec::new();

    if config.console.enabled {
        let directive = config
            .console
            .filtering_directive
            .clone()
            .unwrap_or_else(|| envfilter_directive(config.console.level, crates_to_filter.as_ref()));
        let filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(config.console.level.into_level().into())
            .parse_lossy(directive);

        let layer = match config.console.log_format {
            LogFormat::Json => {
                error_stack::Report::set_color_mode(error_stack::fmt::ColorMode::None);
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .boxed()
            }
            LogFormat::Default => tracing_subscriber::fmt::layer().with_target(true).boxed(),
        };
        layers.push(layer.with_filter(filter).boxed());
    }

    if config.file.enabled {
        std::fs::create_dir_all(Path::new(&config.file.path))?;
        let file_appender = tracing_appender::rolling::daily(&config.file.path, &config.file.file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        let directive = envfilter_directive(config.file.level, crates_to_filter.as_ref());
        let filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(config.file.level.into_level().into())
            .parse_lossy(directive);

        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true);
        layers.push(layer.with_filter(filter).boxed());
    }

    tracing_subscriber::registry().with(layers).init();

    tracing::info!(service_name, "logging subsystem initialized");

    Ok(TelemetryGuard { _log_guards: guards })
}

fn envfilter_directive(level: Level, crates_to_filter: &[&'static str]) -> String {
    let level = level.into_level();
    let mut directives = vec![tracing::Level::WARN.to_string()];
    for target in crates_to_filter {
        directives.push(format!("{}={level}", target.replace('-', "_")));
    }
    directives.join(",")
}
