use cap_std::fs_utf8::Dir;
use miette::{Context, IntoDiagnostic, Result};

pub const LOG_ENV: &str = "MAPMARK_LOG";
pub const LOG_FILE_NAME: &str = "mapmark.log";
const DEFAULT_FILTER: &str = "info";

/// Installs the global tracing subscriber.
/// Events go to stdout and to `mapmark.log` inside the data dir. The filter is read from `MAPMARK_LOG`.
///
/// The returned guard flushes the log file when dropped, so keep it alive till the end of main.
pub fn install_tracing(data_dir: &Dir) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter_layer = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .into_diagnostic()
        .wrap_err("failed to create env filter")?;
    // creating the log file also checks that the directory is writeable by us
    let writer = std::io::BufWriter::new(
        data_dir
            .create(LOG_FILE_NAME)
            .into_diagnostic()
            .wrap_err("failed to create mapmark.log file")?,
    );
    let (nb, guard) = tracing_appender::non_blocking(writer);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(nb);
    let stdout_layer = fmt::layer().with_target(false).compact();
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("failed to set global tracing subscriber")?;
    Ok(guard)
}

/// Routes miette reports (including the ones we get from panics) through tracing, so that they end up in the log file.
pub fn install_miette_panic_hook() -> Result<()> {
    miette::set_hook(Box::new(|_diagnostic| {
        Box::new(miette::NarratableReportHandler::new())
    }))
    .wrap_err("failed to install miette hook")?;
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(%info, "crashing");
        default_hook(info);
    }));
    Ok(())
}
