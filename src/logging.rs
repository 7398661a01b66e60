use std::io;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const CONSOLE_FILTER: &str = "info,sqlx=warn,hyper=warn,reqwest=warn";
const FILE_FILTER: &str = "debug,sqlx=info,hyper=info,hyper_util=info,reqwest=info,rustls=info";

/// Stderr at info (overridable with `RUST_LOG`) plus a daily rolling debug log in `log_dir`.
pub fn configure_logging(log_dir: &str) {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_FILTER));
    let console_log = fmt::layer()
        .with_writer(io::stderr)
        .with_thread_names(true)
        .with_filter(console_filter);

    let file_appender = rolling::daily(log_dir, "esg-scraper.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(console_log)
        .with(file_log)
        .init();
}
