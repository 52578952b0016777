//! Setup for the application logging.
//!
//! It redirects the log lines to the standard output, formatted with the
//! style and filtered with the threshold defined in the configuration.
//!
//! Refer to the `seedbox-gateway-configuration` crate docs to know how to
//! change log settings.
use std::sync::Once;

use seedbox_gateway_configuration::{Configuration, Style, Threshold};
use tracing::info;
use tracing::level_filters::LevelFilter;

static INIT: Once = Once::new();

/// It redirects the log lines to the standard output with the threshold and
/// style defined in the configuration.
pub fn setup(cfg: &Configuration) {
    let filter = level_filter(&cfg.logging.threshold);

    if filter == LevelFilter::OFF {
        return;
    }

    INIT.call_once(|| {
        stdout_init(filter, &cfg.logging.style);
    });
}

fn level_filter(threshold: &Threshold) -> LevelFilter {
    match threshold {
        Threshold::Off => LevelFilter::OFF,
        Threshold::Error => LevelFilter::ERROR,
        Threshold::Warn => LevelFilter::WARN,
        Threshold::Info => LevelFilter::INFO,
        Threshold::Debug => LevelFilter::DEBUG,
        Threshold::Trace => LevelFilter::TRACE,
    }
}

fn stdout_init(filter: LevelFilter, style: &Style) {
    let builder = tracing_subscriber::fmt().with_max_level(filter).with_ansi(true);

    // Plain `pretty` shows file paths only on the verbose thresholds.
    let () = match style {
        Style::Full => builder.init(),
        Style::Pretty => builder.pretty().with_file(LevelFilter::DEBUG <= filter).init(),
        Style::PrettyWithPaths => builder.pretty().with_file(true).init(),
        Style::PrettyWithoutPaths => builder.pretty().with_file(false).init(),
        Style::Compact => builder.compact().init(),
        Style::Json => builder.json().init(),
    };

    info!("logging initialized ({style})");
}
