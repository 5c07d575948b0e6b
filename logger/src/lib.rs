use std::fs::OpenOptions;

use colored::Colorize;
use middleware::logger::LoggerMiddleware;

pub mod middleware {
    pub mod logger;
}

/// Installs the global logger: colored lines to stdout, plain copy appended
/// to `log_file`.
pub fn setup(log_file: &str, console: bool) -> Result<(), fern::InitError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(fern::InitError::Io)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let color = match record.level() {
                log::Level::Info => "green",
                log::Level::Warn => "yellow",
                log::Level::Error => "red",
                log::Level::Debug => "magenta",
                log::Level::Trace => "bright black",
            };
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                record.target(),
                record.level().to_string().color(color),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .level_for("hyper", log::LevelFilter::Off)
        .level_for("sqlx", log::LevelFilter::Warn)
        .chain(fern::log_file(log_file)?);
    if console {
        dispatch = dispatch.chain(std::io::stdout());
    }
    dispatch.apply()?;
    Ok(())
}

pub fn middleware() -> LoggerMiddleware {
    LoggerMiddleware::new()
}
