//! Logger setup for applications using the renderer.
//!
//! The library itself only talks to the `log` facade. Call [`init_logging`]
//! once, early in `main`.

use log::LevelFilter;

use crate::{
    config::EngineConfig,
    error::{RenderError, RenderResult},
};

/// Installs a stderr logger writing `[time level target] message`.
///
/// Fails if a global logger is already installed.
pub fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    log::debug!("logging initialized at {level}");
    Ok(())
}

/// [`init_logging`] with the level from `config`.
pub fn init_from_config(config: &EngineConfig) -> RenderResult<()> {
    let level = config.level_filter()?;
    init_logging(level).map_err(|e| RenderError::configuration(e.to_string()))
}
