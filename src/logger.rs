use std::fs::{self, File};
use std::io;

const LOG_FILE: &str = "tickline-current.log";

/// Dependency targets that would drown our own output at debug level
const NOISY_TARGETS: [&str; 6] = ["wgpu", "naga", "iced_wgpu", "cosmic_text", "reqwest", "hyper"];

pub fn setup(is_debug: bool) -> Result<(), Error> {
    let level_filter = if is_debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .level(level_filter);

    for target in NOISY_TARGETS {
        logger = logger.level_for(target, log::LevelFilter::Warn);
    }

    logger.chain(io::stdout()).chain(file()?).apply()?;

    Ok(())
}

fn file() -> Result<File, Error> {
    let path = data::data_path(Some(LOG_FILE));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    SetLog(#[from] log::SetLoggerError),
}
