pub mod chart;
pub mod config;
pub mod live;
pub mod request;
pub mod util;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

pub use chart::{ChartState, HoverPoint, Series, Trend};
pub use config::recent::RecentSymbols;
pub use config::state::State;
pub use live::{Displayed, LiveValue, Synchronizer};
pub use request::{Disposition, RequestLifecycle, RequestToken, Stream};

use ::log::{info, warn};

pub const SAVED_STATE_PATH: &str = "saved-state.json";
pub const DATA_PATH_ENV: &str = "TICKLINE_DATA_PATH";

#[derive(thiserror::Error, Debug)]
pub enum InternalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt state file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub fn write_json_to_file(json: &str, file_name: &str) -> std::io::Result<()> {
    let path = data_path(Some(file_name));

    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid state file path")
    })?;

    if !parent.exists() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

pub fn read_from_file(file_name: &str) -> Result<State, InternalError> {
    let path = data_path(Some(file_name));

    let mut file = File::open(&path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    match serde_json::from_str(&contents) {
        Ok(state) => Ok(state),
        Err(e) => {
            drop(file);

            // keep the broken file around under a different name
            let backup_file_name = if let Some(pos) = file_name.rfind('.') {
                format!("{}_old{}", &file_name[..pos], &file_name[pos..])
            } else {
                format!("{}_old", file_name)
            };

            let backup_path = data_path(Some(&backup_file_name));

            if let Err(rename_err) = std::fs::rename(&path, &backup_path) {
                warn!(
                    "Failed to backup corrupted state file '{}' to '{}': {}",
                    path.display(),
                    backup_path.display(),
                    rename_err
                );
            } else {
                info!(
                    "Backed up corrupted state file to '{}'. It can be restored manually.",
                    backup_path.display()
                );
            }

            Err(InternalError::Corrupt(e))
        }
    }
}

pub fn data_path(path_name: Option<&str>) -> PathBuf {
    let base = if let Ok(path) = std::env::var(DATA_PATH_ENV) {
        PathBuf::from(path)
    } else {
        dirs_next::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tickline")
    };

    match path_name {
        Some(path_name) => base.join(path_name),
        None => base,
    }
}
