use crate::error::{AtomError, Result};
use std::env;
use std::path::PathBuf;

/// Overrides the data directory when set
pub const HOME_ENV: &str = "ATOMRENDER_HOME";

const DEFAULT_DIR_NAME: &str = ".atomrender";

// Get the directory holding config, history, usage and user records
pub fn get_data_dir() -> Result<PathBuf> {
    resolve_data_dir(env::var(HOME_ENV).ok(), home::home_dir())
}

fn resolve_data_dir(override_dir: Option<String>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    home.map(|h| h.join(DEFAULT_DIR_NAME))
        .ok_or(AtomError::DataDirNotFound)
}
