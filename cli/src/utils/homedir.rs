use std::path::{Path, PathBuf};

use anyhow::{Context, Error};

// If `HELPDESK_HOME` is set, use that, otherwise use $HOME/.helpdesk
pub fn helpdesk_home_dir() -> Result<PathBuf, Error> {
    if let Ok(home) = std::env::var("HELPDESK_HOME") {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".helpdesk"))
}

pub fn ensure_homedir_exists(home: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(home)
        .with_context(|| format!("While trying to create directory {}", home.display()))
}
