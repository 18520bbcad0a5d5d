use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Default log file; the terminal itself belongs to the TUI.
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("dwelltoe");
            Some(state_dir.join("dwelltoe.log"))
        } else {
            ProjectDirs::from("", "", "dwelltoe")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("dwelltoe.log"))
        }
    }
}
