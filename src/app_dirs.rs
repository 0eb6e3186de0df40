use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// The terminal belongs to the UI, so logs go to a file
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("wristtap");
            Some(state_dir.join("wristtap.log"))
        } else {
            ProjectDirs::from("", "", "wristtap")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("wristtap.log"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_names_the_log_file() {
        if let Some(path) = AppDirs::log_path() {
            assert_eq!(
                path.file_name().and_then(|n| n.to_str()),
                Some("wristtap.log")
            );
            assert!(path.to_string_lossy().contains("wristtap"));
        }
    }
}
