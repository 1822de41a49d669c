pub mod parse;
pub mod types;

pub use parse::{load_config, validate_config, ConfigError};
pub use types::{Config, ExtractionConfig, LogsConfig, ServiceConfig};

use std::path::{Path, PathBuf};

/// Expands a leading tilde to the user's home directory. Paths without one
/// pass through unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Resolves the config file path from the first of:
/// 1. Explicit path (with tilde expansion)
/// 2. ~/.config/nerlog/config.yml
/// 3. /etc/nerlog/config.yml
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".config/nerlog/config.yml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/nerlog/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_with_path() {
        let expanded = expand_tilde(Path::new("~/test/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("test/path"));
        }
    }

    #[test]
    fn test_expand_tilde_no_expansion() {
        let expanded = expand_tilde(Path::new("/absolute/path"));
        assert_eq!(expanded, Path::new("/absolute/path"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let resolved = resolve_config_path(Some(Path::new("/tmp/custom.yml")));
        assert_eq!(resolved, Some(PathBuf::from("/tmp/custom.yml")));
    }
}
