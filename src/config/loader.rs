use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::jsonc;
use super::model::{Config, Icon, IconSpec, RawConfig};
use crate::constants::icon::{DIR as ICON_DIR, EXTENSIONS as ICON_EXTENSIONS};

/// Why a config file could not be turned into a [`Config`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Returns the default config path: `~/tray-menu.config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::constants::config::FILENAME)
}

/// Tries to load and parse the config file.
///
/// Individual malformed menu nodes do not fail the load; see [`super::MenuNode::from_value`].
pub fn try_load(path: &Path, resources_dir: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawConfig =
        serde_json::from_str(&jsonc::strip(&contents)).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let (icon, title, description, menus) = raw.into_parts();
    let icon = icon
        .map(|spec| resolve_icon(&spec, resources_dir))
        .unwrap_or_default();

    info!(path = %path.display(), entries = menus.len(), "Loaded menu config");
    Ok(Config {
        icon,
        title,
        description,
        menus,
    })
}

/// Loads the config, falling back to the minimal `Error` config on any failure.
pub fn load(path: &Path, resources_dir: &Path) -> Config {
    try_load(path, resources_dir).unwrap_or_else(|e| {
        warn!(error = %e, "Config load failed, using fallback menu");
        Config::fallback(e.to_string())
    })
}

/// Map an icon spec to a file on disk.
///
/// Absolute names are used verbatim; bare names are looked up in the
/// resources icon directory. Missing files yield [`Icon::Empty`].
pub fn resolve_icon(spec: &IconSpec, resources_dir: &Path) -> Icon {
    let candidates: Vec<PathBuf> = if spec.name.starts_with(std::path::MAIN_SEPARATOR) {
        vec![PathBuf::from(&spec.name)]
    } else {
        ICON_EXTENSIONS
            .iter()
            .map(|ext| {
                resources_dir
                    .join(ICON_DIR)
                    .join(format!("{}.{ext}", spec.name))
            })
            .collect()
    };

    match candidates.into_iter().find(|p| p.is_file()) {
        Some(path) => Icon::File {
            path,
            width: spec.width,
            height: spec.height,
        },
        None => {
            debug!(icon = %spec.name, "Icon not found, using empty icon");
            Icon::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Action, ItemType};
    use std::fs;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("tray-menu.config.json");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_unparsable_returns_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "{ this is not json");
        let config = load(&path, dir.path());
        assert_eq!(config.title, "Error");
        assert!(config.menus.is_empty());
        assert!(config.description.contains("failed to parse"));
        assert_eq!(config.icon, Icon::Empty);
    }

    #[test]
    fn test_load_missing_file_returns_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(
            try_load(&path, dir.path()),
            Err(ConfigError::Read { .. })
        ));
        let config = load(&path, dir.path());
        assert_eq!(config.title, "Error");
        assert!(config.description.contains("failed to read"));
    }

    #[test]
    fn test_schema_violation_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "menus": "not a list" }"#);
        assert!(matches!(
            try_load(&path, dir.path()),
            Err(ConfigError::Parse { .. })
        ));

        let path = write_config(dir.path(), "[1, 2, 3]");
        assert_eq!(load(&path, dir.path()).title, "Error");
    }

    #[test]
    fn test_load_with_comments_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{
                // menu for the tray
                "menus": [
                    { "label": "Uptime: {{CommandValue}}", "command": "uptime", },
                    /* separator */
                    { "type": "separator" },
                    { "label": "Quit", "action": "quit-app" },
                ],
            }"#,
        );
        let config = try_load(&path, dir.path()).unwrap();
        assert_eq!(config.title, "Untitled");
        assert_eq!(config.description, "");
        assert_eq!(config.menus.len(), 3);
        assert_eq!(config.menus[1].item_type, ItemType::Separator);
        assert_eq!(config.menus[2].action, Action::QuitApp);
    }

    #[test]
    fn test_missing_menus_defaults_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "title": "T", "description": "D" }"#);
        let config = try_load(&path, dir.path()).unwrap();
        assert_eq!(config.title, "T");
        assert_eq!(config.description, "D");
        assert!(config.menus.is_empty());
    }

    #[test]
    fn test_resolve_bare_icon_name() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("assets/icons");
        fs::create_dir_all(&icons).unwrap();
        fs::write(icons.join("clock.svg"), "<svg/>").unwrap();

        let spec = IconSpec {
            name: "clock".to_string(),
            width: 16,
            height: 16,
        };
        assert_eq!(
            resolve_icon(&spec, dir.path()),
            Icon::File {
                path: icons.join("clock.svg"),
                width: 16,
                height: 16
            }
        );
    }

    #[test]
    fn test_resolve_absolute_icon_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.png");
        fs::write(&file, b"png").unwrap();

        let spec = IconSpec {
            name: file.display().to_string(),
            width: 24,
            height: 24,
        };
        assert_eq!(
            resolve_icon(&spec, Path::new("/nonexistent")),
            Icon::File {
                path: file.clone(),
                width: 24,
                height: 24
            }
        );

        let missing = IconSpec {
            name: "nope".to_string(),
            width: 16,
            height: 16,
        };
        assert_eq!(resolve_icon(&missing, dir.path()), Icon::Empty);
    }

    #[test]
    fn test_unresolvable_icon_keeps_title_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "icon": "missing-icon", "menus": [] }"#);
        let config = try_load(&path, dir.path()).unwrap();
        assert_eq!(config.icon, Icon::Empty);
        assert_eq!(config.title, "");
    }
}
