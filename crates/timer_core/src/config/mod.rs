use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "tasktimer";
const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKTIMER_CONFIG_PATH";

/// Colour scheme for terminal output. Running tasks are drawn in the
/// accent colour, stopped tasks and secondary text in the muted one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Theme {
    #[default]
    Plain,
    Noir,
    Solarized,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match canonical_key(raw).as_str() {
            "" | "plain" | "default" | "none" => Some(Self::Plain),
            "noir" | "dark" | "dark_mode" => Some(Self::Noir),
            "solarized" => Some(Self::Solarized),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Noir => "noir",
            Self::Solarized => "solarized",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Plain => Palette::default(),
            Self::Noir => Palette {
                running: "\x1b[38;5;208m",
                muted: "\x1b[38;5;250m",
            },
            Self::Solarized => Palette {
                running: "\x1b[38;5;108m",
                muted: "\x1b[38;5;246m",
            },
        }
    }
}

impl TryFrom<String> for Theme {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, String> {
        Self::parse(&raw).ok_or_else(|| format!("unknown theme '{raw}'"))
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.name().to_string()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    running: &'static str,
    muted: &'static str,
}

impl Palette {
    const RESET: &'static str = "\x1b[0m";

    fn paint(code: &str, text: &str) -> String {
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{code}{text}{}", Self::RESET)
        }
    }

    pub fn running(&self, text: &str) -> String {
        Self::paint(self.running, text)
    }

    pub fn muted(&self, text: &str) -> String {
        Self::paint(self.muted, text)
    }

    /// Paints `text` in the colour for a running or a stopped task.
    pub fn timer_state(&self, running: bool, text: &str) -> String {
        if running {
            self.running(text)
        } else {
            self.muted(text)
        }
    }
}

/// Lowercases and collapses runs of separators into single underscores.
pub fn canonical_key(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    cleaned.trim_matches('_').to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub notifications: Option<bool>,
}

impl Config {
    pub fn notifications_enabled(&self) -> bool {
        self.notifications.unwrap_or(true)
    }

    pub fn palette(&self) -> Palette {
        self.theme.unwrap_or_default().palette()
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<Theme>,
    pub store_path: Option<PathBuf>,
    pub notifications: Option<bool>,
}

impl ConfigOverrides {
    /// Applies one `KEY=VALUE` override.
    pub fn apply(&mut self, raw: &str) -> Result<(), AppError> {
        let (key, value) = raw
            .trim()
            .split_once('=')
            .ok_or_else(|| AppError::invalid_input("override must be in KEY=VALUE format"))?;
        let value = value.trim();

        match canonical_key(key).as_str() {
            "" => Err(AppError::invalid_input("override key cannot be empty")),
            "theme" => {
                let theme = Theme::parse(value).ok_or_else(|| {
                    AppError::invalid_input(format!("unknown theme '{value}'"))
                })?;
                self.theme = Some(theme);
                Ok(())
            }
            "store_path" | "store" => {
                if value.is_empty() {
                    return Err(AppError::invalid_input("store_path cannot be empty"));
                }
                self.store_path = Some(PathBuf::from(value));
                Ok(())
            }
            "notifications" | "notify" => {
                let enabled = match value.to_ascii_lowercase().as_str() {
                    "true" | "on" | "yes" | "1" => true,
                    "false" | "off" | "no" | "0" => false,
                    _ => {
                        return Err(AppError::invalid_input(format!(
                            "notifications must be true or false, got '{value}'"
                        )));
                    }
                };
                self.notifications = Some(enabled);
                Ok(())
            }
            other => Err(AppError::invalid_input(format!(
                "unknown config field '{other}'"
            ))),
        }
    }
}

/// Per-user directory holding the config and the default task store.
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::invalid_data(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme {
        merged.theme = Some(theme);
    }
    if let Some(path) = overrides.store_path.as_ref() {
        merged.store_path = Some(path.clone());
    }
    if let Some(enabled) = overrides.notifications {
        merged.notifications = Some(enabled);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, Theme, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides,
    };
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_with_fallback_from_path(&dir.path().join("missing.json"));

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
        assert!(result.config.notifications_enabled());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "store_path": "/tmp/tasks.json",
            "notifications": false
        });
        fs::write(&path, content.to_string()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();

        assert_eq!(loaded.theme, Some(Theme::Noir));
        assert_eq!(loaded.store_path, Some(PathBuf::from("/tmp/tasks.json")));
        assert!(!loaded.notifications_enabled());
    }

    #[test]
    fn overrides_parse_known_keys() {
        let mut overrides = ConfigOverrides::default();
        overrides.apply(" THEME = Solarized ").unwrap();
        overrides.apply("store-path=/tmp/other.json").unwrap();
        overrides.apply("notifications=off").unwrap();

        assert_eq!(overrides.theme, Some(Theme::Solarized));
        assert_eq!(
            overrides.store_path,
            Some(PathBuf::from("/tmp/other.json"))
        );
        assert_eq!(overrides.notifications, Some(false));
    }

    #[test]
    fn overrides_reject_bad_input() {
        let mut overrides = ConfigOverrides::default();

        let err = overrides.apply("themenoir").unwrap_err();
        assert!(err.to_string().contains("KEY=VALUE"));

        let err = overrides.apply("unknown.field=value").unwrap_err();
        assert!(err.to_string().contains("unknown config field"));

        let err = overrides.apply("notifications=maybe").unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let err = overrides.apply("theme=oceanic").unwrap_err();
        assert!(err.to_string().contains("unknown theme"));
    }

    #[test]
    fn merge_overrides_preserves_base_config() {
        let base = Config {
            theme: Some(Theme::Plain),
            store_path: Some(PathBuf::from("/tmp/a.json")),
            notifications: None,
        };
        let overrides = ConfigOverrides {
            theme: Some(Theme::Noir),
            store_path: None,
            notifications: Some(false),
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(base.theme, Some(Theme::Plain));
        assert_eq!(merged.theme, Some(Theme::Noir));
        assert_eq!(merged.store_path, Some(PathBuf::from("/tmp/a.json")));
        assert_eq!(merged.notifications, Some(false));
        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn unknown_theme_in_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "theme": "oceanic" }"#).unwrap();

        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.unwrap().to_string().contains("unknown theme"));
    }

    #[test]
    fn theme_parse_maps_variants() {
        assert_eq!(Theme::parse("Default"), Some(Theme::Plain));
        assert_eq!(Theme::parse("  "), Some(Theme::Plain));
        assert_eq!(Theme::parse("dark-mode"), Some(Theme::Noir));
        assert_eq!(Theme::parse("Solarized"), Some(Theme::Solarized));
        assert_eq!(Theme::parse("oceanic"), None);
        assert_eq!(String::from(Theme::Noir), "noir");
    }

    #[test]
    fn palette_marks_running_tasks() {
        let plain = Config::default().palette();
        assert_eq!(plain.timer_state(true, "busy"), "busy");

        let noir = Theme::Noir.palette();
        assert_eq!(noir.timer_state(true, "busy"), "\x1b[38;5;208mbusy\x1b[0m");
        assert_eq!(noir.timer_state(false, "idle"), "\x1b[38;5;250midle\x1b[0m");
    }
}
