use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "surf-vcr.toml";
const VIDEO_DIR_NAME: &str = "surf-vcr";

/// `<user config dir>/surf-vcr.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoUserDir("config"))?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

pub fn load_default() -> Result<AppConfig, ConfigError> {
    load_from_path(&default_config_path()?)
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg = toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;

    Ok(cfg)
}

/// Resolves the segment directory (explicit override, then config, then
/// `<user cache dir>/surf-vcr`) and creates it if absent.
pub fn ensure_video_dir(
    cfg: &AppConfig,
    override_dir: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    let dir = match override_dir.or(cfg.video_dir.as_deref()) {
        Some(d) => d.to_path_buf(),
        None => dirs::cache_dir()
            .ok_or(ConfigError::NoUserDir("cache"))?
            .join(VIDEO_DIR_NAME),
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::VideoDir {
        path: dir.clone(),
        source,
    })?;

    Ok(dir)
}
