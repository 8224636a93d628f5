use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{CornerDetectionConfig, CornerPreset, DEFAULT_N_POINTS},
    errors::LapDeltaError,
};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Resolution of the shared distance axis
    pub n_points: usize,
    /// Corner detection thresholds used for the corner table
    pub corner_preset: CornerPreset,
    /// Where provider responses are cached, the user cache directory when unset
    pub cache_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_points: DEFAULT_N_POINTS,
            corner_preset: CornerPreset::Sensitive,
            cache_dir: None,
        }
    }
}

impl AnalysisConfig {
    pub fn corner_detection(&self) -> CornerDetectionConfig {
        self.corner_preset.config()
    }

    fn local_config_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("lapdelta").join(CONFIG_FILE_NAME))
    }

    /// Config from the user config directory, `None` if there is none yet
    pub fn from_local_file() -> Result<Option<Self>, LapDeltaError> {
        match Self::local_config_path() {
            Some(config_path) if config_path.exists() => Self::from_file(&config_path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn from_file(config_path: &Path) -> Result<Self, LapDeltaError> {
        debug!("Reading config from {:?}", config_path);
        let file = std::fs::File::open(config_path)
            .map_err(|e| LapDeltaError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| LapDeltaError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), LapDeltaError> {
        let config_path = Self::local_config_path().ok_or(LapDeltaError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), LapDeltaError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LapDeltaError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| LapDeltaError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| LapDeltaError::ConfigSerializeError { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.n_points, 1000);
        assert_eq!(config.corner_detection(), CornerDetectionConfig::SENSITIVE);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lapdelta").join(CONFIG_FILE_NAME);
        let config = AnalysisConfig {
            n_points: 250,
            corner_preset: CornerPreset::Coarse,
            cache_dir: Some(temp_dir.path().join("cache")),
        };
        config.save_to(&path).unwrap();

        assert_eq!(AnalysisConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"corner_preset":"coarse"}"#).unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.n_points, DEFAULT_N_POINTS);
        assert_eq!(config.corner_preset, CornerPreset::Coarse);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            AnalysisConfig::from_file(&path),
            Err(LapDeltaError::ConfigSerializeError { .. })
        ));
    }
}
