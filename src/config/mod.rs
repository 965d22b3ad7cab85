//! Application Configuration
//!
//! Engine and pre-processing settings stored in TOML format, plus discovery
//! and validation of the Tesseract language-data directory.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StageError;

/// Name of the language-data subdirectory
pub const TESSDATA_DIR_NAME: &str = "tessdata";

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Largest width or height handed to the OCR engine
pub const MAX_IMAGE_DIMENSION: u32 = 2000;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR engine settings
    #[serde(default)]
    pub engine: EngineSettings,
    /// Image pre-processing settings
    #[serde(default)]
    pub preprocess: PreprocessConfig,
}

/// OCR engine settings as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Explicit language-data directory; discovered when absent
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract language code
    pub language: String,
    /// Engine mode selector
    pub mode: EngineMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tessdata_dir: None,
            language: DEFAULT_LANGUAGE.to_string(),
            mode: EngineMode::Default,
        }
    }
}

/// Tesseract engine mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    /// Whatever the installed language data supports
    #[default]
    Default,
    /// Legacy engine only
    TesseractOnly,
    /// Neural net LSTM engine only
    LstmOnly,
    /// Legacy and LSTM combined
    Combined,
}

/// Image pre-processing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Images with a larger width or height are scaled down
    pub max_dimension: u32,
    /// JPEG quality of the normalized image (1-100)
    pub jpeg_quality: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_dimension: MAX_IMAGE_DIMENSION,
            jpeg_quality: 90,
        }
    }
}

impl PreprocessConfig {
    /// Reject settings the pre-processor cannot work with
    pub fn validate(&self) -> Result<(), StageError> {
        if self.max_dimension == 0 {
            return Err(StageError::InvalidSetting(
                "preprocess.max_dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolved, read-only OCR engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding the language data
    pub tessdata_dir: PathBuf,
    /// Tesseract language code
    pub language: String,
    /// Engine mode selector
    pub mode: EngineMode,
}

impl EngineConfig {
    /// Build a configuration for an explicit language-data directory
    pub fn new(tessdata_dir: impl Into<PathBuf>, language: impl Into<String>, mode: EngineMode) -> Self {
        Self {
            tessdata_dir: tessdata_dir.into(),
            language: language.into(),
            mode,
        }
    }

    /// Resolve the configuration from file settings, discovering the
    /// language-data directory when the settings do not name one
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        let tessdata_dir = match &settings.tessdata_dir {
            Some(dir) => dir.clone(),
            None => {
                let base_dir = application_base_dir()?;
                let cwd = std::env::current_dir()?;
                resolve_tessdata_dir(&base_dir, &cwd, &data_file_name(&settings.language))
            }
        };
        Ok(Self::new(tessdata_dir, settings.language.clone(), settings.mode))
    }

    /// Filename of the required language-data file
    pub fn data_file_name(&self) -> String {
        data_file_name(&self.language)
    }

    /// Full path of the required language-data file
    pub fn data_file_path(&self) -> PathBuf {
        self.tessdata_dir.join(self.data_file_name())
    }

    /// Create the language-data directory if missing and make sure the
    /// required data file is present
    pub fn validate(&self) -> Result<(), StageError> {
        if !self.tessdata_dir.is_dir() {
            info!("Creating tessdata directory {:?}", self.tessdata_dir);
            std::fs::create_dir_all(&self.tessdata_dir)?;
        }

        if !self.data_file_path().is_file() {
            return Err(StageError::Configuration {
                file: self.data_file_name(),
                dir: self.tessdata_dir.clone(),
            });
        }

        debug!("Using language data {:?}", self.data_file_path());
        Ok(())
    }

    /// Check that the data file still exists between calls
    pub fn ensure_data_file(&self) -> Result<(), StageError> {
        if self.data_file_path().is_file() {
            Ok(())
        } else {
            Err(StageError::DataFileMissing {
                file: self.data_file_name(),
            })
        }
    }
}

/// `<language>.traineddata`
pub fn data_file_name(language: &str) -> String {
    format!("{}.traineddata", language)
}

/// Pick the language-data directory: `<base>/tessdata` when it already holds
/// the data file, `<cwd>/tessdata` otherwise
pub fn resolve_tessdata_dir(base_dir: &Path, cwd: &Path, data_file: &str) -> PathBuf {
    let primary = base_dir.join(TESSDATA_DIR_NAME);
    if primary.join(data_file).is_file() {
        return primary;
    }
    cwd.join(TESSDATA_DIR_NAME)
}

/// Directory containing the running executable
pub fn application_base_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Could not determine application directory"))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "imagetextextractor", "ImageTextExtractor")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert!(config.engine.tessdata_dir.is_none());
        assert_eq!(config.engine.language, "eng");
        assert_eq!(config.engine.mode, EngineMode::Default);

        assert_eq!(config.preprocess.max_dimension, 2000);
        assert_eq!(config.preprocess.jpeg_quality, 90);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.engine.tessdata_dir = Some(PathBuf::from("/srv/tessdata"));
        config.engine.mode = EngineMode::LstmOnly;
        config.preprocess.max_dimension = 1500;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.engine.tessdata_dir, Some(PathBuf::from("/srv/tessdata")));
        assert_eq!(parsed.engine.mode, EngineMode::LstmOnly);
        assert_eq!(parsed.preprocess.max_dimension, 1500);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[engine]\nlanguage = \"deu\"\nmode = \"combined\"\n").unwrap();
        assert_eq!(parsed.engine.language, "deu");
        assert_eq!(parsed.engine.mode, EngineMode::Combined);
        assert_eq!(parsed.preprocess.max_dimension, 2000);
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let parsed: AppConfig = toml::from_str("[preprocess]\nmax_dimension = 1500\n\n[engine]\nlanguage = \"fra\"\n").unwrap();
        assert_eq!(parsed.preprocess.max_dimension, 1500);
        assert_eq!(parsed.preprocess.jpeg_quality, 90);
        assert_eq!(parsed.engine.language, "fra");
        assert_eq!(parsed.engine.mode, EngineMode::Default);
        assert!(parsed.engine.tessdata_dir.is_none());
    }

    #[test]
    fn test_zero_max_dimension_is_rejected() {
        let parsed: AppConfig = toml::from_str("[preprocess]\nmax_dimension = 0\njpeg_quality = 90\n").unwrap();
        let err = parsed.preprocess.validate().unwrap_err();
        assert!(matches!(err, StageError::InvalidSetting(_)));
        assert!(PreprocessConfig::default().validate().is_ok());
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.engine.language, loaded.engine.language);
        assert_eq!(config.preprocess.jpeg_quality, loaded.preprocess.jpeg_quality);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_prefers_base_dir_with_data_file() {
        let base = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        std::fs::create_dir_all(base.path().join("tessdata")).unwrap();
        std::fs::write(base.path().join("tessdata/eng.traineddata"), b"data").unwrap();

        let dir = resolve_tessdata_dir(base.path(), cwd.path(), "eng.traineddata");
        assert_eq!(dir, base.path().join("tessdata"));
    }

    #[test]
    fn test_resolve_falls_back_to_cwd() {
        let base = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        // Directory exists but without the data file
        std::fs::create_dir_all(base.path().join("tessdata")).unwrap();

        let dir = resolve_tessdata_dir(base.path(), cwd.path(), "eng.traineddata");
        assert_eq!(dir, cwd.path().join("tessdata"));
    }

    #[test]
    fn test_validate_creates_dir_and_fails_without_data() {
        let root = TempDir::new().unwrap();
        let config = EngineConfig::new(root.path().join("tessdata"), "eng", EngineMode::Default);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, StageError::Configuration { .. }));
        assert!(root.path().join("tessdata").is_dir());
    }

    #[test]
    fn test_validate_succeeds_with_data_file() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("eng.traineddata"), b"data").unwrap();
        let config = EngineConfig::new(root.path(), "eng", EngineMode::Default);

        assert!(config.validate().is_ok());
        assert!(config.ensure_data_file().is_ok());

        std::fs::remove_file(root.path().join("eng.traineddata")).unwrap();
        assert!(matches!(
            config.ensure_data_file(),
            Err(StageError::DataFileMissing { .. })
        ));
    }
}
