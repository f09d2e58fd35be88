/// Booster configuration
///
/// Loaded from an optional TOML file, then overridden by `BOOSTER_`
/// environment variables using `__` between sections and keys, e.g.
/// `BOOSTER_ENGINE__BASS_PERCENT=40` or `BOOSTER_DEVICES__INPUT="USB Mic"`.
use crate::error::{CliError, Result};
use booster_audio::{EngineConfig, EngineSettings, DEFAULT_CHUNK_SECONDS};
use booster_audio_desktop::DeviceOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File read when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "booster.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoosterConfig {
    pub engine: EngineSettings,
    pub devices: DeviceOptions,
    pub recording: RecordingSettings,
    /// Sounds loaded into the Sample Bank at startup
    pub sounds: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub chunk_seconds: u32,
    /// Where `rec stop` saves when no path is given
    pub default_path: Option<PathBuf>,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            chunk_seconds: DEFAULT_CHUNK_SECONDS,
            default_path: None,
        }
    }
}

impl BoosterConfig {
    /// Load from `path` (required to exist) or `booster.toml` (optional),
    /// then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load) but reading overrides from `env` instead of
    /// the process environment when given
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::Config(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    settings = settings.add_source(config::File::from(default));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("BOOSTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Apply the engine's range checks without building an engine
    pub fn validate(&self) -> Result<()> {
        EngineConfig::from_settings(&self.engine)?;

        if self.recording.chunk_seconds == 0 {
            return Err(CliError::Config(
                "recording.chunk_seconds must be at least 1".to_string(),
            ));
        }
        if self.devices.output_channels == 0 {
            return Err(CliError::Config(
                "devices.output_channels must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn defaults_are_valid() {
        let config = BoosterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.sample_rate, 44_100);
        assert_eq!(config.recording.chunk_seconds, 1);
        assert!(config.sounds.is_empty());
    }

    #[test]
    fn file_values_are_read() {
        let file = write_config(
            r#"
            sounds = ["horn.wav"]

            [engine]
            bass_percent = 40
            noise_reduction = false

            [devices]
            input = "USB Mic"

            [recording]
            default_path = "take.wav"
            "#,
        );

        let config = BoosterConfig::load_with_env(Some(file.path()), no_env()).unwrap();

        assert_eq!(config.engine.bass_percent, 40.0);
        assert!(!config.engine.noise_reduction);
        assert_eq!(config.engine.mic_volume, 100.0);
        assert_eq!(config.devices.input.as_deref(), Some("USB Mic"));
        assert_eq!(config.recording.default_path, Some(PathBuf::from("take.wav")));
        assert_eq!(config.sounds, vec![PathBuf::from("horn.wav")]);
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config("[engine]\ntreble_percent = 10\n");
        let env = HashMap::from([
            ("BOOSTER_ENGINE__TREBLE_PERCENT".to_string(), "75".to_string()),
            ("BOOSTER_RECORDING__CHUNK_SECONDS".to_string(), "2".to_string()),
        ]);

        let config = BoosterConfig::load_with_env(Some(file.path()), Some(env)).unwrap();

        assert_eq!(config.engine.treble_percent, 75.0);
        assert_eq!(config.recording.chunk_seconds, 2);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let missing = Path::new("/nonexistent/booster.toml");
        let err = BoosterConfig::load_with_env(Some(missing), no_env()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn out_of_range_volume_fails_validation() {
        let mut config = BoosterConfig::default();
        config.engine.mic_volume = 500.0;
        assert!(matches!(config.validate(), Err(CliError::Validation(_))));
    }

    #[test]
    fn zero_chunk_fails_validation() {
        let mut config = BoosterConfig::default();
        config.recording.chunk_seconds = 0;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }
}
