use crate::pkey_common_rs::key::core::exceptions::{PKeyError, PKeyResult};
use crate::pkey_common_rs::key::types::ChecksumSpec;
use crate::pkey_common_rs::utils::batch::DEFAULT_MAX_COUNT;
use crate::pkey_common_rs::utils::numeric::parse_hex_or_dec;
use crate::pkey_common_rs::utils::output::OutputFormat;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub upgrade: u8,
    pub extra: u8,
    /// チェックサム指定（"0x400" で自動計算）
    pub checksum: String,
}
impl Default for EncodeConfig {
    fn default() -> Self {
        Self { upgrade: 0, extra: 0, checksum: "0x400".into() }
    }
}
impl EncodeConfig {
    pub fn checksum_spec(&self) -> PKeyResult<ChecksumSpec> {
        let raw = parse_hex_or_dec(&self.checksum)?;
        Ok(ChecksumSpec::from_raw(raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DecodeConfig {
    pub output: OutputFormat,
    pub verify_checksum: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_count: usize,
    pub random: bool,
    pub seed: Option<u64>,
}
impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_count: DEFAULT_MAX_COUNT, random: false, seed: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub timestamps: bool,
}
impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".into(), timestamps: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PKeyConfig {
    pub encode: EncodeConfig,
    pub decode: DecodeConfig,
    pub batch: BatchConfig,
    pub logging: LogConfig,
}

pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_paths: vec![
                PathBuf::from("pkey.config.toml"),
                PathBuf::from("pkey.config.json"),
                PathBuf::from("config.toml"),
                PathBuf::from("config.json"),
            ],
            env_prefix: "PKEY_".into(),
        }
    }

    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self { config_paths: paths, env_prefix: "PKEY_".into() }
    }

    pub fn with_env_prefix(mut self, prefix: String) -> Self {
        self.env_prefix = prefix;
        self
    }

    /// 最初に見つかった設定ファイルを読み、環境変数で上書きして検証する
    pub fn load(&self) -> PKeyResult<PKeyConfig> {
        let mut config = PKeyConfig::default();
        for path in &self.config_paths {
            if path.exists() {
                match self.load_from_file(path) {
                    Ok(fc) => {
                        debug!("設定ファイルを読み込みました: {:?}", path);
                        config = fc;
                        break;
                    }
                    Err(e) => eprintln!("Warning: Failed to load config from {:?}: {}", path, e),
                }
            }
        }
        config = self.apply_env_overrides(config)?;
        self.validate_config(&config)?;
        Ok(config)
    }

    pub fn load_from_file(&self, path: &Path) -> PKeyResult<PKeyConfig> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| PKeyError::Config(format!("Failed to parse JSON config: {}", e))),
            Some("toml") => toml::from_str(&content)
                .map_err(|e| PKeyError::Config(format!("Failed to parse TOML config: {}", e))),
            _ => Err(PKeyError::Config("Unsupported config file format".into())),
        }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        env::var(format!("{}{}", self.env_prefix, name)).ok()
    }

    fn apply_env_overrides(&self, mut config: PKeyConfig) -> PKeyResult<PKeyConfig> {
        let invalid = |name: &str| PKeyError::Config(format!("Invalid {} in environment variable", name));

        if let Some(v) = self.env_var("UPGRADE") {
            config.encode.upgrade = v.parse().map_err(|_| invalid("upgrade flag"))?;
        }
        if let Some(v) = self.env_var("EXTRA") {
            config.encode.extra = v.parse().map_err(|_| invalid("extra flag"))?;
        }
        if let Some(v) = self.env_var("CHECKSUM") {
            config.encode.checksum = v;
        }
        if let Some(v) = self.env_var("OUTPUT") {
            config.decode.output = v.parse().map_err(|_| invalid("output format"))?;
        }
        if let Some(v) = self.env_var("VERIFY_CHECKSUM") {
            config.decode.verify_checksum = v.parse().map_err(|_| invalid("verify flag"))?;
        }
        if let Some(v) = self.env_var("BATCH_MAX_COUNT") {
            config.batch.max_count = v.parse().map_err(|_| invalid("batch max count"))?;
        }
        if let Some(v) = self.env_var("BATCH_SEED") {
            config.batch.seed = Some(v.parse().map_err(|_| invalid("batch seed"))?);
        }
        if let Some(v) = self.env_var("LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = self.env_var("LOG_TIMESTAMPS") {
            config.logging.timestamps = v.parse().map_err(|_| invalid("log timestamps flag"))?;
        }
        Ok(config)
    }

    pub fn validate_config(&self, config: &PKeyConfig) -> PKeyResult<()> {
        if config.encode.upgrade > 1 || config.encode.extra > 1 {
            return Err(PKeyError::Config("upgrade and extra must be 0 or 1".into()));
        }
        config.encode.checksum_spec()?;
        match config.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(PKeyError::Config(
                    "Invalid log level. Must be one of: trace, debug, info, warn, error".into(),
                ))
            }
        }
        if config.batch.max_count == 0 || config.batch.max_count > DEFAULT_MAX_COUNT {
            return Err(PKeyError::Config(format!(
                "Batch max count must be between 1 and {}",
                DEFAULT_MAX_COUNT
            )));
        }
        Ok(())
    }

    pub fn save_config(&self, config: &PKeyConfig, path: &Path) -> PKeyResult<()> {
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .map_err(|e| PKeyError::Config(format!("Failed to serialize config to JSON: {}", e)))?,
            Some("toml") => toml::to_string_pretty(config)
                .map_err(|e| PKeyError::Config(format!("Failed to serialize config to TOML: {}", e)))?,
            _ => return Err(PKeyError::Config("Unsupported config file format for saving".into())),
        };
        fs::write(path, content)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
