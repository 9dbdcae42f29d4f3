use crate::error::{AppError, Result};
use reconcile_common::types::{DEFAULT_CHUNK_SIZE, OUTPUT_FILE_STEM};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// チャンクサイズを上書きする環境変数
pub const CHUNK_SIZE_ENV: &str = "STOCK_RECONCILE_CHUNK_SIZE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunk_size: usize,
    pub parallel: bool,
    pub output_file_stem: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: false,
            output_file_stem: OUTPUT_FILE_STEM.into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("stock-reconcile").join("config.json"))
    }

    /// チャンクサイズ（環境変数を優先）
    pub fn effective_chunk_size(&self) -> Result<usize> {
        let size = match std::env::var(CHUNK_SIZE_ENV) {
            Ok(value) => value.trim().parse::<usize>().map_err(|_| {
                AppError::Config(format!("{} が数値ではありません: {}", CHUNK_SIZE_ENV, value))
            })?,
            Err(_) => self.chunk_size,
        };
        validate_chunk_size(size)
    }

    pub fn set_chunk_size(&mut self, size: usize) -> Result<()> {
        self.chunk_size = validate_chunk_size(size)?;
        Ok(())
    }
}

pub fn validate_chunk_size(size: usize) -> Result<usize> {
    if size == 0 {
        return Err(AppError::Config("チャンクサイズは1以上を指定してください".into()));
    }
    Ok(size)
}
