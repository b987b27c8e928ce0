use crate::error::{OcrBoosterError, Result};
use crate::key_strategy::KeyStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 環境変数のAPIキー（設定ファイルより優先）
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub key_strategy: KeyStrategy,
    pub ocr_model: String,
    pub refine_model: String,
    pub api_base: String,
    pub high_accuracy: bool,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
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
            Ok(Self::default_config())
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
            .ok_or_else(|| OcrBoosterError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("ocr-booster").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_key: None,
            key_strategy: KeyStrategy::Host,
            ocr_model: "gemini-3-pro-preview".into(),
            refine_model: "gemini-3-flash-preview".into(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
            high_accuracy: true,
            timeout_seconds: 120,
        }
    }

    /// 環境変数 → 保存済みキーの順で取得（空文字は未設定扱い）
    pub fn get_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Some(key);
            }
        }

        self.stored_api_key()
    }

    /// 設定ファイルに保存されたキーのみ
    pub fn stored_api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn clear_api_key(&mut self) -> Result<()> {
        self.api_key = None;
        self.save()
    }
}
