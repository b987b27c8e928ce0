//! APIキー取得（資格情報プロバイダ）
//!
//! パイプラインは外部API呼び出しの直前にここからキーを取得する。
//! 取得方式は起動時に KeyStrategy で1つ選ぶ:
//! - Host: 実行環境（環境変数）が提供
//! - Stored: ユーザー入力を設定ファイルに保存したもの
//! - Optimistic: 常に利用可能とみなし、認証エラーで無効化

use crate::config::{Config, API_KEY_ENV};
use crate::key_strategy::KeyStrategy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait CredentialProvider: Send + Sync {
    fn strategy(&self) -> KeyStrategy;

    /// 利用可能なキー。None は「キー未設定」
    fn api_key(&self) -> Option<String>;

    /// 外部APIが認証エラーを返した時に呼ばれる
    fn invalidate(&self) {}
}

/// 環境変数からキーを都度取得
pub struct HostKeyProvider {
    env_var: String,
}

impl HostKeyProvider {
    pub fn new() -> Self {
        Self::with_var(API_KEY_ENV)
    }

    pub fn with_var(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }
}

impl Default for HostKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for HostKeyProvider {
    fn strategy(&self) -> KeyStrategy {
        KeyStrategy::Host
    }

    fn api_key(&self) -> Option<String> {
        std::env::var(&self.env_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// 保存済みキー（設定ファイルから読み込んだ値）
pub struct StoredKeyProvider {
    key: Option<String>,
}

impl StoredKeyProvider {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.filter(|k| !k.trim().is_empty()),
        }
    }
}

impl CredentialProvider for StoredKeyProvider {
    fn strategy(&self) -> KeyStrategy {
        KeyStrategy::Stored
    }

    fn api_key(&self) -> Option<String> {
        self.key.clone()
    }
}

/// 楽観的プロバイダ: 認証エラーを受けるまではキーありとして扱う
pub struct OptimisticKeyProvider {
    key: String,
    revoked: AtomicBool,
}

impl OptimisticKeyProvider {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.unwrap_or_default(),
            revoked: AtomicBool::new(false),
        }
    }
}

impl CredentialProvider for OptimisticKeyProvider {
    fn strategy(&self) -> KeyStrategy {
        KeyStrategy::Optimistic
    }

    fn api_key(&self) -> Option<String> {
        if self.revoked.load(Ordering::SeqCst) {
            None
        } else {
            Some(self.key.clone())
        }
    }

    fn invalidate(&self) {
        if !self.revoked.swap(true, Ordering::SeqCst) {
            tracing::warn!("認証エラーを検出したためAPIキーを無効化しました");
        }
    }
}

/// 設定に応じたプロバイダを生成
pub fn provider_for(strategy: KeyStrategy, config: &Config) -> Arc<dyn CredentialProvider> {
    match strategy {
        KeyStrategy::Host => Arc::new(HostKeyProvider::new()),
        KeyStrategy::Stored => Arc::new(StoredKeyProvider::new(config.stored_api_key())),
        KeyStrategy::Optimistic => Arc::new(OptimisticKeyProvider::new(config.get_api_key())),
    }
}
