//! 処理パイプライン
//!
//! Session がレジストリ・外部サービス・APIキー取得方式をまとめて所有する。
//! レジストリのロックは状態遷移の間だけ保持し、外部呼び出し中は保持しない。
//!
//! 1ファイルの流れ: waiting → processing(10) → エンコード → (40) → OCR → completed(100) / error

mod batch;
mod refine;

pub use batch::{BatchProgress, BatchReport};
pub use refine::RefineOutcome;

use crate::credentials::CredentialProvider;
use crate::error::{OcrBoosterError, Result};
use crate::key_strategy::KeyStrategy;
use crate::service::{OcrRequest, OcrService, ServiceError};
use ocr_booster_common::encoding;
use ocr_booster_common::{IncomingFile, ProcessingStatus, RecordId, Registry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// 失敗に説明が無い場合の表示メッセージ
pub const GENERIC_FAILURE_MESSAGE: &str = "解析中にエラーが発生しました。";

/// 1ファイル分の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed,
    Failed(String),
    /// 存在しない、または既に処理中
    Skipped,
}

pub struct Session {
    registry: Mutex<Registry>,
    service: Arc<dyn OcrService>,
    credentials: Arc<dyn CredentialProvider>,
    high_accuracy: AtomicBool,
    batch_running: AtomicBool,
}

impl Session {
    pub fn new(service: Arc<dyn OcrService>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            service,
            credentials,
            high_accuracy: AtomicBool::new(true),
            batch_running: AtomicBool::new(false),
        }
    }

    pub fn with_high_accuracy(self, high_accuracy: bool) -> Self {
        self.set_high_accuracy(high_accuracy);
        self
    }

    /// レジストリへのアクセス（外部呼び出しをまたいで保持しないこと）
    pub async fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().await
    }

    pub async fn add_files(&self, files: Vec<IncomingFile>) -> Vec<RecordId> {
        let ids = self.registry.lock().await.add_files(files);
        debug!(count = ids.len(), "ファイルを追加");
        ids
    }

    pub fn high_accuracy(&self) -> bool {
        self.high_accuracy.load(Ordering::SeqCst)
    }

    pub fn set_high_accuracy(&self, high_accuracy: bool) {
        self.high_accuracy.store(high_accuracy, Ordering::SeqCst);
    }

    pub fn is_batch_running(&self) -> bool {
        self.batch_running.load(Ordering::SeqCst)
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.credentials.strategy()
    }

    /// キー未設定（処理をブロックすべき状態）か
    pub fn key_required(&self) -> bool {
        self.credentials.api_key().is_none()
    }

    fn require_key(&self) -> Result<String> {
        self.credentials
            .api_key()
            .ok_or_else(|| OcrBoosterError::MissingApiKey(self.credentials.strategy()))
    }

    fn note_failure(&self, error: &ServiceError) {
        if error.is_unauthorized() {
            self.credentials.invalidate();
        }
    }

    /// 1ファイルをOCR処理
    ///
    /// 存在しない・処理中のレコードは何もせず Skipped。
    /// 外部呼び出しの失敗はレコードのエラーとして記録し、Err にはしない。
    /// Err になるのは処理対象のレコードがあり、キー未設定で開始できない場合のみ。
    pub async fn process_file(&self, id: &RecordId) -> Result<ProcessOutcome> {
        let api_key = match self.credentials.api_key() {
            Some(key) => key,
            None => {
                let processable = self
                    .registry
                    .lock()
                    .await
                    .get(id)
                    .is_some_and(|r| r.status() != ProcessingStatus::Processing);
                if !processable {
                    return Ok(ProcessOutcome::Skipped);
                }
                return Err(OcrBoosterError::MissingApiKey(self.credentials.strategy()));
            }
        };

        let job = self.registry.lock().await.begin_ocr(id);
        let Some(job) = job else {
            debug!(%id, "処理対象外のためスキップ");
            return Ok(ProcessOutcome::Skipped);
        };
        debug!(%id, file = %job.file_name, "OCR開始");

        let payload = Arc::clone(&job.payload);
        let encoded = match tokio::task::spawn_blocking(move || encoding::encode_payload(&payload)).await {
            Ok(encoded) => encoded,
            Err(e) => {
                let message = format!("ファイルの読み込みに失敗しました: {}", e);
                warn!(%id, file = %job.file_name, error = %message, "エンコード失敗");
                self.registry.lock().await.fail(id, message.clone());
                return Ok(ProcessOutcome::Failed(message));
            }
        };

        self.registry.lock().await.mark_encoded(id);

        let request = OcrRequest {
            api_key: &api_key,
            data: &encoded,
            media_type: &job.media_type,
            high_accuracy: self.high_accuracy(),
        };

        match self.service.perform_ocr(request).await {
            Ok(text) => {
                info!(%id, file = %job.file_name, chars = text.chars().count(), "OCR完了");
                self.registry.lock().await.complete(id, text);
                Ok(ProcessOutcome::Completed)
            }
            Err(e) => {
                self.note_failure(&e);
                let message = failure_message(&e);
                warn!(%id, file = %job.file_name, error = %message, "OCR失敗");
                self.registry.lock().await.fail(id, message.clone());
                Ok(ProcessOutcome::Failed(message))
            }
        }
    }
}

/// レコードに表示する失敗メッセージ
pub fn failure_message(error: &ServiceError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}
