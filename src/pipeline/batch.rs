//! 一括スキャン
//!
//! 開始時点で waiting / error のレコードを列挙し、登録順に1件ずつ処理する。
//! 途中で追加されたレコードは次回の一括スキャンまで対象外。

use super::{ProcessOutcome, Session};
use crate::error::{OcrBoosterError, Result};
use ocr_booster_common::RecordId;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// 一括スキャンの進捗通知
#[derive(Debug, Clone)]
pub enum BatchProgress {
    Started {
        index: usize,
        total: usize,
        file_name: String,
    },
    Finished {
        index: usize,
        total: usize,
        file_name: String,
        outcome: ProcessOutcome,
    },
}

/// 一括スキャンの集計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// 途中でキーが無効になり中断した
    pub stopped_for_key: bool,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.completed + self.failed + self.skipped
    }
}

/// 実行中フラグを drop で戻す
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Session {
    /// 保留中（waiting / error）のレコードを順番に処理
    ///
    /// 実行中に再度呼ばれた場合は BatchInProgress。
    pub async fn run_batch<F>(&self, mut on_progress: F) -> Result<BatchReport>
    where
        F: FnMut(&BatchProgress),
    {
        self.require_key()?;

        if self.batch_running.swap(true, Ordering::SeqCst) {
            return Err(OcrBoosterError::BatchInProgress);
        }
        let _guard = RunningGuard(&self.batch_running);

        let targets: Vec<(RecordId, String)> = {
            let registry = self.registry.lock().await;
            registry
                .pending_ids()
                .into_iter()
                .filter_map(|id| {
                    let name = registry.get(&id)?.file_name().to_string();
                    Some((id, name))
                })
                .collect()
        };

        let total = targets.len();
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };
        info!(total, "一括スキャン開始");

        for (index, (id, file_name)) in targets.into_iter().enumerate() {
            if self.key_required() {
                warn!(remaining = total - index, "APIキーが無効になったため一括スキャンを中断");
                report.stopped_for_key = true;
                break;
            }

            on_progress(&BatchProgress::Started {
                index,
                total,
                file_name: file_name.clone(),
            });

            let outcome = match self.process_file(&id).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // 確認後にキーが失われた場合も Started と対になる通知を出す
                    warn!(error = %e, remaining = total - index, "一括スキャンを中断");
                    report.stopped_for_key = true;
                    on_progress(&BatchProgress::Finished {
                        index,
                        total,
                        file_name,
                        outcome: ProcessOutcome::Skipped,
                    });
                    break;
                }
            };

            match &outcome {
                ProcessOutcome::Completed => report.completed += 1,
                ProcessOutcome::Failed(_) => report.failed += 1,
                ProcessOutcome::Skipped => report.skipped += 1,
            }

            on_progress(&BatchProgress::Finished {
                index,
                total,
                file_name,
                outcome,
            });
        }

        info!(
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "一括スキャン終了"
        );
        Ok(report)
    }
}
