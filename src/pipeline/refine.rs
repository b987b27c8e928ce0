//! 抽出済みテキストの加工（要約・校正）

use super::Session;
use crate::error::{OcrBoosterError, Result};
use crate::service::RefineRequest;
use ocr_booster_common::RefineMode;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineOutcome {
    Refined,
    /// 選択なし・テキスト空・処理中のいずれか
    NothingToRefine,
}

impl Session {
    /// 選択中レコードのテキストを加工して置き換える
    ///
    /// 失敗時はレコードを加工前の状態に戻し、エラーを返す。
    pub async fn refine_selected(&self, mode: RefineMode) -> Result<RefineOutcome> {
        let api_key = self.require_key()?;

        let job = self.registry.lock().await.begin_refine();
        let Some(job) = job else {
            return Ok(RefineOutcome::NothingToRefine);
        };
        info!(id = %job.id, file = %job.file_name, mode = mode.as_str(), "テキスト加工開始");

        let request = RefineRequest {
            api_key: &api_key,
            text: &job.text,
            mode,
        };

        match self.service.refine_text(request).await {
            Ok(text) => {
                self.registry.lock().await.finish_refine(&job, text);
                info!(id = %job.id, "テキスト加工完了");
                Ok(RefineOutcome::Refined)
            }
            Err(e) => {
                self.note_failure(&e);
                self.registry.lock().await.abort_refine(&job);
                warn!(id = %job.id, error = %e, "テキスト加工失敗");
                Err(OcrBoosterError::Refine(e))
            }
        }
    }
}
