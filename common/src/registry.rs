//! ファイルレジストリ
//!
//! 取り込んだファイルを追加順に保持し、選択状態とステータス遷移を管理する。
//! 遷移はすべてここを通すことで以下を保証する:
//! - 識別子はレジストリ内で一意かつ不変
//! - progress == 100 ⇔ status == completed
//! - 選択中の識別子は None か既存レコードを指す

use crate::types::{
    FileRecord, IncomingFile, ProcessingStatus, RecordId, PROGRESS_DONE, PROGRESS_ENCODED,
    PROGRESS_STARTED,
};
use std::sync::Arc;

/// OCR処理に必要な情報（ロック外で使うためのスナップショット）
#[derive(Debug, Clone)]
pub struct OcrJob {
    pub id: RecordId,
    pub file_name: String,
    pub media_type: String,
    pub payload: Arc<[u8]>,
}

/// テキスト加工に必要な情報と、失敗時に戻すための元の状態
#[derive(Debug, Clone)]
pub struct RefineJob {
    pub id: RecordId,
    pub file_name: String,
    pub text: String,
    prior_status: ProcessingStatus,
    prior_progress: u8,
}

#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<FileRecord>,
    selected: Option<RecordId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルを1件追加
    pub fn add(&mut self, file: IncomingFile) -> RecordId {
        let id = self.insert(file);
        if self.selected.is_none() {
            self.selected = Some(id.clone());
        }
        id
    }

    /// 複数ファイルを追加（未選択なら追加分の先頭を選択）
    pub fn add_files(&mut self, files: impl IntoIterator<Item = IncomingFile>) -> Vec<RecordId> {
        let ids: Vec<RecordId> = files.into_iter().map(|f| self.insert(f)).collect();
        if self.selected.is_none() {
            self.selected = ids.first().cloned();
        }
        ids
    }

    fn insert(&mut self, file: IncomingFile) -> RecordId {
        let mut id = RecordId::generate();
        while self.get(&id).is_some() {
            id = RecordId::generate();
        }
        self.records.push(FileRecord::from_incoming(id.clone(), file));
        id
    }

    /// レコードを削除（選択中なら先頭のレコードへ、空なら選択解除）
    pub fn remove(&mut self, id: &RecordId) -> Option<FileRecord> {
        let pos = self.records.iter().position(|r| &r.id == id)?;
        let removed = self.records.remove(pos);
        if self.selected.as_ref() == Some(id) {
            self.selected = self.records.first().map(|r| r.id.clone());
        }
        Some(removed)
    }

    /// 全件削除
    pub fn clear(&mut self) {
        self.records.clear();
        self.selected = None;
    }

    /// 選択（存在しない識別子は無視してfalse）
    pub fn select(&mut self, id: &RecordId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    pub fn selected_id(&self) -> Option<&RecordId> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&FileRecord> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &RecordId) -> Option<&FileRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// ファイル名で検索（同名が複数あれば先に追加された方）
    pub fn find_by_name(&self, file_name: &str) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.file_name == file_name)
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 一括処理の対象（待機中・エラー）を追加順で取得
    pub fn pending_ids(&self) -> Vec<RecordId> {
        self.records
            .iter()
            .filter(|r| r.status.is_pending())
            .map(|r| r.id.clone())
            .collect()
    }

    /// 抽出テキストを直接編集（ステータスは変えない）
    pub fn edit_text(&mut self, id: &RecordId, text: impl Into<String>) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.extracted_text = Some(text.into());
                true
            }
            None => false,
        }
    }

    /// OCR開始: processing / progress=10 に遷移
    ///
    /// 存在しない、または既に processing の場合は None（何もしない）。
    pub fn begin_ocr(&mut self, id: &RecordId) -> Option<OcrJob> {
        let record = self.record_mut(id)?;
        if record.status == ProcessingStatus::Processing {
            return None;
        }
        record.status = ProcessingStatus::Processing;
        record.progress = PROGRESS_STARTED;
        record.error = None;
        Some(OcrJob {
            id: record.id.clone(),
            file_name: record.file_name.clone(),
            media_type: record.media_type.clone(),
            payload: Arc::clone(&record.payload),
        })
    }

    /// エンコード完了: progress=40
    pub fn mark_encoded(&mut self, id: &RecordId) -> bool {
        match self.record_mut(id) {
            Some(record) if record.status == ProcessingStatus::Processing => {
                record.progress = PROGRESS_ENCODED;
                true
            }
            _ => false,
        }
    }

    /// 成功: completed / progress=100 / テキスト置換
    pub fn complete(&mut self, id: &RecordId, text: impl Into<String>) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.status = ProcessingStatus::Completed;
                record.progress = PROGRESS_DONE;
                record.extracted_text = Some(text.into());
                record.error = None;
                true
            }
            None => false,
        }
    }

    /// 失敗: error / メッセージ保存
    pub fn fail(&mut self, id: &RecordId, message: impl Into<String>) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                record.status = ProcessingStatus::Error;
                record.progress = record.progress.min(PROGRESS_DONE - 1);
                record.error = Some(message.into());
                true
            }
            None => false,
        }
    }

    /// 選択中レコードの加工開始
    ///
    /// テキストが無い（空文字含む）、または processing 中なら None。
    /// 進捗は据え置き、ただし completed の100は processing 中は99に留める。
    pub fn begin_refine(&mut self) -> Option<RefineJob> {
        let id = self.selected.clone()?;
        let record = self.record_mut(&id)?;
        if record.status == ProcessingStatus::Processing {
            return None;
        }
        let text = record.extracted_text.clone().filter(|t| !t.is_empty())?;
        let job = RefineJob {
            id,
            file_name: record.file_name.clone(),
            text,
            prior_status: record.status,
            prior_progress: record.progress,
        };
        record.status = ProcessingStatus::Processing;
        record.progress = record.progress.min(PROGRESS_DONE - 1);
        Some(job)
    }

    /// 加工成功: completed / テキスト置換
    pub fn finish_refine(&mut self, job: &RefineJob, text: impl Into<String>) -> bool {
        self.complete(&job.id, text)
    }

    /// 加工失敗: 開始前のステータス・進捗に戻す（テキストはそのまま）
    pub fn abort_refine(&mut self, job: &RefineJob) -> bool {
        match self.record_mut(&job.id) {
            Some(record) if record.status == ProcessingStatus::Processing => {
                record.status = job.prior_status;
                record.progress = job.prior_progress;
                true
            }
            _ => false,
        }
    }

    fn record_mut(&mut self, id: &RecordId) -> Option<&mut FileRecord> {
        self.records.iter_mut().find(|r| &r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileKind;

    fn image(name: &str) -> IncomingFile {
        IncomingFile::new(name, "image/png", name.as_bytes().to_vec())
    }

    fn assert_invariants(registry: &Registry) {
        if let Some(id) = registry.selected_id() {
            assert!(registry.get(id).is_some(), "選択中のIDが存在しない: {}", id);
        }
        for record in registry.records() {
            assert_eq!(
                record.progress() == PROGRESS_DONE,
                record.status() == ProcessingStatus::Completed,
                "progress/status不整合: {:?}",
                record
            );
            if record.status() != ProcessingStatus::Error {
                assert!(record.error().is_none());
            }
        }
    }

    #[test]
    fn test_add_assigns_unique_ids_and_selects_first() {
        let mut registry = Registry::new();
        let ids = registry.add_files(vec![image("a.png"), image("b.png"), image("c.png")]);

        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_eq!(registry.selected_id(), Some(&ids[0]));

        let record = registry.get(&ids[1]).unwrap();
        assert_eq!(record.status(), ProcessingStatus::Waiting);
        assert_eq!(record.progress(), 0);
        assert_eq!(record.kind(), FileKind::Image);
        assert!(record.extracted_text().is_none());
        assert_invariants(&registry);
    }

    #[test]
    fn test_add_keeps_existing_selection() {
        let mut registry = Registry::new();
        let first = registry.add(image("a.png"));
        registry.add_files(vec![image("b.png")]);
        assert_eq!(registry.selected_id(), Some(&first));
    }

    #[test]
    fn test_pdf_kind_detection() {
        let mut registry = Registry::new();
        let id = registry.add(IncomingFile::new("doc.pdf", "application/pdf", vec![]));
        assert_eq!(registry.get(&id).unwrap().kind(), FileKind::Pdf);
    }

    #[test]
    fn test_remove_selected_advances_to_first_remaining() {
        let mut registry = Registry::new();
        let ids = registry.add_files(vec![image("a.png"), image("b.png"), image("c.png")]);

        registry.select(&ids[1]);
        let removed = registry.remove(&ids[1]).unwrap();
        assert_eq!(removed.file_name(), "b.png");
        assert_eq!(registry.selected_id(), Some(&ids[0]));

        // 選択中でないレコードの削除は選択に影響しない
        registry.remove(&ids[2]);
        assert_eq!(registry.selected_id(), Some(&ids[0]));

        registry.remove(&ids[0]);
        assert!(registry.selected_id().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = Registry::new();
        registry.add(image("a.png"));
        assert!(registry.remove(&RecordId::new("missing")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_selection_invariant_over_add_remove_sequence() {
        let mut registry = Registry::new();
        let mut live: Vec<RecordId> = Vec::new();

        // 追加・削除を交互に繰り返す決定的なシーケンス
        for step in 0..40usize {
            if step % 3 == 2 && !live.is_empty() {
                let victim = live.remove((step * 7) % live.len());
                registry.remove(&victim);
            } else {
                live.push(registry.add(image(&format!("{}.png", step))));
            }
            if step % 5 == 0 && !live.is_empty() {
                registry.select(&live[step % live.len()]);
            }
            assert_invariants(&registry);
            assert_eq!(registry.len(), live.len());
        }

        for id in live {
            registry.remove(&id);
            assert_invariants(&registry);
        }
        assert!(registry.selected_id().is_none());
    }

    #[test]
    fn test_clear() {
        let mut registry = Registry::new();
        registry.add_files(vec![image("a.png"), image("b.png")]);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.selected().is_none());
    }

    #[test]
    fn test_select_unknown_returns_false() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        assert!(!registry.select(&RecordId::new("missing")));
        assert_eq!(registry.selected_id(), Some(&id));
    }

    #[test]
    fn test_ocr_transitions() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));

        let job = registry.begin_ocr(&id).unwrap();
        assert_eq!(job.file_name, "a.png");
        assert_eq!(&job.payload[..], b"a.png");
        assert_eq!(registry.get(&id).unwrap().status(), ProcessingStatus::Processing);
        assert_eq!(registry.get(&id).unwrap().progress(), PROGRESS_STARTED);

        assert!(registry.mark_encoded(&id));
        assert_eq!(registry.get(&id).unwrap().progress(), PROGRESS_ENCODED);
        assert_invariants(&registry);

        assert!(registry.complete(&id, "Hello World"));
        let record = registry.get(&id).unwrap();
        assert_eq!(record.status(), ProcessingStatus::Completed);
        assert_eq!(record.progress(), PROGRESS_DONE);
        assert_eq!(record.extracted_text(), Some("Hello World"));
        assert_invariants(&registry);
    }

    #[test]
    fn test_begin_ocr_on_processing_is_noop() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        registry.begin_ocr(&id).unwrap();
        registry.mark_encoded(&id);

        assert!(registry.begin_ocr(&id).is_none());
        // 状態は変わらない
        assert_eq!(registry.get(&id).unwrap().progress(), PROGRESS_ENCODED);
        assert!(registry.begin_ocr(&RecordId::new("missing")).is_none());
    }

    #[test]
    fn test_fail_then_retry_clears_error() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        registry.begin_ocr(&id);
        registry.mark_encoded(&id);
        registry.fail(&id, "quota exceeded");

        let record = registry.get(&id).unwrap();
        assert_eq!(record.status(), ProcessingStatus::Error);
        assert_eq!(record.error(), Some("quota exceeded"));
        assert_eq!(registry.pending_ids(), vec![id.clone()]);
        assert_invariants(&registry);

        registry.begin_ocr(&id).unwrap();
        assert!(registry.get(&id).unwrap().error().is_none());
        registry.complete(&id, "ok");
        assert!(registry.pending_ids().is_empty());
        assert_invariants(&registry);
    }

    #[test]
    fn test_reprocess_completed_record_overwrites_text() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        registry.begin_ocr(&id);
        registry.complete(&id, "first");

        registry.begin_ocr(&id).unwrap();
        assert_eq!(registry.get(&id).unwrap().progress(), PROGRESS_STARTED);
        assert_invariants(&registry);
        registry.complete(&id, "second");
        assert_eq!(registry.get(&id).unwrap().extracted_text(), Some("second"));
    }

    #[test]
    fn test_edit_text_keeps_status() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        assert!(registry.edit_text(&id, "typed"));
        let record = registry.get(&id).unwrap();
        assert_eq!(record.status(), ProcessingStatus::Waiting);
        assert_eq!(record.extracted_text(), Some("typed"));
        assert!(!registry.edit_text(&RecordId::new("missing"), "x"));
    }

    #[test]
    fn test_refine_without_text_is_noop() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        assert!(registry.begin_refine().is_none());

        registry.edit_text(&id, "");
        assert!(registry.begin_refine().is_none());
        assert_eq!(registry.get(&id).unwrap().status(), ProcessingStatus::Waiting);
    }

    #[test]
    fn test_refine_without_selection_is_noop() {
        let registry = &mut Registry::new();
        assert!(registry.begin_refine().is_none());
    }

    #[test]
    fn test_refine_success() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        registry.begin_ocr(&id);
        registry.complete(&id, "foo bar");

        let job = registry.begin_refine().unwrap();
        assert_eq!(job.text, "foo bar");
        let record = registry.get(&id).unwrap();
        assert_eq!(record.status(), ProcessingStatus::Processing);
        assert!(record.progress() < PROGRESS_DONE);
        assert_invariants(&registry);

        // processing 中の二重加工は不可
        assert!(registry.begin_refine().is_none());

        registry.finish_refine(&job, "Foo Bar.");
        let record = registry.get(&id).unwrap();
        assert_eq!(record.status(), ProcessingStatus::Completed);
        assert_eq!(record.extracted_text(), Some("Foo Bar."));
        assert_invariants(&registry);
    }

    #[test]
    fn test_refine_abort_restores_prior_state() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        registry.begin_ocr(&id);
        registry.complete(&id, "foo bar");

        let job = registry.begin_refine().unwrap();
        assert!(registry.abort_refine(&job));

        let record = registry.get(&id).unwrap();
        assert_eq!(record.status(), ProcessingStatus::Completed);
        assert_eq!(record.progress(), PROGRESS_DONE);
        assert_eq!(record.extracted_text(), Some("foo bar"));
        assert_invariants(&registry);
    }

    #[test]
    fn test_refine_abort_after_removal_is_noop() {
        let mut registry = Registry::new();
        let id = registry.add(image("a.png"));
        registry.edit_text(&id, "text");
        let job = registry.begin_refine().unwrap();
        registry.remove(&id);
        assert!(!registry.abort_refine(&job));
        assert!(!registry.finish_refine(&job, "x"));
    }

    #[test]
    fn test_find_by_name() {
        let mut registry = Registry::new();
        let ids = registry.add_files(vec![image("a.png"), image("b.png")]);
        assert_eq!(registry.find_by_name("b.png").map(|r| r.id()), Some(&ids[1]));
        assert!(registry.find_by_name("z.png").is_none());
    }
}
