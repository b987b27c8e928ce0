//! ファイルレコードの型定義
//!
//! CLIと将来のWebフロントエンドで共有される型:
//! - FileRecord: 取り込んだ1ファイル分の状態
//! - ProcessingStatus: 処理ステータス
//! - RefineMode: 要約/校正の切り替え

use crate::encoding;
use crate::error::Error;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// OCR開始時の進捗
pub const PROGRESS_STARTED: u8 = 10;
/// エンコード完了時の進捗
pub const PROGRESS_ENCODED: u8 = 40;
/// 完了時の進捗（completed の場合に限る）
pub const PROGRESS_DONE: u8 = 100;

/// レコード識別子（取り込み時に発行、以後不変）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ファイル種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// MIMEタイプから判定（"pdf"を含めばPDF、それ以外は不明な値も含めて画像扱い）
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type.contains("pdf") {
            FileKind::Pdf
        } else {
            FileKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
        }
    }
}

/// 処理ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Waiting,
    Processing,
    Completed,
    Error,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Waiting => "waiting",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Error => "error",
        }
    }

    /// 一括処理の対象か（待機中またはエラー）
    pub fn is_pending(&self) -> bool {
        matches!(self, ProcessingStatus::Waiting | ProcessingStatus::Error)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// テキスト加工モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefineMode {
    /// 要点・公式を箇条書きで要約
    Summary,
    /// 誤字・文法・OCR誤認識の校正
    Correction,
}

impl RefineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefineMode::Summary => "summary",
            RefineMode::Correction => "correction",
        }
    }
}

impl FromStr for RefineMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" | "sum" => Ok(RefineMode::Summary),
            "correction" | "correct" | "fix" => Ok(RefineMode::Correction),
            _ => Err(Error::Parse(format!(
                "Unknown mode: {}. Use summary or correction",
                s
            ))),
        }
    }
}

impl fmt::Display for RefineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 取り込み前のファイル（アップロード・ドロップ・貼り付け）
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl IncomingFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// クリップボード貼り付け画像（タイムスタンプ付きの仮ファイル名を付与）
    pub fn pasted(data: Vec<u8>, media_type: impl Into<String>, at: DateTime<Local>) -> Self {
        let media_type = media_type.into();
        let file_name = pasted_file_name(&media_type, at);
        Self {
            file_name,
            media_type,
            data,
        }
    }
}

/// 貼り付け画像のファイル名: pasted-YYYYMMDD-HHMMSS.<拡張子>
pub fn pasted_file_name(media_type: &str, at: DateTime<Local>) -> String {
    let ext = media_type
        .split('/')
        .nth(1)
        .map(|sub| sub.split(['+', ';']).next().unwrap_or(sub))
        .filter(|sub| !sub.is_empty())
        .map(|sub| if sub == "jpeg" { "jpg" } else { sub })
        .unwrap_or("png");
    format!("pasted-{}.{}", at.format("%Y%m%d-%H%M%S"), ext)
}

/// 取り込んだ1ファイル分の状態
///
/// フィールドの更新は Registry 経由のみ（不変条件の維持のため）。
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub(crate) id: RecordId,
    pub(crate) file_name: String,
    pub(crate) media_type: String,
    pub(crate) kind: FileKind,
    pub(crate) payload: Arc<[u8]>,
    pub(crate) status: ProcessingStatus,
    pub(crate) progress: u8,
    pub(crate) extracted_text: Option<String>,
    pub(crate) error: Option<String>,
}

impl FileRecord {
    pub(crate) fn from_incoming(id: RecordId, file: IncomingFile) -> Self {
        let kind = FileKind::from_media_type(&file.media_type);
        Self {
            id,
            file_name: file.file_name,
            media_type: file.media_type,
            kind,
            payload: Arc::from(file.data),
            status: ProcessingStatus::Waiting,
            progress: 0,
            extracted_text: None,
            error: None,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn payload(&self) -> &Arc<[u8]> {
        &self.payload
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// プレビュー用のData URL（必要な時に生成、レコードと共に破棄）
    pub fn preview_url(&self) -> String {
        encoding::data_url(&self.media_type, &self.payload)
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            file_name: self.file_name.clone(),
            kind: self.kind,
            status: self.status,
            progress: self.progress,
            error: self.error.clone(),
            text_length: self.extracted_text.as_ref().map(|t| t.chars().count()),
        }
    }
}

/// レポート出力用の要約
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: RecordId,
    pub file_name: String,
    pub kind: FileKind,
    pub status: ProcessingStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}
