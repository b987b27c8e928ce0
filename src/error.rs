use crate::key_strategy::KeyStrategy;
use crate::service::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrBoosterError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが必要です（方式: {0}）。`ocr-booster config --set-api-key YOUR_KEY` または環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey(KeyStrategy),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("対象ファイルが見つかりません: {0}")]
    NoFilesFound(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("AI処理中にエラーが発生しました: {0}")]
    Refine(ServiceError),

    #[error("一括スキャンは既に実行中です")]
    BatchInProgress,

    #[error("入力エラー: {0}")]
    Dialog(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] ocr_booster_common::Error),
}

impl From<dialoguer::Error> for OcrBoosterError {
    fn from(e: dialoguer::Error) -> Self {
        OcrBoosterError::Dialog(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OcrBoosterError>;
