//! 外部AIサービス（OCR・テキスト加工）の抽象化
//!
//! パイプラインは [`OcrService`] 越しにのみ外部APIを呼ぶ。
//! 実装は Gemini（[`gemini::GeminiClient`]）だが、テストでは差し替える。

pub mod gemini;

use ocr_booster_common::RefineMode;
use thiserror::Error;

/// 外部呼び出しの失敗
///
/// Display はレコードのエラー欄にそのまま表示される失敗メッセージ。
#[derive(Error, Debug)]
pub enum ServiceError {
    /// APIがエラーを返した
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// 認証エラー（キー無効・権限なし）
    #[error("{0}")]
    Unauthorized(String),

    /// 通信エラー（タイムアウト含む）
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// その他（レスポンス不正など）
    #[error("{0}")]
    Failed(String),
}

impl ServiceError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized(_))
    }
}

/// OCR呼び出しの入力
#[derive(Debug, Clone, Copy)]
pub struct OcrRequest<'a> {
    pub api_key: &'a str,
    /// Base64エンコード済みのファイル内容
    pub data: &'a str,
    pub media_type: &'a str,
    pub high_accuracy: bool,
}

/// テキスト加工呼び出しの入力
#[derive(Debug, Clone, Copy)]
pub struct RefineRequest<'a> {
    pub api_key: &'a str,
    pub text: &'a str,
    pub mode: RefineMode,
}

#[async_trait::async_trait]
pub trait OcrService: Send + Sync {
    /// ファイルからテキストを抽出
    async fn perform_ocr(&self, request: OcrRequest<'_>) -> Result<String, ServiceError>;

    /// テキストを要約・校正
    async fn refine_text(&self, request: RefineRequest<'_>) -> Result<String, ServiceError>;
}
