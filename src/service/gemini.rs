//! Gemini API連携
//!
//! OCR: 画像/PDFをinlineDataで送信し、システム指示付きでテキスト抽出
//! 加工: テキストのみのプロンプトで要約・校正

use super::{OcrRequest, OcrService, RefineRequest, ServiceError};
use crate::config::Config;
use crate::error::Result;
use ocr_booster_common::prompts::{
    build_ocr_prompt, build_refine_prompt, ocr_temperature, OCR_SYSTEM_PROMPT, REFINE_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Gemini APIリクエスト
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// エラーレスポンス {"error": {...}}
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl GeminiResponse {
    /// 先頭候補のテキストパートを連結（無ければ空文字）
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// HTTPエラーをServiceErrorへ分類
///
/// 認証エラーはステータスコード・status・ErrorInfo.reason で判定する（メッセージ文言には依存しない）。
fn classify_error(http_status: u16, body: &str) -> ServiceError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        let message = if body.trim().is_empty() {
            format!("API error: {}", http_status)
        } else {
            format!("API error ({}): {}", http_status, body.trim())
        };
        return if matches!(http_status, 401 | 403) {
            ServiceError::Unauthorized(message)
        } else {
            ServiceError::Api {
                status: http_status,
                code: None,
                message,
            }
        };
    };

    let error = envelope.error;
    let key_invalid = error
        .details
        .iter()
        .any(|d| d.get("reason").and_then(|r| r.as_str()) == Some("API_KEY_INVALID"));
    let auth_status = matches!(
        error.status.as_deref(),
        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED")
    );
    let message = if error.message.trim().is_empty() {
        format!("API error: {}", http_status)
    } else {
        error.message
    };

    if key_invalid || auth_status || matches!(http_status, 401 | 403) {
        ServiceError::Unauthorized(message)
    } else {
        ServiceError::Api {
            status: http_status,
            code: error.status,
            message,
        }
    }
}

/// APIキーはヘッダで送る（URLに残さない）
const API_KEY_HEADER: &str = "x-goog-api-key";

/// 通信エラーはURLを落としてから保持する（表示・レポートに出るため）
fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Http(e.without_url())
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    ocr_model: String,
    refine_model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(ServiceError::from)?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            ocr_model: config.ocr_model.clone(),
            refine_model: config.refine_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    /// Gemini API呼び出し（共通処理）
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        request: &GeminiRequest,
    ) -> std::result::Result<String, ServiceError> {
        let resp = self
            .http
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        let response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::Failed(format!("APIレスポンスのパースに失敗: {}", e)))?;
        Ok(response.text())
    }
}

fn ocr_request(request: &OcrRequest<'_>) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: request.media_type.to_string(),
                        data: request.data.to_string(),
                    },
                },
                Part::Text {
                    text: build_ocr_prompt(request.high_accuracy).to_string(),
                },
            ],
        }],
        system_instruction: Some(Content {
            parts: vec![Part::Text {
                text: OCR_SYSTEM_PROMPT.to_string(),
            }],
        }),
        generation_config: GenerationConfig {
            temperature: ocr_temperature(request.high_accuracy),
        },
    }
}

fn refine_request(request: &RefineRequest<'_>) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![Part::Text {
                text: build_refine_prompt(request.mode, request.text),
            }],
        }],
        system_instruction: None,
        generation_config: GenerationConfig {
            temperature: REFINE_TEMPERATURE,
        },
    }
}

#[async_trait::async_trait]
impl OcrService for GeminiClient {
    async fn perform_ocr(&self, request: OcrRequest<'_>) -> std::result::Result<String, ServiceError> {
        debug!(
            model = %self.ocr_model,
            media_type = request.media_type,
            encoded_len = request.data.len(),
            high_accuracy = request.high_accuracy,
            "OCRリクエスト送信"
        );
        self.generate(request.api_key, &self.ocr_model, &ocr_request(&request))
            .await
    }

    async fn refine_text(
        &self,
        request: RefineRequest<'_>,
    ) -> std::result::Result<String, ServiceError> {
        debug!(
            model = %self.refine_model,
            mode = request.mode.as_str(),
            chars = request.text.chars().count(),
            "加工リクエスト送信"
        );
        self.generate(request.api_key, &self.refine_model, &refine_request(&request))
            .await
    }
}
