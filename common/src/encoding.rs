//! Base64 / Data URL 変換

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// ファイル内容をAPI送信用のBase64文字列に変換
pub fn encode_payload(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

/// "data:<mime>;base64,<data>" 形式のData URLを生成
pub fn data_url(media_type: &str, payload: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, encode_payload(payload))
}
