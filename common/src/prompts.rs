//! プロンプト生成モジュール
//!
//! OCRとテキスト加工で使用するプロンプトと生成パラメータ:
//! - OCR_SYSTEM_PROMPT: OCR呼び出しのシステム指示
//! - build_ocr_prompt: 精密スキャンON/OFFに応じた指示文
//! - build_refine_prompt: 要約/校正の指示文 + 本文

use crate::types::RefineMode;

/// OCR用システム指示
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an expert OCR and document analysis specialist.
Your goal is to extract text from the provided image or PDF with 100% accuracy.
Focus on:
1. Maintaining the original layout as much as possible.
2. If there are tables, represent them using Markdown table format.
3. If there are mathematical formulas, use LaTeX or very clear notation.
4. For study materials/exam papers, capture every detail including question numbers and choices.
5. If "High Accuracy Mode" is requested, pay extra attention to context and correct obvious optical recognition errors without changing the meaning.
"#;

/// 要約用の指示
pub const SUMMARY_PROMPT: &str = r#"Summarize the following text extracted from a study document.
Provide a concise summary, key points, and essential formulas/definitions found in the content.
Use bullet points for clarity.
"#;

/// 校正用の指示
pub const CORRECTION_PROMPT: &str = r#"Review the following OCR-extracted text.
Fix any typos, grammatical errors, or obvious OCR mistakes.
Ensure the text flows naturally and matches the context of an academic or professional document.
Do not change the technical meaning or mathematical formulas.
"#;

/// テキスト加工時の温度
pub const REFINE_TEMPERATURE: f32 = 0.3;

/// OCR指示文（精密スキャンの有無で切り替え）
pub fn build_ocr_prompt(high_accuracy: bool) -> &'static str {
    if high_accuracy {
        "Perform high-accuracy OCR on this document. Focus on precise text, tables, and math formulas."
    } else {
        "Extract all text from this document, maintaining layout."
    }
}

/// OCR時の温度（精密スキャンは低く）
pub fn ocr_temperature(high_accuracy: bool) -> f32 {
    if high_accuracy {
        0.1
    } else {
        0.4
    }
}

/// 加工用プロンプト: 指示 + 空行 + "Content:" + 本文
pub fn build_refine_prompt(mode: RefineMode, text: &str) -> String {
    let instruction = match mode {
        RefineMode::Summary => SUMMARY_PROMPT,
        RefineMode::Correction => CORRECTION_PROMPT,
    };
    format!("{}\n\nContent:\n{}", instruction, text)
}
