//! ocr-booster
//!
//! 画像・PDFをGemini APIでOCRし、抽出テキストの要約・校正を行う。

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod key_strategy;
pub mod pipeline;
pub mod scanner;
pub mod service;
