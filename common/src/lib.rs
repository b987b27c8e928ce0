//! OCR Booster Common Library
//!
//! CLIと(将来の)Webフロントエンドで共有される状態管理と型

pub mod encoding;
pub mod error;
pub mod export;
pub mod prompts;
pub mod registry;
pub mod types;

pub use error::{Error, Result};
pub use registry::{OcrJob, RefineJob, Registry};
pub use types::{
    FileKind, FileRecord, IncomingFile, ProcessingStatus, RecordId, RecordSummary, RefineMode,
    PROGRESS_DONE, PROGRESS_ENCODED, PROGRESS_STARTED,
};
