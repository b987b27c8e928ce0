//! 入力ファイルの収集
//!
//! ファイル指定はそのまま受け付け、フォルダ指定は画像/PDFのみを拾う。

use crate::error::{OcrBoosterError, Result};
use chrono::Local;
use ocr_booster_common::IncomingFile;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub media_type: String,
}

impl ScannedFile {
    fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            file_name,
            media_type: media_type_for(path),
        }
    }

    /// 内容を読み込んでレジストリ投入用に変換
    pub fn load(&self) -> Result<IncomingFile> {
        let data = std::fs::read(&self.path)?;
        Ok(IncomingFile::new(&self.file_name, &self.media_type, data))
    }
}

/// 拡張子からメディアタイプを推定（不明なら application/octet-stream）
pub fn media_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// フォルダ走査で拾う対象か
pub fn is_supported(media_type: &str) -> bool {
    media_type.starts_with("image/") || media_type == "application/pdf"
}

pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ScannedFile>> {
    if !folder.is_dir() {
        return Err(OcrBoosterError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<ScannedFile> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| ScannedFile::from_path(e.path()))
        .filter(|f| is_supported(&f.media_type))
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(files)
}

/// 引数のパス群を展開（指定順を維持）
pub fn scan_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            files.extend(scan_folder(input, recursive)?);
        } else if input.is_file() {
            files.push(ScannedFile::from_path(input));
        } else {
            return Err(OcrBoosterError::FileNotFound(input.display().to_string()));
        }
    }

    Ok(files)
}

/// 標準入力などから貼り付けデータを読み込む
pub fn read_pasted(mut reader: impl Read, media_type: &str) -> Result<IncomingFile> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    if data.is_empty() {
        return Err(OcrBoosterError::NoFilesFound("標準入力".into()));
    }
    Ok(IncomingFile::pasted(data, media_type, Local::now()))
}
