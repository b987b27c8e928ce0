//! テキスト出力（「テキストとして保存」）とレポート出力

use crate::error::Result;
use crate::types::{FileRecord, RecordSummary};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 出力ファイル名の接尾辞
pub const EXTRACTED_SUFFIX: &str = "_extracted";

/// 元ファイル名の拡張子を除いた部分
///
/// 先頭のドットのみ（".env" など）や拡張子なしはそのまま返す。
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}

/// 保存ファイル名: <stem>_extracted.txt
pub fn extracted_file_name(file_name: &str) -> String {
    format!("{}{}.txt", file_stem(file_name), EXTRACTED_SUFFIX)
}

/// 1回の出力で使った保存ファイル名
///
/// 同じ stem のファイル（scan.png と scan.pdf など）は2件目以降を
/// <stem>_extracted-2.txt, -3.txt ... とずらす。
#[derive(Debug, Default)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, file_name: &str) -> String {
        let name = extracted_file_name(file_name);
        if self.used.insert(name.clone()) {
            return name;
        }
        let base = format!("{}{}", file_stem(file_name), EXTRACTED_SUFFIX);
        (2..)
            .map(|n| format!("{}-{}.txt", base, n))
            .find(|candidate| self.used.insert(candidate.clone()))
            .unwrap_or(name)
    }
}

/// 抽出テキストをそのままのバイト列で書き出す
///
/// テキストが無いレコードは何もしない（None）。
pub fn write_extracted_text(
    record: &FileRecord,
    output_dir: &Path,
    names: &mut OutputNames,
) -> Result<Option<PathBuf>> {
    let Some(text) = record.extracted_text() else {
        return Ok(None);
    };
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(names.assign(record.file_name()));
    std::fs::write(&path, text.as_bytes())?;
    Ok(Some(path))
}

/// 全レコードの要約をJSONで書き出す
pub fn write_report(records: &[FileRecord], path: &Path) -> Result<()> {
    let summaries: Vec<RecordSummary> = records.iter().map(FileRecord::summary).collect();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(&summaries)?;
    std::fs::write(path, json)?;
    Ok(())
}
